// src/effects/gain.rs

use std::sync::atomic::{AtomicU32, Ordering};

/// Gain stage driven by the pitch slider.
/// The multiplier lives in an `AtomicU32` so the UI can change it while the
/// graph worker is processing, without locks.
pub struct GainNode {
    gain: AtomicU32,
}

impl GainNode {
    pub fn new(gain: f32) -> Self {
        Self {
            gain: AtomicU32::new(gain.to_bits()),
        }
    }

    pub fn set_gain(&self, gain: f32) {
        self.gain.store(gain.to_bits(), Ordering::Relaxed);
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Relaxed))
    }

    /// Multiply a block in place. Loads the parameter once per block.
    pub fn process(&self, buffer: &mut [f32]) {
        let g = self.gain();
        if g == 1.0 {
            return;
        }
        for sample in buffer.iter_mut() {
            *sample *= g;
        }
    }
}

impl Default for GainNode {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_gain_passes_through() {
        let node = GainNode::default();
        let mut buf = [0.25, -0.5, 1.0];
        node.process(&mut buf);
        assert_eq!(buf, [0.25, -0.5, 1.0]);
    }

    #[test]
    fn set_gain_scales_block() {
        let node = GainNode::default();
        node.set_gain(2.0);
        assert_eq!(node.gain(), 2.0);
        let mut buf = [0.25, -0.5];
        node.process(&mut buf);
        assert_eq!(buf, [0.5, -1.0]);
    }
}
