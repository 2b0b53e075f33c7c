// src/effects/mod.rs

pub mod gain;
pub mod waveshaper;

pub use gain::GainNode;
pub use waveshaper::{CurveSlot, OverSample, WaveShaperNode};

use crate::curve::make_distortion_curve;
use std::sync::Arc;

/// UI-side handle to the live chain parameters.
#[derive(Clone)]
pub struct ChainControls {
    gain: Arc<GainNode>,
    curve: CurveSlot,
}

impl ChainControls {
    /// Pitch slider: sets the gain multiplier.
    pub fn set_pitch(&self, value: f32) {
        self.gain.set_gain(value);
    }

    /// Distortion slider: regenerates the curve from scratch.
    pub fn set_distortion(&self, amount: Option<f32>) {
        self.curve.set_curve(make_distortion_curve(amount));
    }
}

/// gain -> waveshaper, processed in series on mono blocks.
/// The analyser sits after this and is owned by the graph.
pub struct EffectsChain {
    gain: Arc<GainNode>,
    shaper: WaveShaperNode,
    controls: ChainControls,
}

impl EffectsChain {
    pub fn new(pitch: f32, distortion: Option<f32>, oversample: OverSample) -> Self {
        let gain = Arc::new(GainNode::new(pitch));
        let curve = CurveSlot::default();
        curve.set_curve(make_distortion_curve(distortion));

        let controls = ChainControls {
            gain: gain.clone(),
            curve: curve.clone(),
        };

        Self {
            gain,
            shaper: WaveShaperNode::new(curve, oversample),
            controls,
        }
    }

    pub fn controls(&self) -> ChainControls {
        self.controls.clone()
    }

    pub fn process(&mut self, buffer: &mut [f32]) {
        self.gain.process(buffer);
        self.shaper.process(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_reach_running_chain() {
        let mut chain = EffectsChain::new(1.0, Some(0.0), OverSample::None);
        let controls = chain.controls();

        // amount 0 is a 60x linear curve clamped at +-60
        let mut buf = [0.01];
        chain.process(&mut buf);
        assert!((buf[0] - 0.6).abs() < 1e-2);

        controls.set_pitch(0.0);
        let mut buf = [0.5];
        chain.process(&mut buf);
        assert!(buf[0].abs() < 1e-2);
    }

    #[test]
    fn distortion_slider_replaces_curve() {
        let mut chain = EffectsChain::new(1.0, Some(400.0), OverSample::None);
        let controls = chain.controls();
        let mut before = [0.01];
        chain.process(&mut before);

        controls.set_distortion(Some(0.0));
        let mut after = [0.01];
        chain.process(&mut after);
        // amount 400 flattens small inputs to about 0.1; amount 0 gives about 0.6
        assert!(before[0] < 0.2);
        assert!((after[0] - 0.6).abs() < 1e-2);
    }
}
