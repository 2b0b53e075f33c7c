// src/effects/waveshaper.rs

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OverSample {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "2x")]
    X2,
    #[default]
    #[serde(rename = "4x")]
    X4,
}

impl OverSample {
    pub fn factor(self) -> usize {
        match self {
            OverSample::None => 1,
            OverSample::X2 => 2,
            OverSample::X4 => 4,
        }
    }
}

/// Shared slot holding the current transfer curve.
/// The UI thread swaps it; the graph worker clones the `Arc` once per block.
#[derive(Clone, Default)]
pub struct CurveSlot {
    inner: Arc<Mutex<Option<Arc<[f32]>>>>,
}

impl CurveSlot {
    pub fn set_curve(&self, curve: Vec<f32>) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(curve.into());
        }
    }

    pub fn current(&self) -> Option<Arc<[f32]>> {
        self.inner.lock().ok().and_then(|slot| slot.clone())
    }
}

/// Looks `x` up in `curve`, interpolating linearly between neighbouring points.
/// Inputs outside [-1, 1] clamp to the curve ends.
pub fn shape_sample(curve: &[f32], x: f32) -> f32 {
    let n = curve.len();
    match n {
        0 => return x,
        1 => return curve[0],
        _ => {}
    }

    let v = (n - 1) as f32 * 0.5 * (x + 1.0);
    if v.is_nan() || v <= 0.0 {
        return curve[0];
    }
    if v >= (n - 1) as f32 {
        return curve[n - 1];
    }

    let k = v.floor() as usize;
    let f = v - k as f32;
    (1.0 - f) * curve[k] + f * curve[k + 1]
}

/// Static nonlinear transfer stage. Without a curve it is a pass-through.
pub struct WaveShaperNode {
    curve: CurveSlot,
    oversample: OverSample,
    prev: f32,
}

impl WaveShaperNode {
    pub fn new(curve: CurveSlot, oversample: OverSample) -> Self {
        Self {
            curve,
            oversample,
            prev: 0.0,
        }
    }

    /// Shape a mono block in place.
    ///
    /// When oversampling, each input sample is linearly upsampled from the
    /// previous one, shaped at the higher rate, and averaged back down.
    pub fn process(&mut self, buffer: &mut [f32]) {
        let Some(curve) = self.curve.current() else {
            return;
        };

        let factor = self.oversample.factor();
        if factor == 1 {
            for s in buffer.iter_mut() {
                *s = shape_sample(&curve, *s);
            }
            return;
        }

        let inv = 1.0 / factor as f32;
        for s in buffer.iter_mut() {
            let input = *s;
            let mut acc = 0.0f32;
            for j in 1..=factor {
                let t = j as f32 * inv;
                let u = self.prev + (input - self.prev) * t;
                acc += shape_sample(&curve, u);
            }
            self.prev = input;
            *s = acc * inv;
        }
    }
}
