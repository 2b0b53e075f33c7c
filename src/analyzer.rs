// src/analyzer.rs

use anyhow::{bail, Result};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserParams {
    pub fft_size: usize,
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserParams {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

/// Terminal node of the effects chain. Keeps the most recent `fft_size`
/// samples and turns them into per-bin magnitudes on demand; it never alters
/// the signal.
pub struct AnalyserNode {
    fft: Arc<dyn Fft<f32>>,
    params: AnalyserParams,
    // Time-domain history, written circularly.
    history: Vec<f32>,
    write_pos: usize,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    // Smoothed linear magnitudes, one per bin.
    smoothed: Vec<f32>,
}

impl AnalyserNode {
    pub fn new(params: AnalyserParams) -> Result<Self> {
        let n = params.fft_size;
        if !n.is_power_of_two() || !(32..=32768).contains(&n) {
            bail!("fft size must be a power of two in 32..=32768, got {n}");
        }
        if !(0.0..=1.0).contains(&params.smoothing) {
            bail!("smoothing must be within [0, 1], got {}", params.smoothing);
        }
        if params.min_decibels >= params.max_decibels {
            bail!(
                "min decibels ({}) must be below max decibels ({})",
                params.min_decibels,
                params.max_decibels
            );
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);

        Ok(Self {
            fft,
            params,
            history: vec![0.0; n],
            write_pos: 0,
            window: blackman_window(n),
            scratch: vec![Complex { re: 0.0, im: 0.0 }; n],
            smoothed: vec![0.0; n / 2],
        })
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.params.fft_size / 2
    }

    pub fn push_samples(&mut self, samples: &[f32]) {
        let n = self.history.len();
        for &s in samples {
            self.history[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % n;
        }
    }

    /// Current smoothed spectrum scaled onto 0..=255 between the min and max
    /// decibel bounds.
    pub fn get_byte_frequency_data(&mut self, out: &mut [u8]) {
        self.update_spectrum();
        let min = self.params.min_decibels;
        let range = self.params.max_decibels - min;
        for (o, &mag) in out.iter_mut().zip(&self.smoothed) {
            let db = linear_to_db(mag);
            let scaled = (255.0 / range) * (db - min);
            *o = scaled.clamp(0.0, 255.0) as u8;
        }
    }

    fn update_spectrum(&mut self) {
        let n = self.history.len();

        // Oldest sample first, windowed.
        for i in 0..n {
            let s = self.history[(self.write_pos + i) % n];
            self.scratch[i] = Complex {
                re: s * self.window[i],
                im: 0.0,
            };
        }

        self.fft.process(&mut self.scratch);

        let tau = self.params.smoothing;
        let scale = 1.0 / n as f32;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let mag = self.scratch[k].norm() * scale;
            let next = tau * *smoothed + (1.0 - tau) * mag;
            *smoothed = if next.is_finite() { next } else { 0.0 };
        }
    }
}

fn linear_to_db(mag: f32) -> f32 {
    if mag > 0.0 {
        20.0 * mag.log10()
    } else {
        f32::NEG_INFINITY
    }
}

fn blackman_window(n: usize) -> Vec<f32> {
    let alpha = 0.16f32;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(bin: usize, fft_size: usize, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / fft_size as f32).sin())
            .collect()
    }

    #[test]
    fn default_has_128_bins() {
        let node = AnalyserNode::new(AnalyserParams::default()).unwrap();
        assert_eq!(node.frequency_bin_count(), 128);
    }

    #[test]
    fn rejects_bad_fft_size() {
        let params = AnalyserParams {
            fft_size: 300,
            ..Default::default()
        };
        assert!(AnalyserNode::new(params).is_err());
    }

    #[test]
    fn silence_is_all_zero() {
        let mut node = AnalyserNode::new(AnalyserParams::default()).unwrap();
        node.push_samples(&[0.0; 512]);
        let mut bytes = vec![7u8; node.frequency_bin_count()];
        node.get_byte_frequency_data(&mut bytes);
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let mut node = AnalyserNode::new(AnalyserParams::default()).unwrap();
        node.push_samples(&tone(10, 256, 0.01, 1024));

        let mut bytes = vec![0u8; node.frequency_bin_count()];
        for _ in 0..20 {
            node.get_byte_frequency_data(&mut bytes);
        }

        let mut loudest = 0;
        for (i, &b) in bytes.iter().enumerate() {
            if b > bytes[loudest] {
                loudest = i;
            }
        }
        assert_eq!(loudest, 10);
        assert!(bytes[10] > 0);
        assert_eq!(bytes[60], 0);
    }

    #[test]
    fn bytes_scale_between_decibel_bounds() {
        let mut node = AnalyserNode::new(AnalyserParams {
            smoothing: 0.0,
            ..Default::default()
        })
        .unwrap();
        node.push_samples(&tone(20, 256, 0.01, 256));
        let mut bytes = vec![0u8; node.frequency_bin_count()];
        node.get_byte_frequency_data(&mut bytes);
        // 0.005 * 0.42 coherent gain => about -53.6 dB => 255 * 46.4 / 70
        assert!((bytes[20] as i32 - 169).abs() <= 1);
    }
}
