// src/capture/synthetic.rs

use anyhow::Result;
use rand::Rng;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::{CaptureBackend, CaptureStream, InputTap, StreamFormat};

/// Test-signal source standing in for a microphone: a sine tone with a bit of
/// white noise, delivered in real time from a background thread.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticCapture {
    pub format: StreamFormat,
    pub frequency_hz: f32,
    pub amplitude: f32,
    pub noise: f32,
    pub block_ms: u64,
}

impl Default for SyntheticCapture {
    fn default() -> Self {
        Self {
            format: StreamFormat {
                channels: 1,
                sample_rate: 44_100,
            },
            frequency_hz: 440.0,
            amplitude: 0.3,
            noise: 0.02,
            block_ms: 10,
        }
    }
}

pub struct SyntheticStream {
    format: StreamFormat,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CaptureStream for SyntheticStream {
    fn format(&self) -> StreamFormat {
        self.format
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl CaptureBackend for SyntheticCapture {
    fn open(&self, mut tap: InputTap) -> Result<Box<dyn CaptureStream>> {
        let cfg = *self;
        let channels = cfg.format.channels.max(1);
        let frames_per_block =
            (cfg.format.sample_rate as u64 * cfg.block_ms / 1000).max(1) as usize;

        tap.set_channels(channels);

        let running = Arc::new(AtomicBool::new(true));
        let running_cb = running.clone();

        let handle = thread::spawn(move || {
            let mut rng = rand::rng();
            let step = 2.0 * PI * cfg.frequency_hz / cfg.format.sample_rate as f32;
            let mut phase = 0.0f32;
            let mut block = vec![0.0f32; frames_per_block * channels];

            while running_cb.load(Ordering::Relaxed) {
                for frame in block.chunks_mut(channels) {
                    let n = if cfg.noise > 0.0 {
                        rng.random_range(-cfg.noise..cfg.noise)
                    } else {
                        0.0
                    };
                    let s = cfg.amplitude * phase.sin() + n;
                    frame.fill(s);
                    phase = (phase + step) % (2.0 * PI);
                }
                tap.push(&block);
                thread::sleep(Duration::from_millis(cfg.block_ms));
            }
        });

        log::info!(
            "Synthetic input: {} Hz tone, {} ch @ {} Hz",
            cfg.frequency_hz,
            channels,
            cfg.format.sample_rate
        );

        Ok(Box::new(SyntheticStream {
            format: StreamFormat {
                channels,
                sample_rate: cfg.format.sample_rate,
            },
            running,
            handle: Some(handle),
        }))
    }
}
