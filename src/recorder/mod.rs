// src/recorder/mod.rs

pub mod blob;
pub mod collector;

pub use blob::{LevelStats, Recording, DEFAULT_FILE_NAME, RECORDING_MIME};

use crate::capture::StreamFormat;
use crate::recorder::collector::ChunkCollector;
use anyhow::{anyhow, Result};
use ringbuf::HeapCons;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

/// Records the raw input stream on its own thread.
pub struct Recorder {
    stop: Arc<AtomicBool>,
    handle: thread::JoinHandle<Result<Recording>>,
    record_samples: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    format: StreamFormat,
}

impl Recorder {
    /// `dropped` counts samples the capture side could not fit into `consumer`'s ring.
    pub fn start(
        consumer: HeapCons<f32>,
        dropped: Arc<AtomicU64>,
        format: StreamFormat,
        file_name: String,
    ) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let record_samples = Arc::new(AtomicU64::new(0));

        let stop_thread = stop.clone();
        let samples_thread = record_samples.clone();
        let handle = thread::Builder::new()
            .name("micfx-recorder".into())
            .spawn(move || {
                let mut chunks =
                    ChunkCollector::new(4096).run(consumer, stop_thread, samples_thread);
                Recording::from_chunks(&mut chunks, format, &file_name)
            })?;

        log::info!("Recorder started ({} ch @ {} Hz)", format.channels, format.sample_rate);

        Ok(Self {
            stop,
            handle,
            record_samples,
            dropped,
            format,
        })
    }

    /// Recording time based on samples collected so far.
    pub fn record_time(&self) -> Duration {
        let frames =
            self.record_samples.load(Ordering::Relaxed) as f64 / self.format.channels.max(1) as f64;
        Duration::from_secs_f64(frames / self.format.sample_rate.max(1) as f64)
    }

    pub fn dropped_samples(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Signal the collector to finish. The blob is built in the background;
    /// poll the returned handle for it.
    pub fn stop(self) -> PendingRecording {
        self.stop.store(true, Ordering::Release);
        let dropped = self.dropped.load(Ordering::Relaxed);
        if dropped > 0 {
            log::warn!("Recorder buffer overflowed: {dropped} samples dropped");
        }
        PendingRecording {
            handle: Some(self.handle),
        }
    }
}

/// A recording that is still being finalized.
pub struct PendingRecording {
    handle: Option<thread::JoinHandle<Result<Recording>>>,
}

impl PendingRecording {
    pub fn is_ready(&self) -> bool {
        self.handle.as_ref().is_none_or(|h| h.is_finished())
    }

    /// Block until the blob is ready.
    pub fn wait(mut self) -> Result<Recording> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("recording already collected"))?;
        handle
            .join()
            .map_err(|_| anyhow!("recorder thread panicked"))?
    }
}
