// src/graph.rs

use anyhow::{anyhow, Result};
use ringbuf::traits::{Consumer, Split};
use ringbuf::{HeapCons, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::analyzer::{AnalyserNode, AnalyserParams};
use crate::capture::{CaptureBackend, CaptureStream, InputTap, StreamFormat};
use crate::effects::{ChainControls, EffectsChain, OverSample};

#[derive(Debug, Clone, Copy)]
pub struct GraphSettings {
    pub pitch: f32,
    pub distortion: Option<f32>,
    pub oversample: OverSample,
    pub analyser: AnalyserParams,
    pub ring_capacity: usize,
}

/// The live signal graph: capture -> gain -> waveshaper -> analyser.
///
/// Owns the input stream and the worker thread that runs the chain. The raw
/// stream is also handed out once, at start, for the recorder.
pub struct SignalGraph {
    capture: Option<Box<dyn CaptureStream>>,
    format: StreamFormat,
    analyser: Arc<Mutex<AnalyserNode>>,
    controls: ChainControls,
    running: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
}

impl SignalGraph {
    /// Open the input and wire the chain. Returns the graph and the consumer
    /// side of the raw recording buffer.
    pub fn start(
        backend: &dyn CaptureBackend,
        settings: &GraphSettings,
    ) -> Result<(Self, HeapCons<f32>)> {
        let analyser = Arc::new(Mutex::new(AnalyserNode::new(settings.analyser)?));
        let chain = EffectsChain::new(settings.pitch, settings.distortion, settings.oversample);
        let controls = chain.controls();

        let (prod_rec, cons_rec) = HeapRb::<f32>::new(settings.ring_capacity).split();
        let (prod_fx, cons_fx) = HeapRb::<f32>::new(settings.ring_capacity).split();

        let tap = InputTap::new(prod_rec, prod_fx);
        let dropped = tap.dropped_counter();
        let capture = backend.open(tap)?;
        let format = capture.format();

        let running = Arc::new(AtomicBool::new(true));
        let worker = spawn_worker(cons_fx, chain, analyser.clone(), format.channels, running.clone())?;

        Ok((
            Self {
                capture: Some(capture),
                format,
                analyser,
                controls,
                running,
                worker: Some(worker),
                dropped,
            },
            cons_rec,
        ))
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn analyser(&self) -> Arc<Mutex<AnalyserNode>> {
        self.analyser.clone()
    }

    pub fn controls(&self) -> ChainControls {
        self.controls.clone()
    }

    /// Samples the recording buffer had no room for.
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        self.dropped.clone()
    }

    /// Stop capture and the worker. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        // Dropping the stream stops the device callback first.
        drop(self.capture.take());
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.worker.take() {
            h.join().map_err(|_| anyhow!("signal graph worker panicked"))?;
        }
        Ok(())
    }
}

impl Drop for SignalGraph {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("Error closing signal graph: {e}");
        }
    }
}

fn spawn_worker(
    mut consumer: HeapCons<f32>,
    mut chain: EffectsChain,
    analyser: Arc<Mutex<AnalyserNode>>,
    channels: usize,
    running: Arc<AtomicBool>,
) -> Result<thread::JoinHandle<()>> {
    let channels = channels.max(1);
    let handle = thread::Builder::new()
        .name("micfx-graph".into())
        .spawn(move || {
            let mut tmp = vec![0.0f32; 1024 * channels];
            let mut mono: Vec<f32> = Vec::with_capacity(1024);

            while running.load(Ordering::Relaxed) {
                let popped = consumer.pop_slice(tmp.as_mut_slice());
                if popped == 0 {
                    thread::sleep(Duration::from_millis(5));
                    continue;
                }

                downmix(&tmp[..popped], channels, &mut mono);
                chain.process(&mut mono);

                if let Ok(mut a) = analyser.lock() {
                    a.push_samples(&mono);
                }
            }
        })?;
    Ok(handle)
}

/// Average interleaved frames down to one channel.
pub fn downmix(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    out.clear();
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    let inv = 1.0 / channels as f32;
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * inv),
    );
}
