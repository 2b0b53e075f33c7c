// src/recorder/collector.rs

use ringbuf::traits::Consumer;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Pops raw input samples off the ring buffer and keeps them as an ordered
/// list of chunks, one per non-empty pop.
pub struct ChunkCollector {
    chunks: Vec<Vec<f32>>,
    block: usize,
}

impl ChunkCollector {
    pub fn new(block: usize) -> Self {
        Self {
            chunks: Vec::new(),
            block: block.max(1),
        }
    }

    /// Run until `stop` is raised, then drain whatever is still buffered.
    /// Returns the chunks in arrival order.
    pub fn run<C>(
        mut self,
        mut consumer: C,
        stop: Arc<AtomicBool>,
        recorded_samples: Arc<AtomicU64>,
    ) -> Vec<Vec<f32>>
    where
        C: Consumer<Item = f32>,
    {
        let mut tmp = vec![0.0f32; self.block];

        loop {
            let popped = consumer.pop_slice(tmp.as_mut_slice());

            if popped == 0 {
                // Empty after the stop flag means the buffer is fully drained.
                if stop.load(Ordering::Acquire) {
                    break;
                }
                thread::sleep(Duration::from_millis(5));
                continue;
            }

            self.chunks.push(tmp[..popped].to_vec());
            recorded_samples.fetch_add(popped as u64, Ordering::Relaxed);
        }

        self.chunks
    }
}
