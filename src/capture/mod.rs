// src/capture/mod.rs

pub mod input;
pub mod synthetic;

pub use input::CpalCapture;
pub use synthetic::SyntheticCapture;

use anyhow::Result;
use ringbuf::traits::{Observer, Producer};
use ringbuf::HeapProd;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub channels: usize,
    pub sample_rate: u32,
}

/// Where the input callback delivers raw interleaved samples.
///
/// The recorder side gets the untouched stream; the effects side is
/// best-effort and may drop when the graph worker falls behind. Both sides
/// only ever receive whole frames, so channels never shift.
pub struct InputTap {
    rec: HeapProd<f32>,
    fx: HeapProd<f32>,
    channels: usize,
    dropped: Arc<AtomicU64>,
}

impl InputTap {
    pub fn new(rec: HeapProd<f32>, fx: HeapProd<f32>) -> Self {
        Self {
            rec,
            fx,
            channels: 1,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Set by the backend once the device's channel count is known.
    pub fn set_channels(&mut self, channels: usize) {
        self.channels = channels.max(1);
    }

    /// Counter of samples the recorder buffer had no room for.
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        self.dropped.clone()
    }

    /// Push an interleaved block. Frames that do not fit are dropped whole.
    pub fn push(&mut self, data: &[f32]) {
        let data = &data[..data.len() / self.channels * self.channels];

        let room = self.rec.vacant_len() / self.channels * self.channels;
        let n = self.rec.push_slice(&data[..room.min(data.len())]);
        if n < data.len() {
            self.dropped
                .fetch_add((data.len() - n) as u64, Ordering::Relaxed);
        }

        let room = self.fx.vacant_len() / self.channels * self.channels;
        let _ = self.fx.push_slice(&data[..room.min(data.len())]);
    }
}

/// A running input stream. Dropping it stops capture.
pub trait CaptureStream {
    fn format(&self) -> StreamFormat;
}

/// Something that can open an input stream feeding an [`InputTap`].
pub trait CaptureBackend {
    fn open(&self, tap: InputTap) -> Result<Box<dyn CaptureStream>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Observer, Split};
    use ringbuf::HeapRb;

    #[test]
    fn tap_feeds_both_sides_and_counts_overflow() {
        let (rec_prod, mut rec_cons) = HeapRb::<f32>::new(4).split();
        let (fx_prod, fx_cons) = HeapRb::<f32>::new(2).split();
        let mut tap = InputTap::new(rec_prod, fx_prod);
        let dropped = tap.dropped_counter();

        tap.push(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);

        assert_eq!(rec_cons.occupied_len(), 4);
        assert_eq!(fx_cons.occupied_len(), 2);
        assert_eq!(dropped.load(Ordering::Relaxed), 2);
        assert_eq!(rec_cons.try_pop(), Some(0.1));
    }

    #[test]
    fn overflow_drops_whole_stereo_frames() {
        let (rec_prod, mut rec_cons) = HeapRb::<f32>::new(3).split();
        let (fx_prod, mut fx_cons) = HeapRb::<f32>::new(3).split();
        let mut tap = InputTap::new(rec_prod, fx_prod);
        tap.set_channels(2);
        let dropped = tap.dropped_counter();

        tap.push(&[1.0, -1.0, 2.0, -2.0]);
        assert_eq!(rec_cons.occupied_len(), 2);
        assert_eq!(fx_cons.occupied_len(), 2);
        assert_eq!(dropped.load(Ordering::Relaxed), 2);

        let mut out = [0.0f32; 3];
        assert_eq!(rec_cons.pop_slice(&mut out), 2);
        fx_cons.clear();

        tap.push(&[3.0, -3.0]);
        assert_eq!(rec_cons.pop_slice(&mut out), 2);
        // left stays left, right stays right
        assert_eq!(&out[..2], &[3.0, -3.0]);
    }
}
