// src/recorder/blob.rs

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::StreamFormat;

pub const RECORDING_MIME: &str = "audio/wav";
pub const DEFAULT_FILE_NAME: &str = "recording.wav";

#[derive(Debug, Clone, Copy, Default)]
pub struct LevelStats {
    pub peak_db: f32,
    pub rms_db: f32,
    pub duration_secs: f64,
}

/// The finished recording: one encoded blob built from every chunk the
/// session produced.
#[derive(Debug, Clone)]
pub struct Recording {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub file_name: String,
    pub format: StreamFormat,
    pub stats: LevelStats,
    pub chunk_count: usize,
}

impl Recording {
    /// Concatenate the chunks in order and encode them as 16-bit PCM WAV.
    /// The chunk list is left empty.
    pub fn from_chunks(
        chunks: &mut Vec<Vec<f32>>,
        format: StreamFormat,
        file_name: &str,
    ) -> Result<Self> {
        let chunk_count = chunks.len();
        let samples: Vec<f32> = chunks.drain(..).flatten().collect();

        let spec = WavSpec {
            channels: format.channels as u16,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
        {
            let mut writer = WavWriter::new(&mut cursor, spec).context("creating WAV writer")?;
            for &s in &samples {
                writer.write_sample(to_i16(s))?;
            }
            writer.finalize().context("finalizing WAV")?;
        }

        Ok(Self {
            bytes: cursor.into_inner(),
            mime: RECORDING_MIME,
            file_name: file_name.to_string(),
            format,
            stats: level_stats(&samples, format),
            chunk_count,
        })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.stats.duration_secs)
    }

    /// Write the blob as `<dir>/<file_name>`.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

fn to_i16(s: f32) -> i16 {
    if s.is_finite() {
        (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
    } else {
        0
    }
}

fn level_stats(samples: &[f32], format: StreamFormat) -> LevelStats {
    let frames = samples.len() / format.channels.max(1);
    let duration_secs = if format.sample_rate > 0 {
        frames as f64 / format.sample_rate as f64
    } else {
        0.0
    };

    if samples.is_empty() {
        return LevelStats {
            peak_db: -60.0,
            rms_db: -60.0,
            duration_secs,
        };
    }

    let mut peak = 0.0f32;
    let mut sum_sq = 0.0f64;
    for &s in samples {
        peak = peak.max(s.abs());
        sum_sq += (s as f64) * (s as f64);
    }
    let rms = (sum_sq / samples.len() as f64).sqrt() as f32;

    LevelStats {
        peak_db: if peak > 1e-5 { 20.0 * peak.log10() } else { -60.0 },
        rms_db: if rms > 1e-5 { 20.0 * rms.log10() } else { -60.0 },
        duration_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONO: StreamFormat = StreamFormat {
        channels: 1,
        sample_rate: 8_000,
    };

    #[test]
    fn chunks_are_concatenated_and_cleared() {
        let mut chunks = vec![vec![0.5; 4_000], vec![-0.5; 4_000]];
        let rec = Recording::from_chunks(&mut chunks, MONO, DEFAULT_FILE_NAME).unwrap();

        assert!(chunks.is_empty());
        assert_eq!(rec.chunk_count, 2);
        assert_eq!(rec.mime, RECORDING_MIME);
        assert_eq!(&rec.bytes[0..4], b"RIFF");
        assert_eq!(&rec.bytes[8..12], b"WAVE");
        assert_eq!(rec.bytes.len(), 44 + 8_000 * 2);
        assert!((rec.stats.duration_secs - 1.0).abs() < 1e-9);
        assert!((rec.stats.peak_db - 20.0 * 0.5f32.log10()).abs() < 1e-3);
    }

    #[test]
    fn blob_decodes_back_in_order() {
        let mut chunks = vec![vec![0.25], vec![-1.0, 2.0]];
        let rec = Recording::from_chunks(&mut chunks, MONO, "take.wav").unwrap();

        let reader = hound::WavReader::new(Cursor::new(rec.bytes)).unwrap();
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![(0.25 * i16::MAX as f32) as i16, -i16::MAX, i16::MAX]);
    }

    #[test]
    fn empty_session_still_produces_a_blob() {
        let mut chunks = Vec::new();
        let rec = Recording::from_chunks(&mut chunks, MONO, DEFAULT_FILE_NAME).unwrap();
        assert_eq!(rec.bytes.len(), 44);
        assert_eq!(rec.stats.rms_db, -60.0);
    }

    #[test]
    fn save_writes_named_file() {
        let dir = std::env::temp_dir().join(format!("micfx-blob-{}", std::process::id()));
        let mut chunks = vec![vec![0.1; 16]];
        let rec = Recording::from_chunks(&mut chunks, MONO, DEFAULT_FILE_NAME).unwrap();

        let path = rec.save_to(&dir).unwrap();
        assert_eq!(path.file_name().unwrap(), DEFAULT_FILE_NAME);
        assert_eq!(std::fs::read(&path).unwrap(), rec.bytes);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
