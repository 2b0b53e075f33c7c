// src/capture/input.rs

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};

use super::{CaptureBackend, CaptureStream, InputTap, StreamFormat};

/// Default cpal input device of the default host.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalCapture;

/// Holds the cpal stream; the tap is moved into the input callback.
pub struct CpalInputStream {
    _stream: Stream,
    format: StreamFormat,
}

impl CaptureStream for CpalInputStream {
    fn format(&self) -> StreamFormat {
        self.format
    }
}

impl CaptureBackend for CpalCapture {
    fn open(&self, mut tap: InputTap) -> Result<Box<dyn CaptureStream>> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device available"))?;

        let supported_config = device
            .default_input_config()
            .context("querying default input config")?;
        let sample_format = supported_config.sample_format();
        let config: StreamConfig = supported_config.into();
        let format = StreamFormat {
            channels: config.channels as usize,
            sample_rate: config.sample_rate.0,
        };

        log::info!(
            "Input device: {} ch @ {} Hz ({:?})",
            format.channels,
            format.sample_rate,
            sample_format
        );

        tap.set_channels(format.channels);

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, tap)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, tap)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, tap)?,
            other => bail!("Unsupported sample format: {:?}", other),
        };

        Ok(Box::new(CpalInputStream {
            _stream: stream,
            format,
        }))
    }
}

/// Build and start an input stream, converting device samples to f32.
fn build_stream<T>(device: &cpal::Device, config: &StreamConfig, mut tap: InputTap) -> Result<Stream>
where
    T: Sample + SizedSample,
    f32: FromSample<T>,
{
    let err_fn = |err| log::error!("Input stream error: {:?}", err);

    // Reused across callbacks; only grows when the device hands us a bigger block.
    let mut conv: Vec<f32> = Vec::with_capacity(4096);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            conv.clear();
            conv.extend(data.iter().map(|&s| s.to_sample::<f32>()));
            tap.push(&conv);
        },
        err_fn,
        None,
    )?;

    stream.play()?;
    Ok(stream)
}
