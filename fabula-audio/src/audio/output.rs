//! Audio playback using cpal
//!
//! Plays a prepared sample buffer through an output device. The buffer
//! is resampled to the device rate and interleaved up front, then a
//! realtime callback walks a cursor over the interleaved data, applying
//! volume and emitting silence once the clip runs out.

use crate::audio::resampler;
use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use crate::session::transport::PlaybackHandle;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use fabula_common::timing::sample_index;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Device-backed playback handle.
///
/// The underlying cpal stream is not `Send`, so a `CpalPlayback` must
/// live on the thread that created it.
pub struct CpalPlayback {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    volume: Arc<Mutex<f32>>,
    finished: Arc<AtomicBool>,
    error_flag: Arc<AtomicBool>,
}

impl CpalPlayback {
    /// Open the named output device, falling back to the system default
    /// when the name is unknown.
    pub fn new(device_name: Option<String>) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name.as_ref() {
            let mut devices = host.output_devices().map_err(|e| {
                Error::AudioDevice(format!("failed to enumerate output devices: {}", e))
            })?;

            match devices.find(|d| d.name().ok().as_ref() == Some(name)) {
                Some(dev) => {
                    info!("found requested audio device: {}", name);
                    dev
                }
                None => {
                    warn!("device '{}' not found, falling back to default", name);
                    host.default_output_device().ok_or_else(|| {
                        Error::AudioDevice(format!(
                            "device '{}' not found and no default device available",
                            name
                        ))
                    })?
                }
            }
        } else {
            host.default_output_device()
                .ok_or_else(|| Error::AudioDevice("no default output device".to_string()))?
        };

        let (config, sample_format) = Self::get_best_config(&device)?;
        debug!(
            "output config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            volume: Arc::new(Mutex::new(1.0)),
            finished: Arc::new(AtomicBool::new(true)),
            error_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Prefer 44.1kHz stereo f32, the most common clip format; otherwise
    /// take whatever the device calls its default.
    fn get_best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        let mut supported = device
            .supported_output_configs()
            .map_err(|e| Error::AudioDevice(format!("failed to get device configs: {}", e)))?;

        let preferred = supported.find(|config| {
            config.channels() == 2
                && config.min_sample_rate().0 <= 44100
                && config.max_sample_rate().0 >= 44100
                && config.sample_format() == SampleFormat::F32
        });

        if let Some(config) = preferred {
            let sample_format = config.sample_format();
            let config = config.with_sample_rate(cpal::SampleRate(44100)).config();
            return Ok((config, sample_format));
        }

        let config = device
            .default_output_config()
            .map_err(|e| Error::AudioDevice(format!("failed to get default config: {}", e)))?;
        let sample_format = config.sample_format();
        Ok((config.config(), sample_format))
    }

    pub fn device_name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "unknown".to_string())
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Volume applied in the audio callback, clamped to [0, 1].
    pub fn set_volume(&self, volume: f32) {
        *self.volume.lock().unwrap() = volume.clamp(0.0, 1.0);
    }

    /// True once the cursor has run off the end of the current clip.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    pub fn has_error(&self) -> bool {
        self.error_flag.load(Ordering::Relaxed)
    }

    fn build_output<T>(
        &self,
        samples: Arc<Vec<f32>>,
        cursor: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
    ) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let volume = Arc::clone(&self.volume);
        let error_flag = Arc::clone(&self.error_flag);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let current_volume = *volume.lock().unwrap();
                    let mut pos = cursor.load(Ordering::Relaxed);

                    for out in data.iter_mut() {
                        let value = if pos < samples.len() {
                            let v = samples[pos] * current_volume;
                            pos += 1;
                            v.clamp(-1.0, 1.0)
                        } else {
                            0.0
                        };
                        *out = T::from_sample(value);
                    }

                    if pos >= samples.len() {
                        finished.store(true, Ordering::Relaxed);
                    }
                    cursor.store(pos, Ordering::Relaxed);
                },
                move |err| {
                    error!("output stream error: {}", err);
                    error_flag.store(true, Ordering::Relaxed);
                },
                None,
            )
            .map_err(|e| Error::AudioDevice(format!("failed to build output stream: {}", e)))?;

        Ok(stream)
    }
}

impl PlaybackHandle for CpalPlayback {
    fn start(&mut self, buffer: &SampleBuffer, offset_secs: f64) -> Result<()> {
        self.stop()?;

        let device_rate = self.config.sample_rate.0;
        let prepared;
        let buffer = if buffer.sample_rate() != device_rate {
            prepared = resampler::resample(buffer, device_rate)?;
            &prepared
        } else {
            buffer
        };

        let start_frame = sample_index(offset_secs, device_rate).min(buffer.len());
        let samples = Arc::new(interleave_for_device(
            buffer,
            self.config.channels as usize,
            start_frame,
        ));

        debug!(
            "starting playback: {} frames from frame {}",
            buffer.len() - start_frame,
            start_frame
        );

        let cursor = Arc::new(AtomicUsize::new(0));
        self.finished = Arc::new(AtomicBool::new(false));
        self.error_flag.store(false, Ordering::Relaxed);

        let stream = match self.sample_format {
            SampleFormat::F32 => {
                self.build_output::<f32>(samples, cursor, Arc::clone(&self.finished))?
            }
            SampleFormat::I16 => {
                self.build_output::<i16>(samples, cursor, Arc::clone(&self.finished))?
            }
            SampleFormat::U16 => {
                self.build_output::<u16>(samples, cursor, Arc::clone(&self.finished))?
            }
            sample_format => {
                return Err(Error::AudioDevice(format!(
                    "unsupported output sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioDevice(format!("failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.as_ref() {
            stream
                .pause()
                .map_err(|e| Error::AudioDevice(format!("failed to pause stream: {}", e)))?;
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.as_ref() {
            stream
                .play()
                .map_err(|e| Error::AudioDevice(format!("failed to resume stream: {}", e)))?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            stream
                .pause()
                .map_err(|e| Error::AudioDevice(format!("failed to stop stream: {}", e)))?;
            drop(stream);
        }
        self.finished.store(true, Ordering::Relaxed);
        Ok(())
    }
}

impl Drop for CpalPlayback {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Names of all available output devices.
pub fn list_output_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| Error::AudioDevice(format!("failed to enumerate output devices: {}", e)))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

/// Lay a planar buffer out as interleaved frames for a device with
/// `device_channels` outputs. Mono broadcasts to every output; extra
/// device channels beyond the buffer's get silence.
fn interleave_for_device(
    buffer: &SampleBuffer,
    device_channels: usize,
    start_frame: usize,
) -> Vec<f32> {
    let frames = buffer.len().saturating_sub(start_frame);
    let mut out = Vec::with_capacity(frames * device_channels);

    for frame in start_frame..buffer.len() {
        for ch in 0..device_channels {
            let value = if buffer.channel_count() == 1 {
                buffer.channel(0)[frame]
            } else if ch < buffer.channel_count() {
                buffer.channel(ch)[frame]
            } else {
                0.0
            };
            out.push(value);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_mono_broadcasts_to_stereo() {
        let buffer = SampleBuffer::from_mono(vec![0.1, 0.2], 44100);
        let out = interleave_for_device(&buffer, 2, 0);
        assert_eq!(out, vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_interleave_stereo_passthrough() {
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.1, 0.2], vec![0.3, 0.4]], 44100).unwrap();
        let out = interleave_for_device(&buffer, 2, 0);
        assert_eq!(out, vec![0.1, 0.3, 0.2, 0.4]);
    }

    #[test]
    fn test_interleave_extra_device_channels_are_silent() {
        let buffer =
            SampleBuffer::from_channels(vec![vec![0.1], vec![0.2]], 44100).unwrap();
        let out = interleave_for_device(&buffer, 4, 0);
        assert_eq!(out, vec![0.1, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn test_interleave_offset_skips_frames() {
        let buffer = SampleBuffer::from_mono(vec![0.1, 0.2, 0.3], 44100);
        let out = interleave_for_device(&buffer, 1, 1);
        assert_eq!(out, vec![0.2, 0.3]);
    }

    #[test]
    fn test_list_devices_does_not_panic() {
        // May legitimately fail in headless environments
        let _ = list_output_devices();
    }
}
