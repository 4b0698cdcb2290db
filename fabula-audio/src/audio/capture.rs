//! Microphone capture for recording background clips
//!
//! Runs a cpal input stream that downmixes device frames to mono and
//! feeds them through a lock-free ring into the session's accumulation
//! buffer. Callers drain periodically (which also feeds the live level
//! monitor) and call [`CaptureSession::finish`] to obtain the recording
//! as a sample buffer.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Ring capacity in seconds of mono audio. Callers that drain at any
/// reasonable interval will never come close to filling it.
const RING_SECONDS: usize = 60;

/// An in-progress recording from an input device.
///
/// The cpal stream is not `Send`, so the session must stay on the thread
/// that created it.
pub struct CaptureSession {
    stream: cpal::Stream,
    sample_rate: u32,
    consumer: ringbuf::HeapCons<f32>,
    captured: Vec<f32>,
    overruns: Arc<AtomicUsize>,
}

impl CaptureSession {
    /// Open the named input device (or the system default) and start
    /// capturing immediately.
    pub fn start(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = find_input_device(&host, device_name)?;

        let device_label = device.name().unwrap_or_else(|_| "unknown".to_string());
        let config = device.default_input_config().map_err(|e| {
            Error::AudioDevice(format!(
                "no default input config for {}: {}",
                device_label, e
            ))
        })?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        info!(
            "capturing from {} at {} Hz ({} channels, downmixed to mono)",
            device_label, sample_rate, channels
        );

        let ring = HeapRb::<f32>::new(RING_SECONDS * sample_rate as usize);
        let (producer, consumer) = ring.split();
        let overruns = Arc::new(AtomicUsize::new(0));

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                build_input::<f32>(&device, &config.into(), producer, overruns.clone())?
            }
            cpal::SampleFormat::I16 => {
                build_input::<i16>(&device, &config.into(), producer, overruns.clone())?
            }
            cpal::SampleFormat::U16 => {
                build_input::<u16>(&device, &config.into(), producer, overruns.clone())?
            }
            format => {
                return Err(Error::AudioDevice(format!(
                    "unsupported input sample format: {}",
                    format
                )))
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioDevice(format!("failed to start capture: {}", e)))?;

        Ok(Self {
            stream,
            sample_rate,
            consumer,
            captured: Vec::new(),
            overruns,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Seconds of audio accumulated so far, not counting samples still
    /// sitting in the ring.
    pub fn captured_seconds(&self) -> f64 {
        self.captured.len() as f64 / self.sample_rate as f64
    }

    /// Move everything the device has produced since the last drain into
    /// the accumulation buffer, returning the new chunk for live
    /// monitoring.
    pub fn drain(&mut self) -> Vec<f32> {
        let available = self.consumer.occupied_len();
        let mut chunk = vec![0.0f32; available];
        let read = self.consumer.pop_slice(&mut chunk);
        chunk.truncate(read);
        self.captured.extend_from_slice(&chunk);
        chunk
    }

    /// Stop the device and return the full recording as a mono buffer.
    pub fn finish(self) -> SampleBuffer {
        let CaptureSession {
            stream,
            sample_rate,
            mut consumer,
            mut captured,
            overruns,
        } = self;

        // Dropping the stream stops callbacks, so the final drain sees a
        // quiescent ring.
        drop(stream);

        let available = consumer.occupied_len();
        let mut tail = vec![0.0f32; available];
        let read = consumer.pop_slice(&mut tail);
        captured.extend_from_slice(&tail[..read]);

        let dropped = overruns.load(Ordering::Relaxed);
        if dropped > 0 {
            warn!("capture ring overran, dropped {} samples", dropped);
        }

        SampleBuffer::from_mono(captured, sample_rate)
    }
}

/// Names of all available input devices.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| Error::AudioDevice(format!("failed to enumerate input devices: {}", e)))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

fn find_input_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    match name {
        Some(name) => {
            let mut devices = host.input_devices().map_err(|e| {
                Error::AudioDevice(format!("failed to enumerate input devices: {}", e))
            })?;
            devices
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| Error::AudioDevice(format!("input device not found: {}", name)))
        }
        None => host
            .default_input_device()
            .ok_or_else(|| Error::AudioDevice("no default input device".to_string())),
    }
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut producer: ringbuf::HeapProd<f32>,
    overruns: Arc<AtomicUsize>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                for frame in data.chunks_exact(channels) {
                    if producer.try_push(mono_mix(frame)).is_err() {
                        overruns.fetch_add(1, Ordering::Relaxed);
                    }
                }
            },
            |err| error!("capture stream error: {}", err),
            None,
        )
        .map_err(|e| Error::AudioDevice(format!("failed to build input stream: {}", e)))?;

    Ok(stream)
}

/// Average one interleaved frame down to a single mono sample.
fn mono_mix<T>(frame: &[T]) -> f32
where
    T: Sample,
    f32: FromSample<T>,
{
    let sum: f32 = frame.iter().map(|s| s.to_sample::<f32>()).sum();
    sum / frame.len() as f32
}
