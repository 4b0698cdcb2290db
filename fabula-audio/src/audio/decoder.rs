//! Audio decoding using symphonia
//!
//! Decodes compressed or PCM audio (MP3, AAC/M4A, FLAC, Vorbis, WAV) into
//! planar f32 sample buffers at the source's native rate and channel
//! count. Decoding always runs from the start of the stream; trimming is
//! a clip operation, not a decoder concern.

use crate::audio::types::SampleBuffer;
use crate::error::{Error, Result};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

pub struct AudioDecoder;

impl AudioDecoder {
    /// Decode an entire audio file.
    ///
    /// # Errors
    /// - Failed to open file
    /// - Unsupported or unrecognized format
    /// - Stream carries no audio track
    pub fn decode_file(path: &Path) -> Result<SampleBuffer> {
        debug!("decoding file: {}", path.display());

        let file = std::fs::File::open(path)
            .map_err(|e| Error::Decode(format!("failed to open {}: {}", path.display(), e)))?;

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        Self::decode_stream(mss, hint)
    }

    /// Decode audio held in memory, e.g. a stored clip or an uploaded
    /// file. The extension, when known, helps the format probe.
    pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<SampleBuffer> {
        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
        Self::decode_stream(mss, hint)
    }

    fn decode_stream(mss: MediaSourceStream, hint: Hint) -> Result<SampleBuffer> {
        let format_opts = FormatOptions::default();
        let metadata_opts = MetadataOptions::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|e| Error::Decode(format!("failed to probe format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("no audio track found".to_string()))?;

        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("sample rate not found".to_string()))?;

        let channel_count = track
            .codec_params
            .channels
            .map(|c| c.count())
            .ok_or_else(|| Error::Decode("channel count not found".to_string()))?;

        debug!(
            "source format: sample_rate={}, channels={}",
            sample_rate, channel_count
        );

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("failed to create decoder: {}", e)))?;

        let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    // End of stream
                    break;
                }
                Err(e) => {
                    warn!("error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => Self::append_planar(&decoded, &mut channels),
                Err(e) => {
                    warn!("decode error: {}", e);
                    continue;
                }
            }
        }

        let frames = channels.first().map(|c| c.len()).unwrap_or(0);
        debug!("decoded {} frames at {} Hz", frames, sample_rate);

        SampleBuffer::from_channels(channels, sample_rate)
    }

    fn append_planar(decoded: &AudioBufferRef, channels: &mut [Vec<f32>]) {
        match decoded {
            AudioBufferRef::U8(buf) => Self::extend_from(buf, channels),
            AudioBufferRef::U16(buf) => Self::extend_from(buf, channels),
            AudioBufferRef::U24(buf) => Self::extend_from(buf, channels),
            AudioBufferRef::U32(buf) => Self::extend_from(buf, channels),
            AudioBufferRef::S8(buf) => Self::extend_from(buf, channels),
            AudioBufferRef::S16(buf) => Self::extend_from(buf, channels),
            AudioBufferRef::S24(buf) => Self::extend_from(buf, channels),
            AudioBufferRef::S32(buf) => Self::extend_from(buf, channels),
            AudioBufferRef::F32(buf) => Self::extend_from(buf, channels),
            AudioBufferRef::F64(buf) => Self::extend_from(buf, channels),
        }
    }

    fn extend_from<S>(buf: &AudioBuffer<S>, channels: &mut [Vec<f32>])
    where
        S: Sample,
        f32: FromSample<S>,
    {
        let decoded_channels = buf.spec().channels.count();
        for (ch_idx, out) in channels.iter_mut().enumerate() {
            if ch_idx >= decoded_channels {
                break;
            }
            out.reserve(buf.frames());
            for &sample in buf.chan(ch_idx) {
                out.push(f32::from_sample(sample));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::encode_wav;

    #[test]
    fn test_decode_wav_bytes_round_trip() {
        let original = vec![0.0, 0.25, -0.5, 0.9, -0.9, 0.1];
        let buffer = SampleBuffer::from_mono(original.clone(), 22050);
        let bytes = encode_wav(&buffer);

        let decoded = AudioDecoder::decode_bytes(bytes, Some("wav")).unwrap();
        assert_eq!(decoded.sample_rate(), 22050);
        assert_eq!(decoded.channel_count(), 1);
        assert_eq!(decoded.len(), original.len());
        for (got, want) in decoded.channel(0).iter().zip(&original) {
            assert!((got - want).abs() < 1e-3, "got {} want {}", got, want);
        }
    }

    #[test]
    fn test_decode_preserves_channel_separation() {
        let buffer = SampleBuffer::from_channels(
            vec![vec![0.5; 32], vec![-0.5; 32]],
            44100,
        )
        .unwrap();
        let bytes = encode_wav(&buffer);

        let decoded = AudioDecoder::decode_bytes(bytes, Some("wav")).unwrap();
        assert_eq!(decoded.channel_count(), 2);
        assert!(decoded.channel(0).iter().all(|&s| (s - 0.5).abs() < 1e-3));
        assert!(decoded.channel(1).iter().all(|&s| (s + 0.5).abs() < 1e-3));
    }

    #[test]
    fn test_decode_rejects_unrecognized_bytes() {
        let result = AudioDecoder::decode_bytes(vec![0u8; 64], None);
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
