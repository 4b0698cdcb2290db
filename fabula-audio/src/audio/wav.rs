//! WAV (RIFF) encoding of sample buffers
//!
//! Output is always 16-bit PCM, little-endian, with a plain 44-byte
//! header and frame-major interleaved data. Float samples are clamped to
//! [-1, 1] and scaled asymmetrically (negative values by 32768, positive
//! by 32767) so that full-scale input lands exactly on the i16 limits.

use crate::audio::types::SampleBuffer;

/// Convert one float sample to i16 with clamping and truncation.
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode a buffer into a complete in-memory WAV file.
pub fn encode_wav(buffer: &SampleBuffer) -> Vec<u8> {
    let num_channels = buffer.channel_count() as u16;
    let bits_per_sample: u16 = 16;
    let sample_rate = buffer.sample_rate();
    let byte_rate = sample_rate * u32::from(num_channels) * u32::from(bits_per_sample) / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = (buffer.len() * buffer.channel_count() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // sub-chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data sub-chunk, frames interleaved across channels
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for frame in 0..buffer.len() {
        for channel in buffer.channels() {
            buf.extend_from_slice(&sample_to_i16(channel[frame]).to_le_bytes());
        }
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_conversion_landmarks() {
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(1.0), 32767);
        assert_eq!(sample_to_i16(-1.0), -32768);
        // 0.5 * 32767 = 16383.5, truncated
        assert_eq!(sample_to_i16(0.5), 16383);
        // -0.5 * 32768 = -16384 exactly
        assert_eq!(sample_to_i16(-0.5), -16384);
    }

    #[test]
    fn test_conversion_clamps_out_of_range() {
        assert_eq!(sample_to_i16(1.5), 32767);
        assert_eq!(sample_to_i16(-2.0), -32768);
    }

    #[test]
    fn test_header_fields_mono() {
        let buffer = SampleBuffer::from_mono(vec![0.0; 100], 44100);
        let bytes = encode_wav(&buffer);

        assert_eq!(bytes.len(), 44 + 200);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        // file size field excludes the first 8 bytes
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 36 + 200);
        // channels, rate, byte rate, block align, bit depth
        assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 44100);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 88200);
        assert_eq!(u16::from_le_bytes(bytes[32..34].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(bytes[34..36].try_into().unwrap()), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 200);
    }

    #[test]
    fn test_empty_buffer_is_bare_header() {
        let buffer = SampleBuffer::from_mono(vec![], 22050);
        let bytes = encode_wav(&buffer);
        assert_eq!(bytes.len(), 44);
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 0);
    }

    #[test]
    fn test_stereo_interleave_order() {
        let buffer = SampleBuffer::from_channels(
            vec![vec![0.25, 0.5], vec![-0.25, -0.5]],
            48000,
        )
        .unwrap();
        let bytes = encode_wav(&buffer);

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 48000);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(
            samples,
            vec![
                sample_to_i16(0.25),
                sample_to_i16(-0.25),
                sample_to_i16(0.5),
                sample_to_i16(-0.5),
            ]
        );
    }

    #[test]
    fn test_hound_reads_back_exact_values() {
        let samples = vec![0.0, 0.1, -0.1, 0.9999, -0.9999, 1.0, -1.0];
        let buffer = SampleBuffer::from_mono(samples.clone(), 44100);
        let bytes = encode_wav(&buffer);

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let decoded: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        let expected: Vec<i16> = samples.iter().map(|&s| sample_to_i16(s)).collect();
        assert_eq!(decoded, expected);
    }
}
