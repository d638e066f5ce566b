use crate::audio::domain::audio_segment::AudioSegment;

pub const WAV_HEADER_LEN: usize = 44;

/// Declared RIFF chunk size. Written before the payload length is known and
/// never patched afterwards; readers must measure the actual payload.
const RIFF_DECLARED_SIZE: u32 = 36;

/// Encode a segment as a minimal 44-byte-header RIFF/WAVE file: `RIFF`,
/// declared size, `WAVE`, a 16-byte PCM `fmt ` chunk, then `data` followed
/// immediately by the raw little-endian samples. The data chunk size field
/// is left zero, matching the declared-size caveat above.
pub fn encode(segment: &AudioSegment) -> Vec<u8> {
    let channels = segment.channels();
    let sample_rate = segment.sample_rate();
    let byte_rate = sample_rate * u32::from(channels) * 2;
    let block_align = channels * 2;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + segment.samples().len() * 2);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&RIFF_DECLARED_SIZE.to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    out.extend_from_slice(b"data");
    out.extend_from_slice(&0u32.to_le_bytes());

    for sample in segment.samples() {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    #[test]
    fn test_header_magic_bytes() {
        let seg = AudioSegment::new(vec![0; 100], 16000, 1);
        let wav = encode(&seg);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");
    }

    #[test]
    fn test_header_format_fields() {
        let seg = AudioSegment::new(vec![0; 100], 44100, 2);
        let wav = encode(&seg);
        assert_eq!(read_u32_le(&wav, 16), 16); // fmt chunk size
        assert_eq!(read_u16_le(&wav, 20), 1); // PCM tag
        assert_eq!(read_u16_le(&wav, 22), 2);
        assert_eq!(read_u32_le(&wav, 24), 44100);
        assert_eq!(read_u32_le(&wav, 28), 44100 * 2 * 2);
        assert_eq!(read_u16_le(&wav, 32), 4); // block align
        assert_eq!(read_u16_le(&wav, 34), 16); // bits per sample
    }

    #[test]
    fn test_declared_size_is_best_effort() {
        let seg = AudioSegment::new(vec![0; 100], 16000, 1);
        let wav = encode(&seg);
        assert_eq!(read_u32_le(&wav, 4), 36);
        assert_eq!(read_u32_le(&wav, 40), 0);
    }

    #[test]
    fn test_payload_length_matches_duration() {
        // 500 ms of 16 kHz mono: 8000 samples, 16000 payload bytes.
        let sample_rate = 16000u32;
        let channels = 1u16;
        let duration_ms = 500u64;
        let count = (duration_ms * sample_rate as u64 * channels as u64 / 1000) as usize;
        let seg = AudioSegment::new(vec![7; count], sample_rate, channels);

        let wav = encode(&seg);
        let payload_len = wav.len() - WAV_HEADER_LEN;
        let expected = duration_ms * sample_rate as u64 * channels as u64 * 2 / 1000;
        assert_eq!(payload_len as u64, expected);
    }

    #[test]
    fn test_payload_is_little_endian_samples() {
        let seg = AudioSegment::new(vec![0x0102, -2], 16000, 1);
        let wav = encode(&seg);
        assert_eq!(&wav[44..48], &[0x02, 0x01, 0xFE, 0xFF]);
    }
}
