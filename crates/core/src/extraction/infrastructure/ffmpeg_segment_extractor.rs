use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::extraction::domain::segment_extractor::{ExtractError, SegmentExtractor};
use crate::shared::constants::{DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};

/// Decodes one audio window from a media file using ffmpeg-next.
///
/// Seeks to the nearest sync point at or before the window start, decodes
/// forward, resamples to the configured packed-i16 output format, and
/// discards everything decoded before the window start.
pub struct FfmpegSegmentExtractor {
    sample_rate: u32,
    channels: u16,
}

impl FfmpegSegmentExtractor {
    pub fn new() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
        }
    }

    pub fn with_output_format(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }
}

impl Default for FfmpegSegmentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentExtractor for FfmpegSegmentExtractor {
    fn extract(
        &self,
        source: &Path,
        start_ms: u64,
        duration_ms: u64,
    ) -> Result<AudioSegment, ExtractError> {
        let decode = |e: ffmpeg_next::Error| ExtractError::Decode(e.to_string());

        ffmpeg_next::init().map_err(decode)?;

        let mut ictx = ffmpeg_next::format::input(source)
            .map_err(|e| ExtractError::SourceUnavailable(e.to_string()))?;

        let audio_stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Audio)
            .ok_or(ExtractError::NoAudioTrack)?;
        let stream_index = audio_stream.index();
        let time_base = audio_stream.time_base();
        let codec_params = audio_stream.parameters();

        if start_ms > 0 {
            // AV_TIME_BASE is microseconds; lands on the keyframe at or
            // before the requested start.
            let ts = start_ms as i64 * 1000;
            ictx.seek(ts, ..ts).map_err(decode)?;
        }

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(codec_params).map_err(decode)?;
        let mut decoder = codec_ctx.decoder().audio().map_err(decode)?;

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            ffmpeg_next::format::Sample::I16(ffmpeg_next::format::sample::Type::Packed),
            ffmpeg_next::ChannelLayout::default(i32::from(self.channels)),
            self.sample_rate,
        )
        .map_err(decode)?;

        let samples_per_ms = u64::from(self.sample_rate) * u64::from(self.channels);
        let needed = (duration_ms * samples_per_ms / 1000) as usize;

        let mut collected: Vec<i16> = Vec::with_capacity(needed);
        let mut skip: Option<usize> = None;
        let mut decoded_frame = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled_frame = ffmpeg_next::util::frame::audio::Audio::empty();
        let channels = usize::from(self.channels);

        'packets: for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }

            decoder.send_packet(&packet).map_err(decode)?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if skip.is_none() {
                    skip = Some(discard_count(
                        decoded_frame.pts(),
                        time_base,
                        start_ms,
                        samples_per_ms,
                    ));
                }
                resampler.run(&decoded_frame, &mut resampled_frame).map_err(decode)?;
                extract_packed_i16(&resampled_frame, channels, &mut collected);

                if collected.len() >= skip.unwrap_or(0) + needed {
                    break 'packets;
                }
            }
        }

        let skip = skip.unwrap_or(0);

        if collected.len() < skip + needed {
            // End of stream before the window was filled: drain the decoder
            // and the resampler, then truncate naturally.
            decoder.send_eof().map_err(decode)?;
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                resampler.run(&decoded_frame, &mut resampled_frame).map_err(decode)?;
                extract_packed_i16(&resampled_frame, channels, &mut collected);
            }
            if let Ok(Some(delay)) = resampler.flush(&mut resampled_frame) {
                if delay.output > 0 {
                    extract_packed_i16(&resampled_frame, channels, &mut collected);
                }
            }
        }

        let start = skip.min(collected.len());
        let end = (skip + needed).min(collected.len());
        Ok(AudioSegment::new(
            collected[start..end].to_vec(),
            self.sample_rate,
            self.channels,
        ))
    }
}

/// Output samples to drop between the seek landing point and the requested
/// window start. The first decoded frame's timestamp anchors the timeline;
/// without one the window is assumed to start at the landing point.
fn discard_count(
    pts: Option<i64>,
    time_base: ffmpeg_next::Rational,
    start_ms: u64,
    samples_per_ms: u64,
) -> usize {
    let Some(pts) = pts else {
        return 0;
    };
    if time_base.denominator() == 0 {
        return 0;
    }
    let anchor_ms = pts * i64::from(time_base.numerator()) * 1000
        / i64::from(time_base.denominator());
    let lead_ms = (start_ms as i64 - anchor_ms).max(0) as u64;
    (lead_ms * samples_per_ms / 1000) as usize
}

/// Append samples from a packed i16 resampled frame.
fn extract_packed_i16(
    frame: &ffmpeg_next::util::frame::audio::Audio,
    channels: usize,
    out: &mut Vec<i16>,
) {
    let count = frame.samples() * channels;
    if count == 0 {
        return;
    }
    let data = frame.data(0);
    let samples = unsafe { std::slice::from_raw_parts(data.as_ptr() as *const i16, count) };
    out.extend_from_slice(samples);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_nonexistent_file_is_source_unavailable() {
        let extractor = FfmpegSegmentExtractor::new();
        let path = if cfg!(windows) {
            Path::new("Z:\\nonexistent\\file.mp4")
        } else {
            Path::new("/nonexistent/file.mp4")
        };
        let result = extractor.extract(path, 0, 3500);
        assert!(matches!(result, Err(ExtractError::SourceUnavailable(_))));
    }

    #[test]
    fn test_extract_non_media_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("not_media.txt");
        std::fs::write(&path, b"plain text, no container").unwrap();

        let extractor = FfmpegSegmentExtractor::new();
        let result = extractor.extract(&path, 0, 3500);
        assert!(result.is_err());
    }

    #[test]
    fn test_discard_count_before_window() {
        // Anchor at 2000 ms for a window starting at 3500 ms: 1.5 s of
        // 16 kHz mono to drop.
        let count = discard_count(Some(2000), ffmpeg_next::Rational(1, 1000), 3500, 16_000);
        assert_eq!(count, 24_000);
    }

    #[test]
    fn test_discard_count_anchor_after_start() {
        let count = discard_count(Some(4000), ffmpeg_next::Rational(1, 1000), 3500, 16_000);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_discard_count_without_pts() {
        assert_eq!(discard_count(None, ffmpeg_next::Rational(1, 1000), 3500, 16_000), 0);
    }
}
