use std::path::Path;

use thiserror::Error;

use crate::audio::domain::audio_segment::AudioSegment;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no audio track in source")]
    NoAudioTrack,
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("audio decode failed: {0}")]
    Decode(String),
}

/// Cuts one window of decoded audio out of a media source.
///
/// Implementations keep no decoder state across calls; each call opens,
/// decodes, and closes the source independently. A window that runs past
/// the end of the stream yields a shorter segment, not an error.
pub trait SegmentExtractor: Send + Sync {
    fn extract(
        &self,
        source: &Path,
        start_ms: u64,
        duration_ms: u64,
    ) -> Result<AudioSegment, ExtractError>;
}
