use thiserror::Error;

use crate::shared::source_identity::SegmentKey;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to read cached transcript: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write cached transcript: {0}")]
    Write(#[source] std::io::Error),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Persistent store of per-segment transcripts.
///
/// A missing entry is a normal state, not a failure: `get` reports it as
/// `Ok(None)` and callers branch on it. `put` overwrites unconditionally;
/// last write wins.
pub trait SubtitleCache: Send + Sync {
    fn get(&self, key: &SegmentKey) -> Result<Option<String>, CacheError>;

    fn put(&self, key: &SegmentKey, text: &str) -> Result<(), CacheError>;

    fn has(&self, key: &SegmentKey) -> bool;
}
