use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::cache::domain::subtitle_cache::{CacheError, SubtitleCache};
use crate::shared::source_identity::SegmentKey;

/// Filesystem-backed subtitle cache.
///
/// Layout: `<root>/<source-identity>/<start_ms>.txt`. Writes go through a
/// temp file and a rename so a concurrent reader never observes a partial
/// transcript.
pub struct FsSubtitleCache {
    root: PathBuf,
}

impl FsSubtitleCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Platform cache directory for subtitle storage.
    ///
    /// - Linux: `$XDG_CACHE_HOME/rollcap/subtitles/` or `~/.cache/rollcap/subtitles/`
    /// - macOS: `~/Library/Caches/rollcap/subtitles/`
    /// - Windows: `%LOCALAPPDATA%/rollcap/subtitles/`
    pub fn default_root() -> Result<PathBuf, CacheError> {
        dirs::cache_dir()
            .map(|d| d.join("rollcap").join("subtitles"))
            .ok_or(CacheError::NoCacheDir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn source_dir(&self, key: &SegmentKey) -> PathBuf {
        self.root.join(key.source.as_str())
    }

    fn segment_path(&self, key: &SegmentKey) -> PathBuf {
        self.source_dir(key).join(format!("{}.txt", key.start_ms))
    }
}

impl SubtitleCache for FsSubtitleCache {
    fn get(&self, key: &SegmentKey) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.segment_path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Read(e)),
        }
    }

    fn put(&self, key: &SegmentKey, text: &str) -> Result<(), CacheError> {
        fs::create_dir_all(self.source_dir(key)).map_err(CacheError::Write)?;

        let path = self.segment_path(key);

        let temp_path = path.with_extension("part");
        fs::write(&temp_path, text).map_err(CacheError::Write)?;
        fs::rename(&temp_path, &path).map_err(CacheError::Write)?;
        Ok(())
    }

    fn has(&self, key: &SegmentKey) -> bool {
        self.segment_path(key).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::source_identity::SourceIdentity;
    use tempfile::TempDir;

    fn key_for(locator: &str, start_ms: u64) -> SegmentKey {
        SegmentKey::new(SourceIdentity::from_locator(locator), start_ms)
    }

    #[test]
    fn test_get_missing_returns_none() {
        let tmp = TempDir::new().unwrap();
        let cache = FsSubtitleCache::new(tmp.path());
        let result = cache.get(&key_for("/v.mp4", 0)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_put_then_get_round_trips() {
        let tmp = TempDir::new().unwrap();
        let cache = FsSubtitleCache::new(tmp.path());
        let key = key_for("/v.mp4", 3500);

        cache.put(&key, "hello there").unwrap();
        assert_eq!(cache.get(&key).unwrap().as_deref(), Some("hello there"));
    }

    #[test]
    fn test_has_reflects_presence() {
        let tmp = TempDir::new().unwrap();
        let cache = FsSubtitleCache::new(tmp.path());
        let key = key_for("/v.mp4", 7000);

        assert!(!cache.has(&key));
        cache.put(&key, "x").unwrap();
        assert!(cache.has(&key));
    }

    #[test]
    fn test_put_overwrites_last_write_wins() {
        let tmp = TempDir::new().unwrap();
        let cache = FsSubtitleCache::new(tmp.path());
        let key = key_for("/v.mp4", 0);

        cache.put(&key, "first").unwrap();
        cache.put(&key, "second").unwrap();
        assert_eq!(cache.get(&key).unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_file_layout_per_source_and_start() {
        let tmp = TempDir::new().unwrap();
        let cache = FsSubtitleCache::new(tmp.path());
        let key = key_for("/videos/a.mp4", 4000);

        cache.put(&key, "text").unwrap();
        let expected = tmp.path().join(key.source.as_str()).join("4000.txt");
        assert!(expected.exists());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let tmp = TempDir::new().unwrap();
        let cache = FsSubtitleCache::new(tmp.path());
        let key = key_for("/v.mp4", 4000);

        cache.put(&key, "text").unwrap();
        let dir = tmp.path().join(key.source.as_str());
        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["4000.txt".to_string()]);
    }

    #[test]
    fn test_distinct_sources_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let cache = FsSubtitleCache::new(tmp.path());
        let a = key_for("/a.mp4", 0);
        let b = key_for("/b.mp4", 0);

        cache.put(&a, "from a").unwrap();
        assert!(cache.get(&b).unwrap().is_none());
    }
}
