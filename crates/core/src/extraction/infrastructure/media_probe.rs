use std::path::Path;

use crate::extraction::domain::segment_extractor::ExtractError;

/// Container duration in milliseconds.
///
/// Returns `Ok(None)` when the container does not declare a duration;
/// callers that need to enumerate segments must treat that as fatal.
pub fn probe_duration_ms(path: &Path) -> Result<Option<u64>, ExtractError> {
    ffmpeg_next::init().map_err(|e| ExtractError::Decode(e.to_string()))?;

    let ictx = ffmpeg_next::format::input(path)
        .map_err(|e| ExtractError::SourceUnavailable(e.to_string()))?;

    // Duration is reported in AV_TIME_BASE (microsecond) units, negative
    // when unknown.
    let duration = ictx.duration();
    if duration <= 0 {
        return Ok(None);
    }
    Ok(Some(duration as u64 / 1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_nonexistent_file_is_source_unavailable() {
        let path = if cfg!(windows) {
            Path::new("Z:\\nonexistent\\file.mp4")
        } else {
            Path::new("/nonexistent/file.mp4")
        };
        let result = probe_duration_ms(path);
        assert!(matches!(result, Err(ExtractError::SourceUnavailable(_))));
    }

    #[test]
    fn test_probe_non_media_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("not_media.txt");
        std::fs::write(&path, b"plain text").unwrap();

        assert!(probe_duration_ms(&path).is_err());
    }
}
