use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::cache::domain::subtitle_cache::SubtitleCache;
use crate::extraction::domain::segment_extractor::SegmentExtractor;
use crate::shared::source_identity::{SegmentKey, SourceIdentity};
use crate::transcription::domain::speech_recognizer::{RecognitionConfig, SpeechRecognizer};

pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Progress callback `(segments_done, segments_total)`; returning false
/// requests cancellation.
pub type ProgressFn = Box<dyn Fn(usize, usize) -> bool + Send>;

#[derive(Error, Debug)]
pub enum PreloadError {
    #[error("source duration is unknown; cannot enumerate segments")]
    UnknownDuration,
    #[error("preload cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreloadReport {
    pub total: usize,
    pub skipped: usize,
    pub transcribed: usize,
    pub failed: usize,
}

/// Loads every segment transcript for a source before playback begins.
///
/// Walks the duration in fixed-size segments, skips keys already cached,
/// and runs extract → recognize → cache for the rest on a worker pool.
/// Per-segment failures are logged and leave the key absent; the batch
/// keeps going. Completion order is unspecified; the join-all barrier is
/// the only ordering guarantee.
pub struct PreloadSubtitlesUseCase {
    extractor: Arc<dyn SegmentExtractor>,
    recognizer: Arc<dyn SpeechRecognizer>,
    cache: Arc<dyn SubtitleCache>,
    recognition: RecognitionConfig,
    segment_duration_ms: u64,
    workers: usize,
    on_progress: Option<ProgressFn>,
    cancelled: Arc<AtomicBool>,
}

impl PreloadSubtitlesUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extractor: Arc<dyn SegmentExtractor>,
        recognizer: Arc<dyn SpeechRecognizer>,
        cache: Arc<dyn SubtitleCache>,
        recognition: RecognitionConfig,
        segment_duration_ms: u64,
        workers: usize,
        on_progress: Option<ProgressFn>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            extractor,
            recognizer,
            cache,
            recognition,
            segment_duration_ms,
            workers,
            on_progress,
            cancelled,
        }
    }

    pub fn run(
        &self,
        source: &Path,
        total_duration_ms: u64,
    ) -> Result<PreloadReport, PreloadError> {
        if total_duration_ms == 0 {
            return Err(PreloadError::UnknownDuration);
        }

        let identity = SourceIdentity::from_locator(&source.to_string_lossy());

        // Boundaries strictly below the duration; the final partial segment
        // is attempted with the full nominal length and truncates at EOS.
        let mut report = PreloadReport::default();
        let mut pending: Vec<SegmentKey> = Vec::new();
        for start_ms in (0..total_duration_ms).step_by(self.segment_duration_ms as usize) {
            report.total += 1;
            let key = SegmentKey::new(identity.clone(), start_ms);
            if self.cache.has(&key) {
                report.skipped += 1;
            } else {
                pending.push(key);
            }
        }

        if !self.report_progress(report.skipped, report.total) {
            self.cancelled.store(true, Ordering::Relaxed);
        }

        if pending.is_empty() || self.cancelled.load(Ordering::Relaxed) {
            if self.cancelled.load(Ordering::Relaxed) {
                return Err(PreloadError::Cancelled);
            }
            return Ok(report);
        }

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<SegmentKey>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<bool>();

        let pending_count = pending.len();
        for key in pending {
            if job_tx.send(key).is_err() {
                break;
            }
        }
        drop(job_tx);

        let worker_count = self.workers.max(1).min(pending_count);
        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            handles.push(spawn_worker(
                source.to_path_buf(),
                self.segment_duration_ms,
                self.recognition.clone(),
                self.extractor.clone(),
                self.recognizer.clone(),
                self.cache.clone(),
                job_rx.clone(),
                result_tx.clone(),
                self.cancelled.clone(),
            ));
        }
        drop(job_rx);
        drop(result_tx);

        let mut done = report.skipped;
        for succeeded in result_rx {
            done += 1;
            if succeeded {
                report.transcribed += 1;
            } else {
                report.failed += 1;
            }
            if !self.report_progress(done, report.total) {
                self.cancelled.store(true, Ordering::Relaxed);
            }
        }

        for handle in handles {
            if handle.join().is_err() {
                log::warn!("preload worker panicked");
            }
        }

        if self.cancelled.load(Ordering::Relaxed) {
            return Err(PreloadError::Cancelled);
        }
        Ok(report)
    }

    fn report_progress(&self, done: usize, total: usize) -> bool {
        match &self.on_progress {
            Some(cb) => cb(done, total),
            None => true,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_worker(
    source: PathBuf,
    segment_duration_ms: u64,
    recognition: RecognitionConfig,
    extractor: Arc<dyn SegmentExtractor>,
    recognizer: Arc<dyn SpeechRecognizer>,
    cache: Arc<dyn SubtitleCache>,
    job_rx: crossbeam_channel::Receiver<SegmentKey>,
    result_tx: crossbeam_channel::Sender<bool>,
    cancelled: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for key in job_rx {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let succeeded = load_segment(
                &source,
                &key,
                segment_duration_ms,
                &recognition,
                &*extractor,
                &*recognizer,
                &*cache,
            );
            if result_tx.send(succeeded).is_err() {
                break;
            }
        }
    })
}

fn load_segment(
    source: &Path,
    key: &SegmentKey,
    duration_ms: u64,
    recognition: &RecognitionConfig,
    extractor: &dyn SegmentExtractor,
    recognizer: &dyn SpeechRecognizer,
    cache: &dyn SubtitleCache,
) -> bool {
    let audio = match extractor.extract(source, key.start_ms, duration_ms) {
        Ok(audio) => audio,
        Err(e) => {
            log::warn!("extraction failed for segment {}ms: {e}", key.start_ms);
            return false;
        }
    };

    let text = match recognizer.recognize(&audio, recognition) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("recognition failed for segment {}ms: {e}", key.start_ms);
            return false;
        }
    };

    if let Err(e) = cache.put(key, &text) {
        log::warn!("cache write failed for segment {}ms: {e}", key.start_ms);
        return false;
    }
    true
}
