use std::path::PathBuf;
use std::process;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use clap::Parser;

use rollcap_core::cache::domain::subtitle_cache::SubtitleCache;
use rollcap_core::cache::infrastructure::fs_subtitle_cache::FsSubtitleCache;
use rollcap_core::extraction::infrastructure::ffmpeg_segment_extractor::FfmpegSegmentExtractor;
use rollcap_core::extraction::infrastructure::media_probe;
use rollcap_core::pipeline::preload_subtitles_use_case::{
    PreloadSubtitlesUseCase, DEFAULT_WORKER_COUNT,
};
use rollcap_core::playback::domain::caption_renderer::CaptionRenderer;
use rollcap_core::playback::domain::playback_clock::PlaybackClock;
use rollcap_core::playback::synchronizer::{PlaybackSynchronizer, SynchronizerConfig};
use rollcap_core::shared::constants::{
    DEFAULT_SAMPLE_RATE, DEFAULT_SEGMENT_DURATION_MS, WHISPER_MODEL_NAME, WHISPER_MODEL_URL,
};
use rollcap_core::shared::source_identity::{SegmentKey, SourceIdentity};
use rollcap_core::shared::timing::format_timestamp;
use rollcap_core::transcription::domain::speech_recognizer::RecognitionConfig;
use rollcap_core::transcription::infrastructure::model_resolver;
use rollcap_core::transcription::infrastructure::whisper_recognizer::WhisperRecognizer;

/// Rolling caption transcription and playback for media files.
#[derive(Parser)]
#[command(name = "rollcap")]
struct Cli {
    /// Input media file (any container with an audio track).
    input: PathBuf,

    /// Recognition language code (e.g. en, ko, de).
    #[arg(long, default_value = "en")]
    language: String,

    /// Segment length in milliseconds.
    #[arg(long, default_value_t = DEFAULT_SEGMENT_DURATION_MS)]
    segment_duration_ms: u64,

    /// Subtitle cache directory (defaults to the platform cache dir).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Path to a ggml Whisper model (downloaded to the cache if omitted).
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Sample rate the audio is resampled to before recognition.
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    /// Transcription worker threads.
    #[arg(long, default_value_t = DEFAULT_WORKER_COUNT)]
    workers: usize,

    /// Replay the cached captions against a simulated clock after preload.
    #[arg(long)]
    play: bool,

    /// Print every cached transcript with its timestamp after preload.
    #[arg(long)]
    dump: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let model_path = resolve_model(&cli)?;
    let recognizer = Arc::new(
        WhisperRecognizer::new(&model_path).map_err(|e| -> Box<dyn std::error::Error> { e })?,
    );
    let extractor = Arc::new(FfmpegSegmentExtractor::with_output_format(
        cli.sample_rate,
        1,
    ));
    let cache: Arc<FsSubtitleCache> = Arc::new(match &cli.cache_dir {
        Some(dir) => FsSubtitleCache::new(dir.clone()),
        None => FsSubtitleCache::new(FsSubtitleCache::default_root()?),
    });

    let duration_ms = media_probe::probe_duration_ms(&cli.input)?
        .ok_or_else(|| format!("Could not determine duration of {}", cli.input.display()))?;
    log::info!(
        "Source duration {} ({duration_ms}ms), segment length {}ms",
        format_timestamp(duration_ms),
        cli.segment_duration_ms
    );

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|done, total| {
        eprint!("\rTranscribing segment {done}/{total}");
        true
    });

    let use_case = PreloadSubtitlesUseCase::new(
        extractor,
        recognizer,
        cache.clone(),
        RecognitionConfig {
            language: cli.language.clone(),
        },
        cli.segment_duration_ms,
        cli.workers,
        Some(progress),
        Arc::new(AtomicBool::new(false)),
    );
    let report = use_case.run(&cli.input, duration_ms)?;
    eprintln!();
    log::info!(
        "Preload done: {} segments ({} cached, {} transcribed, {} failed)",
        report.total,
        report.skipped,
        report.transcribed,
        report.failed
    );

    if cli.dump {
        dump_transcripts(&cli, cache.as_ref(), duration_ms)?;
    } else if cli.play {
        play_captions(&cli, cache, duration_ms);
    }

    Ok(())
}

fn dump_transcripts(
    cli: &Cli,
    cache: &dyn SubtitleCache,
    duration_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let identity = SourceIdentity::from_locator(&cli.input.to_string_lossy());
    for start_ms in (0..duration_ms).step_by(cli.segment_duration_ms as usize) {
        let key = SegmentKey::new(identity.clone(), start_ms);
        if let Some(text) = cache.get(&key)? {
            println!("[{}] {}", format_timestamp(start_ms), text);
        }
    }
    Ok(())
}

/// Replays the cached captions in real time: a wall-clock backed
/// [`PlaybackClock`] stands in for an external player and a stdout
/// renderer stands in for its caption surface.
fn play_captions(cli: &Cli, cache: Arc<dyn SubtitleCache>, duration_ms: u64) {
    let identity = SourceIdentity::from_locator(&cli.input.to_string_lossy());
    let config = SynchronizerConfig {
        segment_duration_ms: cli.segment_duration_ms,
        ..SynchronizerConfig::default()
    };
    let clear_delay_ms = config.clear_delay_ms;

    let handle = PlaybackSynchronizer::spawn(
        cache,
        identity,
        Box::new(WallClock::started_now()),
        Box::new(StdoutRenderer),
        config,
    );

    handle.playing_changed(true);
    sleep(Duration::from_millis(duration_ms));
    handle.ended();
    sleep(Duration::from_millis(clear_delay_ms + 100));
    drop(handle);
}

struct WallClock {
    started: Instant,
}

impl WallClock {
    fn started_now() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl PlaybackClock for WallClock {
    fn position_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

struct StdoutRenderer;

impl CaptionRenderer for StdoutRenderer {
    fn set_cues(&mut self, lines: &[String]) {
        // Clear-and-redraw keeps the rolling window readable in a plain
        // terminal without cursor addressing.
        print!("\x1b[2J\x1b[H");
        for line in lines {
            println!("{line}");
        }
    }

    fn clear(&mut self) {
        print!("\x1b[2J\x1b[H");
    }
}

fn resolve_model(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.model_path {
        if !path.exists() {
            return Err(format!("Model file not found: {}", path.display()).into());
        }
        return Ok(path.clone());
    }

    log::info!("Resolving model: {WHISPER_MODEL_NAME}");
    let path = model_resolver::resolve(
        WHISPER_MODEL_NAME,
        WHISPER_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();
    Ok(path)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if cli.segment_duration_ms == 0 {
        return Err("Segment duration must be a positive number of milliseconds".into());
    }
    if cli.sample_rate == 0 {
        return Err("Sample rate must be positive".into());
    }
    if cli.workers == 0 {
        return Err("Worker count must be positive".into());
    }
    if cli.play && cli.dump {
        return Err("--play and --dump are mutually exclusive".into());
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading recognition model... {pct}%");
    } else {
        eprint!("\rDownloading recognition model... {downloaded} bytes");
    }
}
