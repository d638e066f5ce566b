/// Length of each transcribed audio slice, also the rounding modulus for
/// cache keys and caption due times.
pub const DEFAULT_SEGMENT_DURATION_MS: u64 = 3_500;

/// Sample rate the extractor emits; whisper.cpp expects 16 kHz input.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

pub const DEFAULT_CHANNELS: u16 = 1;

/// Width of one displayed caption line, in characters.
pub const CAPTION_CHUNK_CHARS: usize = 30;

pub const CAPTION_QUEUE_CAPACITY: usize = 3;

/// How long the last caption stays visible after playback ends.
pub const CAPTION_CLEAR_DELAY_MS: u64 = 3_000;

pub const WHISPER_MODEL_NAME: &str = "ggml-tiny.bin";
pub const WHISPER_MODEL_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.bin";
