use crate::audio::domain::audio_segment::AudioSegment;

/// Language and decoding options for one recognition call.
#[derive(Clone, Debug)]
pub struct RecognitionConfig {
    /// ISO language code, e.g. "en" or "ko".
    pub language: String,
}

impl RecognitionConfig {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self::new("en")
    }
}

/// Turns one audio segment into its transcript text.
///
/// Failures are service-level (model load, inference, network for remote
/// implementations); callers treat them as non-fatal per segment.
pub trait SpeechRecognizer: Send + Sync {
    fn recognize(
        &self,
        audio: &AudioSegment,
        config: &RecognitionConfig,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}
