use std::path::{Path, PathBuf};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::transcription::domain::speech_recognizer::{RecognitionConfig, SpeechRecognizer};

type RecognizeError = Box<dyn std::error::Error + Send + Sync>;

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// Expects 16 kHz input; stereo segments are downmixed to mono before
/// inference.
#[derive(Debug)]
pub struct WhisperRecognizer {
    model_path: PathBuf,
}

impl WhisperRecognizer {
    pub fn new(model_path: &Path) -> Result<Self, RecognizeError> {
        if !model_path.exists() {
            return Err(format!("Whisper model not found at: {}", model_path.display()).into());
        }
        Ok(Self {
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn recognize(
        &self,
        audio: &AudioSegment,
        config: &RecognitionConfig,
    ) -> Result<String, RecognizeError> {
        if audio.is_empty() {
            return Ok(String::new());
        }

        let ctx = WhisperContext::new_with_params(
            self.model_path.to_str().ok_or("Invalid model path")?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| format!("Failed to load Whisper model: {e}"))?;

        let mut state = ctx
            .create_state()
            .map_err(|e| format!("Failed to create Whisper state: {e}"))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 0 });
        params.set_language(Some(&config.language));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(num_cpus().min(4) as i32);

        let samples = to_mono_f32(audio);
        state
            .full(params, &samples)
            .map_err(|e| format!("Whisper inference failed: {e}"))?;

        let mut text = String::new();
        let num_segments = state.full_n_segments();

        for seg_idx in 0..num_segments {
            let segment = match state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };

            let n_tokens = segment.n_tokens();
            for tok_idx in 0..n_tokens {
                let token = match segment.get_token(tok_idx) {
                    Some(t) => t,
                    None => continue,
                };

                let token_text = match token.to_str() {
                    Ok(t) => t,
                    Err(_) => continue,
                };

                // Skip special tokens ([_BEG_], <|endoftext|>, ...).
                let trimmed = token_text.trim();
                if trimmed.is_empty() || trimmed.starts_with('[') || trimmed.starts_with('<') {
                    continue;
                }

                text.push_str(token_text);
            }
        }

        Ok(text.trim().to_string())
    }
}

/// Convert interleaved i16 to normalized f32, averaging stereo pairs.
fn to_mono_f32(audio: &AudioSegment) -> Vec<f32> {
    let samples = audio.samples();
    if audio.channels() <= 1 {
        return samples.iter().map(|s| f32::from(*s) / 32768.0).collect();
    }
    let channels = usize::from(audio.channels());
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|s| f32::from(*s)).sum();
            sum / (channels as f32 * 32768.0)
        })
        .collect()
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_nonexistent_path_returns_error() {
        let result = WhisperRecognizer::new(Path::new("/nonexistent/model.bin"));
        assert!(result.is_err());
    }

    #[test]
    fn test_new_nonexistent_path_error_message() {
        let result = WhisperRecognizer::new(Path::new("/nonexistent/model.bin"));
        let err = result.unwrap_err().to_string();
        assert!(
            err.contains("not found"),
            "Expected 'not found' in error, got: {err}"
        );
    }

    #[test]
    fn test_to_mono_f32_mono_passthrough() {
        let audio = AudioSegment::new(vec![0, 16384, -16384], 16000, 1);
        let out = to_mono_f32(&audio);
        assert_eq!(out.len(), 3);
        assert_relative_eq!(out[1], 0.5, epsilon = 1e-4);
        assert_relative_eq!(out[2], -0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_to_mono_f32_stereo_downmix() {
        let audio = AudioSegment::new(vec![16384, -16384, 8192, 8192], 16000, 2);
        let out = to_mono_f32(&audio);
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0], 0.0, epsilon = 1e-4);
        assert_relative_eq!(out[1], 0.25, epsilon = 1e-4);
    }

    #[test]
    #[ignore] // Requires whisper model file
    fn test_recognize_does_not_crash_on_sine_wave() {
        let model_path = crate::transcription::infrastructure::model_resolver::resolve(
            crate::shared::constants::WHISPER_MODEL_NAME,
            crate::shared::constants::WHISPER_MODEL_URL,
            None,
            None,
        )
        .expect("Failed to resolve whisper model");

        let recognizer = WhisperRecognizer::new(&model_path).expect("Failed to create recognizer");

        let sample_rate = 16000u32;
        let len = (3.0 * sample_rate as f64) as usize;
        let samples: Vec<i16> = (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                ((2.0 * std::f64::consts::PI * 440.0 * t).sin() * 8000.0) as i16
            })
            .collect();
        let audio = AudioSegment::new(samples, sample_rate, 1);

        let result = recognizer.recognize(&audio, &RecognitionConfig::default());
        assert!(result.is_ok(), "Recognition should not error: {result:?}");
    }
}
