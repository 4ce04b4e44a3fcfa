use crate::cancel::CancelFlag;
use crate::engine_trait::RecognitionBackend;
use async_trait::async_trait;
use std::sync::Arc;
use voxnote_core::{AudioBuffer, RecognitionError, RecognitionResult};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

const DEFAULT_BEAM_WIDTH: i32 = 5;
const WHISPER_SAMPLE_RATE: u32 = 16000;

/// Neural transcriber backed by whisper.cpp.
///
/// The context holds the model weights and is shared across calls; each call
/// builds its own decoding state, so concurrent `recognize` calls do not
/// need a lock.
pub struct WhisperEngine {
    context: Option<Arc<WhisperContext>>,
    beam_width: i32,
    language: Option<String>,
    threads: Option<i32>,
}

impl WhisperEngine {
    pub fn new() -> Self {
        Self {
            context: None,
            beam_width: DEFAULT_BEAM_WIDTH,
            language: None,
            threads: None,
        }
    }
}

impl Default for WhisperEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecognitionBackend for WhisperEngine {
    fn name(&self) -> &str {
        "whisper"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), RecognitionError> {
        let model_path = config
            .get("model_path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                RecognitionError::InitializationFailed(
                    "missing 'model_path' in whisper config".to_string(),
                )
            })?
            .to_string();

        if let Some(width) = config.get("beam_width").and_then(|v| v.as_integer()) {
            if width <= 0 {
                return Err(RecognitionError::InitializationFailed(
                    "'beam_width' must be > 0".to_string(),
                ));
            }
            self.beam_width = width as i32;
        }

        self.language = config
            .get("language")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        self.threads = config
            .get("threads")
            .and_then(|v| v.as_integer())
            .map(|n| n as i32);

        let path = model_path.clone();
        let context = tokio::task::spawn_blocking(move || {
            WhisperContext::new_with_params(&path, WhisperContextParameters::default())
        })
        .await
        .map_err(|e| RecognitionError::InitializationFailed(format!("model load task: {e}")))?
        .map_err(|e| {
            RecognitionError::InitializationFailed(format!(
                "failed to load whisper model '{model_path}': {e}"
            ))
        })?;
        self.context = Some(Arc::new(context));

        tracing::info!(
            model_path = %model_path,
            beam_width = self.beam_width,
            language = ?self.language,
            "WhisperEngine initialized"
        );
        Ok(())
    }

    async fn recognize(&self, audio: &AudioBuffer) -> Result<RecognitionResult, RecognitionError> {
        let context = self.context.as_ref().map(Arc::clone).ok_or_else(|| {
            RecognitionError::ProcessingFailed("whisper model not loaded".to_string())
        })?;

        if audio.sample_rate != WHISPER_SAMPLE_RATE || audio.channels != 1 {
            return Err(RecognitionError::ProcessingFailed(format!(
                "whisper needs {WHISPER_SAMPLE_RATE} Hz mono, got {} Hz / {} ch",
                audio.sample_rate, audio.channels
            )));
        }

        let samples = audio.samples.clone();
        let beam_size = self.beam_width;
        let language = self.language.clone();
        let threads = self.threads;

        let cancel = CancelFlag::new();
        let _guard = cancel.guard();
        let abort = cancel.clone();

        tokio::task::spawn_blocking(move || {
            let mut state = context.create_state().map_err(|e| {
                RecognitionError::ProcessingFailed(format!("create state: {e}"))
            })?;

            let mut params = FullParams::new(SamplingStrategy::BeamSearch {
                beam_size,
                patience: -1.0,
            });
            params.set_language(Some(language.as_deref().unwrap_or("auto")));
            if let Some(n) = threads {
                params.set_n_threads(n);
            }
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_special(false);
            params.set_print_timestamps(false);
            params.set_abort_callback_safe(move || abort.is_cancelled());

            let outcome = state.full(params, &samples);
            if cancel.is_cancelled() {
                return Err(RecognitionError::Cancelled);
            }
            outcome.map_err(|e| RecognitionError::ProcessingFailed(format!("inference: {e}")))?;

            let n_segments = state
                .full_n_segments()
                .map_err(|e| RecognitionError::ProcessingFailed(format!("segments: {e}")))?;

            let mut result = RecognitionResult::default();
            for i in 0..n_segments {
                let text = state.full_get_segment_text(i).map_err(|e| {
                    RecognitionError::ProcessingFailed(format!("segment {i}: {e}"))
                })?;
                result.push(text);
            }
            Ok(result)
        })
        .await
        .map_err(|e| RecognitionError::ProcessingFailed(format!("whisper task: {e}")))?
    }

    async fn shutdown(&self) -> Result<(), RecognitionError> {
        Ok(())
    }
}
