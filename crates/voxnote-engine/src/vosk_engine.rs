use crate::cancel::CancelFlag;
use crate::engine_trait::RecognitionBackend;
use crate::streaming::{drive_stream, StreamingDecoder};
use async_trait::async_trait;
use std::sync::Arc;
use voxnote_core::{AudioBuffer, RecognitionError, RecognitionResult};
use vosk::{DecodingState, Model, Recognizer};

const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Streaming recognizer backed by Vosk, meant for short digit dictation.
///
/// The model is shared read-only; every call creates its own `Recognizer`,
/// which is the only stateful part.
pub struct VoskEngine {
    model: Option<Arc<Model>>,
    chunk_size: usize,
    grammar: Option<Vec<String>>,
}

impl VoskEngine {
    pub fn new() -> Self {
        Self {
            model: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            grammar: None,
        }
    }
}

impl Default for VoskEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct VoskDecoder {
    recognizer: Recognizer,
}

impl StreamingDecoder for VoskDecoder {
    fn accept(&mut self, chunk: &[i16]) -> Result<Option<String>, RecognitionError> {
        match self.recognizer.accept_waveform(chunk) {
            Ok(DecodingState::Finalized) => Ok(self
                .recognizer
                .result()
                .single()
                .map(|r| r.text.to_string())),
            Ok(DecodingState::Running) => Ok(None),
            Ok(DecodingState::Failed) => Err(RecognitionError::ProcessingFailed(
                "vosk decoding failed".to_string(),
            )),
            Err(e) => Err(RecognitionError::ProcessingFailed(format!(
                "vosk rejected waveform: {e}"
            ))),
        }
    }

    fn flush(&mut self) -> Result<Option<String>, RecognitionError> {
        Ok(self
            .recognizer
            .final_result()
            .single()
            .map(|r| r.text.to_string()))
    }
}

#[async_trait]
impl RecognitionBackend for VoskEngine {
    fn name(&self) -> &str {
        "vosk"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), RecognitionError> {
        let model_path = config
            .get("model_path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                RecognitionError::InitializationFailed(
                    "missing 'model_path' in vosk config".to_string(),
                )
            })?
            .to_string();

        if let Some(size) = config.get("chunk_size").and_then(|v| v.as_integer()) {
            if size <= 0 {
                return Err(RecognitionError::InitializationFailed(
                    "'chunk_size' must be > 0".to_string(),
                ));
            }
            self.chunk_size = size as usize;
        }

        self.grammar = match config.get("grammar") {
            None => None,
            Some(value) => Some(parse_grammar(value)?),
        };

        let path = model_path.clone();
        let model = tokio::task::spawn_blocking(move || Model::new(path))
            .await
            .map_err(|e| RecognitionError::InitializationFailed(format!("model load task: {e}")))?
            .ok_or_else(|| {
                RecognitionError::InitializationFailed(format!(
                    "failed to load vosk model '{model_path}'"
                ))
            })?;
        self.model = Some(Arc::new(model));

        tracing::info!(
            model_path = %model_path,
            chunk_size = self.chunk_size,
            grammar = self.grammar.as_ref().map(Vec::len),
            "VoskEngine initialized"
        );
        Ok(())
    }

    async fn recognize(&self, audio: &AudioBuffer) -> Result<RecognitionResult, RecognitionError> {
        let model = self.model.as_ref().map(Arc::clone).ok_or_else(|| {
            RecognitionError::ProcessingFailed("vosk model not loaded".to_string())
        })?;

        if audio.channels != 1 {
            return Err(RecognitionError::ProcessingFailed(format!(
                "vosk needs mono audio, got {} channels",
                audio.channels
            )));
        }

        let pcm = audio.to_pcm16();
        let sample_rate = audio.sample_rate as f32;
        let chunk_size = self.chunk_size;
        let grammar = self.grammar.clone();

        let cancel = CancelFlag::new();
        let _guard = cancel.guard();

        tokio::task::spawn_blocking(move || {
            let recognizer = match grammar {
                Some(ref words) => Recognizer::new_with_grammar(&model, sample_rate, words),
                None => Recognizer::new(&model, sample_rate),
            }
            .ok_or_else(|| {
                RecognitionError::ProcessingFailed("failed to create vosk recognizer".to_string())
            })?;

            let mut decoder = VoskDecoder { recognizer };
            drive_stream(&mut decoder, &pcm, chunk_size, &cancel)
        })
        .await
        .map_err(|e| RecognitionError::ProcessingFailed(format!("vosk task: {e}")))?
    }

    async fn shutdown(&self) -> Result<(), RecognitionError> {
        Ok(())
    }
}

fn parse_grammar(value: &toml::Value) -> Result<Vec<String>, RecognitionError> {
    let invalid =
        || RecognitionError::InitializationFailed("'grammar' must be an array of strings".into());
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vosk_engine_name() {
        assert_eq!(VoskEngine::new().name(), "vosk");
    }

    #[tokio::test]
    async fn test_vosk_engine_initialize_missing_model_path_fails() {
        let mut engine = VoskEngine::new();
        let result = engine
            .initialize(toml::Value::Table(Default::default()))
            .await;
        match result {
            Err(RecognitionError::InitializationFailed(msg)) => {
                assert!(msg.contains("model_path"));
            }
            _ => panic!("expected InitializationFailed"),
        }
    }

    #[tokio::test]
    async fn test_vosk_engine_initialize_missing_model_dir_fails() {
        let mut engine = VoskEngine::new();
        let mut table = toml::map::Map::new();
        table.insert(
            "model_path".to_string(),
            toml::Value::String("/nonexistent/vosk-model".to_string()),
        );
        let result = engine.initialize(toml::Value::Table(table)).await;
        assert!(matches!(result, Err(RecognitionError::InitializationFailed(_))));
    }

    #[tokio::test]
    async fn test_vosk_engine_recognize_before_initialize_fails() {
        let engine = VoskEngine::new();
        let audio = AudioBuffer {
            samples: vec![0.0; 4000],
            sample_rate: 16000,
            channels: 1,
        };
        assert!(engine.recognize(&audio).await.is_err());
    }

    #[tokio::test]
    async fn test_vosk_engine_rejects_non_string_grammar() {
        let mut engine = VoskEngine::new();
        let config: toml::Value = toml::from_str(
            r#"
            model_path = "/nonexistent/vosk-model"
            grammar = ["one", 2, "three"]
            "#,
        )
        .unwrap();
        match engine.initialize(config).await {
            Err(RecognitionError::InitializationFailed(msg)) => assert!(msg.contains("grammar")),
            _ => panic!("expected InitializationFailed"),
        }
        assert!(engine.grammar.is_none());
    }

    #[test]
    fn test_parse_grammar() {
        let words = toml::Value::Array(vec!["один".into(), "два".into()]);
        assert_eq!(parse_grammar(&words).unwrap(), vec!["один", "два"]);
        assert!(parse_grammar(&toml::Value::String("один".into())).is_err());
        assert!(parse_grammar(&toml::Value::Array(vec![toml::Value::Integer(1)])).is_err());
    }

    #[test]
    fn test_vosk_engine_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<VoskEngine>();
    }
}
