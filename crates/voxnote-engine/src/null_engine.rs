use crate::engine_trait::RecognitionBackend;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use voxnote_core::{AudioBuffer, RecognitionError, RecognitionResult};

/// Backend without a model: replays the `segments` from its config.
///
/// Optional keys: `delay_ms` (sleep before answering) and `fail` (always
/// return a processing error).
pub struct NullEngine {
    segments: Vec<String>,
    delay: Option<Duration>,
    fail: bool,
    call_count: AtomicUsize,
}

impl NullEngine {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            delay: None,
            fail: false,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Default for NullEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecognitionBackend for NullEngine {
    fn name(&self) -> &str {
        "null"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), RecognitionError> {
        if let Some(segments) = config.get("segments") {
            let items = segments.as_array().ok_or_else(|| {
                RecognitionError::InitializationFailed(
                    "'segments' must be an array of strings".to_string(),
                )
            })?;
            self.segments = items
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        RecognitionError::InitializationFailed(
                            "'segments' must be an array of strings".to_string(),
                        )
                    })
                })
                .collect::<Result<_, _>>()?;
        }

        self.delay = config
            .get("delay_ms")
            .and_then(|v| v.as_integer())
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms as u64));

        self.fail = config
            .get("fail")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        tracing::debug!(segments = self.segments.len(), "NullEngine initialized");
        Ok(())
    }

    async fn recognize(&self, audio: &AudioBuffer) -> Result<RecognitionResult, RecognitionError> {
        let count = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!("NullEngine call #{count}, {} samples", audio.samples.len());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(RecognitionError::ProcessingFailed(
                "null engine configured to fail".to_string(),
            ));
        }
        Ok(RecognitionResult::from_texts(self.segments.iter().cloned()))
    }

    async fn shutdown(&self) -> Result<(), RecognitionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> AudioBuffer {
        AudioBuffer {
            samples: vec![0.0; 1600],
            sample_rate: 16000,
            channels: 1,
        }
    }

    fn config(toml_str: &str) -> toml::Value {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_null_engine_name() {
        assert_eq!(NullEngine::new().name(), "null");
    }

    #[tokio::test]
    async fn test_null_engine_default_returns_no_segments() {
        let mut engine = NullEngine::new();
        engine
            .initialize(toml::Value::Table(Default::default()))
            .await
            .unwrap();
        let result = engine.recognize(&buffer()).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn test_null_engine_replays_segments_in_order() {
        let mut engine = NullEngine::new();
        engine
            .initialize(config(r#"segments = ["hello", "world"]"#))
            .await
            .unwrap();
        let result = engine.recognize(&buffer()).await.unwrap();
        assert_eq!(result, RecognitionResult::from_texts(["hello", "world"]));
    }

    #[tokio::test]
    async fn test_null_engine_rejects_non_string_segments() {
        let mut engine = NullEngine::new();
        let result = engine.initialize(config("segments = [1, 2]")).await;
        assert!(matches!(result, Err(RecognitionError::InitializationFailed(_))));
    }

    #[tokio::test]
    async fn test_null_engine_fail_flag() {
        let mut engine = NullEngine::new();
        engine.initialize(config("fail = true")).await.unwrap();
        let result = engine.recognize(&buffer()).await;
        assert!(matches!(result, Err(RecognitionError::ProcessingFailed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_null_engine_delay() {
        let mut engine = NullEngine::new();
        engine.initialize(config("delay_ms = 500")).await.unwrap();
        let start = tokio::time::Instant::now();
        engine.recognize(&buffer()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_null_engine_shutdown_succeeds() {
        assert!(NullEngine::new().shutdown().await.is_ok());
    }

    #[test]
    fn test_null_engine_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullEngine>();
    }
}
