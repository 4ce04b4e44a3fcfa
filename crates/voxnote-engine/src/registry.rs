use crate::engine_trait::RecognitionBackend;
use std::collections::HashMap;
use std::sync::Arc;
use voxnote_core::RecognitionError;

pub struct PluginRegistry {
    factories: HashMap<String, fn() -> Box<dyn RecognitionBackend>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("null", || Box::new(crate::null_engine::NullEngine::new()));
        #[cfg(feature = "whisper")]
        registry.register("whisper", || {
            Box::new(crate::whisper_engine::WhisperEngine::new())
        });
        #[cfg(feature = "vosk")]
        registry.register("vosk", || Box::new(crate::vosk_engine::VoskEngine::new()));
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn RecognitionBackend>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn RecognitionBackend>, RecognitionError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| RecognitionError::EngineNotFound(name.to_string()))
    }

    /// Create and initialize a backend, returning the shared read-only handle.
    ///
    /// This is where the model gets loaded; call it once per process.
    pub async fn load(
        &self,
        name: &str,
        config: toml::Value,
    ) -> Result<Arc<dyn RecognitionBackend>, RecognitionError> {
        let mut backend = self.create(name)?;
        backend.initialize(config).await?;
        Ok(Arc::from(backend))
    }

    pub fn list_engines(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullEngine;
    use voxnote_core::AudioBuffer;

    #[test]
    fn test_registry_new_has_null_engine() {
        let registry = PluginRegistry::new();
        assert!(registry.create("null").is_ok());
    }

    #[test]
    fn test_registry_create_null_returns_correct_name() {
        let registry = PluginRegistry::new();
        let engine = registry.create("null").unwrap();
        assert_eq!(engine.name(), "null");
    }

    #[test]
    fn test_registry_create_unknown_returns_error() {
        let registry = PluginRegistry::new();
        match registry.create("nope") {
            Err(RecognitionError::EngineNotFound(name)) => assert_eq!(name, "nope"),
            _ => panic!("expected EngineNotFound error"),
        }
    }

    #[test]
    fn test_registry_register_custom_engine() {
        let mut registry = PluginRegistry::new();
        registry.register("custom", || Box::new(NullEngine::new()));
        let engine = registry.create("custom").unwrap();
        // NullEngine is used as the factory, so name is still "null"
        assert_eq!(engine.name(), "null");
    }

    #[test]
    fn test_registry_list_engines_includes_null() {
        let registry = PluginRegistry::new();
        assert!(registry.list_engines().contains(&"null"));
    }

    #[cfg(feature = "whisper")]
    #[test]
    fn test_registry_has_whisper_with_feature() {
        assert!(PluginRegistry::new().list_engines().contains(&"whisper"));
    }

    #[cfg(feature = "vosk")]
    #[test]
    fn test_registry_has_vosk_with_feature() {
        assert!(PluginRegistry::new().list_engines().contains(&"vosk"));
    }

    #[tokio::test]
    async fn test_registry_load_initializes_backend() {
        let registry = PluginRegistry::new();
        let config: toml::Value = toml::from_str(r#"segments = ["42"]"#).unwrap();
        let backend = registry.load("null", config).await.unwrap();
        let audio = AudioBuffer {
            samples: vec![0.0; 16],
            sample_rate: 16000,
            channels: 1,
        };
        let result = backend.recognize(&audio).await.unwrap();
        assert_eq!(result.segments[0].text, "42");
    }

    #[tokio::test]
    async fn test_registry_load_propagates_init_error() {
        let registry = PluginRegistry::new();
        let config: toml::Value = toml::from_str("segments = 5").unwrap();
        let result = registry.load("null", config).await;
        assert!(matches!(result, Err(RecognitionError::InitializationFailed(_))));
    }

    #[tokio::test]
    async fn test_registry_load_unknown_engine() {
        let registry = PluginRegistry::new();
        let result = registry
            .load("whisperx", toml::Value::Table(Default::default()))
            .await;
        assert!(matches!(result, Err(RecognitionError::EngineNotFound(_))));
    }
}
