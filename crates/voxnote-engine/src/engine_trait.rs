use async_trait::async_trait;
use voxnote_core::{AudioBuffer, RecognitionError, RecognitionResult};

/// Backends are created through [`PluginRegistry`](crate::PluginRegistry),
/// loaded once with [`initialize`](Self::initialize) while still exclusively
/// owned, and then shared read-only behind an `Arc` by every pipeline run.
///
/// `recognize` must be safe to call concurrently. Its future may be dropped
/// mid-run when the caller times out; backends that hand work to a blocking
/// thread should stop it through a [`CancelFlag`](crate::CancelFlag) guard.
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    fn name(&self) -> &str;
    async fn initialize(&mut self, config: toml::Value) -> Result<(), RecognitionError>;
    async fn recognize(&self, audio: &AudioBuffer) -> Result<RecognitionResult, RecognitionError>;
    async fn shutdown(&self) -> Result<(), RecognitionError>;
}
