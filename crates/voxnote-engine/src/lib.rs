pub mod cancel;
pub mod engine_trait;
pub mod null_engine;
pub mod registry;
pub mod streaming;
#[cfg(feature = "vosk")]
pub mod vosk_engine;
#[cfg(feature = "whisper")]
pub mod whisper_engine;

pub use cancel::{CancelFlag, CancelGuard};
pub use engine_trait::RecognitionBackend;
pub use null_engine::NullEngine;
pub use registry::PluginRegistry;
pub use streaming::{drive_stream, StreamingDecoder};
#[cfg(feature = "vosk")]
pub use vosk_engine::VoskEngine;
#[cfg(feature = "whisper")]
pub use whisper_engine::WhisperEngine;
