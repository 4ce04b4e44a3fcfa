use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("platform API error: {0}")]
    Api(String),

    #[error("download request failed: {0}")]
    Request(String),

    #[error("download returned HTTP status {0}")]
    Status(u16),

    #[error("failed to write transient artifact: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported audio input: {0}")]
    Unsupported(String),

    #[error("malformed audio input: {0}")]
    Malformed(String),

    #[error("transcoding failed: {0}")]
    Transcode(String),

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("no audio samples decoded")]
    Empty,

    #[error("failed to read transient artifact: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognition backend initialization failed: {0}")]
    InitializationFailed(String),

    #[error("recognition failed: {0}")]
    ProcessingFailed(String),

    #[error("recognition engine not found: {0}")]
    EngineNotFound(String),

    #[error("recognition timed out after {0:?}")]
    Timeout(Duration),

    #[error("recognition cancelled")]
    Cancelled,
}

/// A failure in one stage of a single voice-message pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch stage: {0}")]
    Fetch(#[from] FetchError),

    #[error("decode stage: {0}")]
    Decode(#[from] DecodeError),

    #[error("recognition stage: {0}")]
    Recognition(#[from] RecognitionError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),

    #[error("store returned HTTP status {0}")]
    Status(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_wraps_stage_errors() {
        let err: PipelineError = FetchError::Status(404).into();
        assert!(matches!(err, PipelineError::Fetch(FetchError::Status(404))));
        assert!(err.to_string().contains("404"));

        let err: PipelineError = DecodeError::Empty.into();
        assert!(err.to_string().starts_with("decode stage"));

        let err: PipelineError = RecognitionError::Timeout(Duration::from_secs(3)).into();
        assert!(err.to_string().contains("timed out"));
    }
}
