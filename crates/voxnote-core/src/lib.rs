pub mod config;
pub mod error;
pub mod extract;
pub mod reply;
pub mod types;

pub use config::{
    AppConfig, AudioConfig, RecognitionConfig, ReplyConfig, StoreConfig, TelegramConfig,
    VoskConfig, WhisperConfig,
};
pub use error::{
    ConfigError, DecodeError, FetchError, PipelineError, RecognitionError, StoreError,
    TransportError,
};
pub use extract::extract;
pub use reply::ReplyFormatter;
pub use types::{
    AudioBuffer, ContentKind, ExtractedContent, RecognitionMode, RecognitionResult, Segment,
    TargetSpec, VoiceRef,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_then_format_scenario_digits_not_recognized() {
        let result = RecognitionResult::from_texts(["один", "два", "три"]);
        let content = extract(&result, RecognitionMode::DigitsOnly);
        assert!(content.is_empty());
        let formatter = ReplyFormatter::default();
        assert_eq!(formatter.format(&content), formatter.not_recognized());
    }

    #[test]
    fn test_voice_ref_new_defaults() {
        let voice = VoiceRef::new("AwACAgIAAxkBAAIB");
        assert_eq!(voice.file_id, "AwACAgIAAxkBAAIB");
        assert!(voice.mime_type.is_none());
        assert!(voice.file_size.is_none());
    }
}
