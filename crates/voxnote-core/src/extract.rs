use crate::types::{ContentKind, ExtractedContent, RecognitionMode, RecognitionResult};
use regex::Regex;
use std::sync::LazyLock;

static NON_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]").expect("digit filter pattern is valid"));

/// Turn recognizer output into the content the reply is built from.
///
/// - `FreeText` joins segment texts with a single space, in order.
/// - `DigitsOnly` concatenates the texts and keeps only ASCII digits.
pub fn extract(result: &RecognitionResult, mode: RecognitionMode) -> ExtractedContent {
    match mode {
        RecognitionMode::FreeText => {
            let value = result
                .segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            ExtractedContent::new(ContentKind::FreeText, value)
        }
        RecognitionMode::DigitsOnly => {
            let joined: String = result.segments.iter().map(|s| s.text.as_str()).collect();
            let value = NON_DIGIT.replace_all(&joined, "").into_owned();
            ExtractedContent::new(ContentKind::DigitString, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_text_joins_with_single_space() {
        let result = RecognitionResult::from_texts(["hello", "world"]);
        let content = extract(&result, RecognitionMode::FreeText);
        assert_eq!(content.value(), "hello world");
        assert_eq!(content.kind(), ContentKind::FreeText);
        assert!(!content.is_empty());
    }

    #[test]
    fn test_free_text_preserves_segment_order() {
        let result = RecognitionResult::from_texts(["c", "a", "b", "d"]);
        let content = extract(&result, RecognitionMode::FreeText);
        assert_eq!(content.value(), "c a b d");
    }

    #[test]
    fn test_free_text_does_not_trim_segment_text() {
        // whisper segments usually carry a leading space
        let result = RecognitionResult::from_texts([" Привет", " мир"]);
        let content = extract(&result, RecognitionMode::FreeText);
        assert_eq!(content.value(), " Привет  мир");
    }

    #[test]
    fn test_free_text_zero_segments_is_empty() {
        let content = extract(&RecognitionResult::default(), RecognitionMode::FreeText);
        assert_eq!(content.value(), "");
        assert!(content.is_empty());
    }

    #[test]
    fn test_free_text_single_segment_has_no_separator() {
        let result = RecognitionResult::from_texts(["alone"]);
        assert_eq!(extract(&result, RecognitionMode::FreeText).value(), "alone");
    }

    #[test]
    fn test_digits_only_concatenates_without_separator() {
        let result = RecognitionResult::from_texts(["12", "345"]);
        let content = extract(&result, RecognitionMode::DigitsOnly);
        assert_eq!(content.value(), "12345");
        assert_eq!(content.kind(), ContentKind::DigitString);
    }

    #[test]
    fn test_digits_only_strips_non_digits_in_order() {
        let result = RecognitionResult::from_texts(["код 4-2", " и 7!", "x9"]);
        let content = extract(&result, RecognitionMode::DigitsOnly);
        assert_eq!(content.value(), "4279");
    }

    #[test]
    fn test_digits_only_words_without_digits_is_empty() {
        let result = RecognitionResult::from_texts(["один", "два", "три"]);
        let content = extract(&result, RecognitionMode::DigitsOnly);
        assert_eq!(content.value(), "");
        assert!(content.is_empty());
    }

    #[test]
    fn test_digits_only_ignores_non_ascii_digits() {
        let result = RecognitionResult::from_texts(["١٢٣", "4"]);
        assert_eq!(extract(&result, RecognitionMode::DigitsOnly).value(), "4");
    }

    #[test]
    fn test_digits_only_is_idempotent() {
        for texts in [vec!["a1b2", "c3"], vec!["0 0 7"], vec![], vec!["нет"]] {
            let first = extract(&RecognitionResult::from_texts(texts), RecognitionMode::DigitsOnly);
            let again = extract(
                &RecognitionResult::from_texts([first.value()]),
                RecognitionMode::DigitsOnly,
            );
            assert_eq!(first, again);
        }
    }
}
