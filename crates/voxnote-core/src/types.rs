use serde::Deserialize;
use std::time::Duration;

/// Platform-issued reference to an inbound voice message.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceRef {
    pub file_id: String,
    pub file_unique_id: Option<String>,
    pub duration_secs: Option<u32>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

impl VoiceRef {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            file_unique_id: None,
            duration_secs: None,
            mime_type: None,
            file_size: None,
        }
    }
}

/// Sample format the recognition backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub max_duration_ms: Option<u64>,
}

impl TargetSpec {
    pub fn max_frames(&self) -> Option<usize> {
        self.max_duration_ms
            .map(|ms| Self::frames_for_duration(self.sample_rate_hz, ms))
    }

    /// Frames covered by `ms` at `sample_rate_hz`, saturating at `usize::MAX`.
    pub fn frames_for_duration(sample_rate_hz: u32, ms: u64) -> usize {
        let frames = u64::from(sample_rate_hz).saturating_mul(ms) / 1000;
        usize::try_from(frames).unwrap_or(usize::MAX)
    }
}

/// Normalized PCM audio, interleaved when `channels > 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Signed 16-bit copy of the samples, clamped to `[-1.0, 1.0]` first.
    pub fn to_pcm16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub confidence: Option<f32>,
}

impl Segment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }
}

/// Ordered recognizer output for one voice message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionResult {
    pub segments: Vec<Segment>,
}

impl RecognitionResult {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: texts.into_iter().map(Segment::new).collect(),
        }
    }

    pub fn push(&mut self, text: impl Into<String>) {
        self.segments.push(Segment::new(text));
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionMode {
    #[default]
    FreeText,
    DigitsOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    FreeText,
    DigitString,
}

/// Post-processed recognizer output.
///
/// `empty` is derived from `value` at construction and is what the reply
/// formatter branches on.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    kind: ContentKind,
    value: String,
    empty: bool,
}

impl ExtractedContent {
    pub fn new(kind: ContentKind, value: String) -> Self {
        let empty = value.is_empty();
        Self { kind, value, empty }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }
}
