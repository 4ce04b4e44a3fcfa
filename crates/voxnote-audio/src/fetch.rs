use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use voxnote_core::{FetchError, VoiceRef};

// ── VoiceNote ─────────────────────────────────────────────────

/// Downloaded voice message backed by a uniquely named transient file.
///
/// The file is removed when the `VoiceNote` is dropped, so every exit path
/// of a pipeline run releases it.
#[derive(Debug)]
pub struct VoiceNote {
    file_ref: String,
    byte_len: u64,
    format: Option<String>,
    artifact: NamedTempFile,
}

impl VoiceNote {
    pub fn write_transient(
        dir: &Path,
        file_ref: &str,
        format: Option<String>,
        bytes: &[u8],
    ) -> Result<Self, FetchError> {
        let suffix = format
            .as_deref()
            .map(|f| format!(".{f}"))
            .unwrap_or_default();
        let mut artifact = tempfile::Builder::new()
            .prefix("voxnote-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        artifact.write_all(bytes)?;
        artifact.flush()?;

        tracing::trace!(
            file_ref = %file_ref,
            path = %artifact.path().display(),
            bytes = bytes.len(),
            "wrote transient artifact"
        );

        Ok(Self {
            file_ref: file_ref.to_string(),
            byte_len: bytes.len() as u64,
            format,
            artifact,
        })
    }

    pub fn file_ref(&self) -> &str {
        &self.file_ref
    }

    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Container/codec tag such as `"ogg"` or `"wav"`, when known.
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn path(&self) -> &Path {
        self.artifact.path()
    }
}

/// Derive a source format tag from a mime type, falling back to the file extension.
pub fn format_tag(mime_type: Option<&str>, file_path: &str) -> Option<String> {
    if let Some(subtype) = mime_type.and_then(|m| m.split('/').nth(1)) {
        let subtype = subtype.split(';').next().unwrap_or(subtype).trim();
        let subtype = subtype.strip_prefix("x-").unwrap_or(subtype);
        let tag = match subtype {
            "mpeg" => "mp3",
            "wave" => "wav",
            other => other,
        };
        if !tag.is_empty() {
            return Some(tag.to_ascii_lowercase());
        }
    }
    Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

// ── AudioFetcher ──────────────────────────────────────────────

/// Resolves a voice reference to local audio bytes.
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    fn name(&self) -> &str;
    /// Retrieve the audio in a single attempt and store it as a transient artifact.
    async fn fetch(&self, voice: &VoiceRef) -> Result<VoiceNote, FetchError>;
}

/// Treats `VoiceRef::file_id` as a path on the local filesystem.
pub struct LocalFileFetcher {
    artifact_dir: PathBuf,
}

impl LocalFileFetcher {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
        }
    }
}

#[async_trait]
impl AudioFetcher for LocalFileFetcher {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch(&self, voice: &VoiceRef) -> Result<VoiceNote, FetchError> {
        let bytes = tokio::fs::read(&voice.file_id).await?;
        let format = format_tag(voice.mime_type.as_deref(), &voice.file_id);
        VoiceNote::write_transient(&self.artifact_dir, &voice.file_id, format, &bytes)
    }
}
