use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use voxnote_audio::{format_tag, AudioFetcher, VoiceNote};
use voxnote_core::{FetchError, VoiceRef};

use crate::client::TelegramClient;

/// Fetches voice notes through `getFile` plus a file download.
pub struct TelegramFetcher {
    client: Arc<TelegramClient>,
    artifact_dir: PathBuf,
}

impl TelegramFetcher {
    pub fn new(client: Arc<TelegramClient>, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            artifact_dir: artifact_dir.into(),
        }
    }
}

#[async_trait]
impl AudioFetcher for TelegramFetcher {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn fetch(&self, voice: &VoiceRef) -> Result<VoiceNote, FetchError> {
        let file = self
            .client
            .get_file(&voice.file_id)
            .await
            .map_err(|e| FetchError::Api(e.to_string()))?;
        let file_path = file
            .file_path
            .ok_or_else(|| FetchError::Api(format!("no file_path for '{}'", voice.file_id)))?;

        let bytes = self.client.download_file(&file_path).await?;
        let format = format_tag(voice.mime_type.as_deref(), &file_path);
        VoiceNote::write_transient(&self.artifact_dir, &voice.file_id, format, &bytes)
    }
}
