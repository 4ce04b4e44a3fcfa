//! Bot API payloads, limited to the fields the bot reads or writes.

use serde::{Deserialize, Serialize};
use voxnote_core::VoiceRef;
use voxnote_store::UserProfile;

/// Envelope of every Bot API response: `{ ok, result?, description? }`.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub date: i64,
    pub text: Option<String>,
    pub voice: Option<Voice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    /// Only present for premium users.
    pub is_premium: Option<bool>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            language_code: self.language_code.clone(),
            is_premium: self.is_premium.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
}

/// Voice note attachment (OGG/Opus in practice).
#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    pub file_id: String,
    pub file_unique_id: String,
    /// Seconds, as reported by the sender's client.
    pub duration: u32,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

impl Voice {
    pub fn voice_ref(&self) -> VoiceRef {
        VoiceRef {
            file_id: self.file_id.clone(),
            file_unique_id: Some(self.file_unique_id.clone()),
            duration_secs: Some(self.duration),
            mime_type: self.mime_type.clone(),
            file_size: self.file_size,
        }
    }
}

/// Result of `getFile`. `file_path` is valid for at least one hour.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramFile {
    pub file_id: String,
    pub file_unique_id: Option<String>,
    pub file_size: Option<u64>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}
