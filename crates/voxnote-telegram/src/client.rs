//! Typed wrapper over the handful of Bot API methods the bot needs.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use voxnote_core::{FetchError, TransportError};

use crate::types::{Message, SendMessageRequest, TelegramFile, TelegramResponse, Update};

/// Slack added on top of the long-poll timeout before the HTTP request gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

pub struct TelegramClient {
    http: Client,
    /// `{api_url}/bot{token}`
    base_url: String,
    /// `{api_url}/file/bot{token}`
    file_url: String,
}

impl TelegramClient {
    pub fn new(token: &str, api_url: &str) -> Self {
        let api_url = api_url.trim_end_matches('/');
        Self {
            http: Client::new(),
            base_url: format!("{api_url}/bot{token}"),
            file_url: format!("{api_url}/file/bot{token}"),
        }
    }

    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TransportError> {
        let mut request = self
            .http
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[("timeout", timeout_secs)])
            .timeout(Duration::from_secs(timeout_secs) + POLL_GRACE);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }

        let updates: Vec<Update> = self.call(request).await?;
        if !updates.is_empty() {
            tracing::debug!(count = updates.len(), "received updates");
        }
        Ok(updates)
    }

    /// Acknowledge everything queued so far and return the offset to poll from.
    ///
    /// Returns `None` when nothing was pending.
    pub async fn drop_pending_updates(&self) -> Result<Option<i64>, TransportError> {
        let request = self
            .http
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[("offset", -1i64), ("timeout", 0)]);
        let updates: Vec<Update> = self.call(request).await?;
        let next = updates.last().map(|u| u.update_id + 1);
        if let Some(offset) = next {
            tracing::info!(offset, "skipped pending updates");
        }
        Ok(next)
    }

    pub async fn get_file(&self, file_id: &str) -> Result<TelegramFile, TransportError> {
        let request = self
            .http
            .get(format!("{}/getFile", self.base_url))
            .query(&[("file_id", file_id)]);
        self.call(request).await
    }

    /// Download the raw bytes behind a `file_path` returned by [`get_file`](Self::get_file).
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .http
            .get(format!("{}/{file_path}", self.file_url))
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        tracing::trace!(file_path, bytes = bytes.len(), "downloaded file");
        Ok(bytes.to_vec())
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<Message, TransportError> {
        let request = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .json(&SendMessageRequest {
                chat_id,
                text,
                reply_to_message_id: reply_to,
            });
        tracing::debug!(chat_id, reply_to = ?reply_to, "sending message");
        self.call(request).await
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, TransportError> {
        let resp = request
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        // error statuses still carry the JSON envelope
        let body: TelegramResponse<T> = resp
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;

        if !body.ok {
            let desc = body.description.unwrap_or_else(|| "unknown error".into());
            return Err(TransportError::Api(desc));
        }

        body.result
            .ok_or_else(|| TransportError::Decode("missing result in response".into()))
    }
}
