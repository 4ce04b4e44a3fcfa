use crate::store_trait::{ActivityStore, UserProfile};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use voxnote_core::{StoreConfig, StoreError};

#[derive(Serialize)]
struct ActivityEntry<'a> {
    user_id: i64,
    action: &'a str,
}

/// Activity store speaking PostgREST conventions (Supabase `rest/v1`).
pub struct SupabaseStore {
    http: Client,
    base_url: String,
    /// Service key, sent as both `apikey` and bearer token. Never logged.
    key: String,
}

impl SupabaseStore {
    pub fn new(url: &str, key: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.url, &config.key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, table: &str) -> RequestBuilder {
        self.http
            .post(format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "resolution=merge-duplicates")
    }

    async fn send(&self, table: &str, request: RequestBuilder) -> Result<(), StoreError> {
        let resp = request
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(table, status = status.as_u16(), "store rejected write");
            return Err(StoreError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn record_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        let request = self
            .post("users")
            .query(&[("on_conflict", "id")])
            .json(user);
        self.send("users", request).await?;
        tracing::debug!(user_id = user.id, "user saved");
        Ok(())
    }

    async fn record_action(&self, user_id: i64, action: &str) -> Result<(), StoreError> {
        let request = self
            .post("activity_log")
            .json(&ActivityEntry { user_id, action });
        self.send("activity_log", request).await?;
        tracing::debug!(user_id, action, "activity saved");
        Ok(())
    }
}
