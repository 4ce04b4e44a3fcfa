use crate::store_trait::{ActivityStore, UserProfile};
use async_trait::async_trait;
use voxnote_core::StoreError;

/// Store used when no `[store]` section is configured.
pub struct NullStore;

#[async_trait]
impl ActivityStore for NullStore {
    fn name(&self) -> &str {
        "null"
    }

    async fn record_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        tracing::trace!(user_id = user.id, "NullStore record_user");
        Ok(())
    }

    async fn record_action(&self, user_id: i64, action: &str) -> Result<(), StoreError> {
        tracing::trace!(user_id, action, "NullStore record_action");
        Ok(())
    }
}
