use async_trait::async_trait;
use serde::Serialize;
use voxnote_core::StoreError;

/// Action recorded for every handled voice message.
pub const VOICE_MESSAGE_ACTION: &str = "voice_message";

/// Snapshot of the sending user as stored in the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_premium: bool,
}

/// Persistence for who talked to the bot and what they did.
///
/// Callers treat every method as best-effort: errors are logged, never
/// surfaced to the user.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    fn name(&self) -> &str;

    /// Insert the user, or update the existing row with the same `id`.
    async fn record_user(&self, user: &UserProfile) -> Result<(), StoreError>;

    async fn record_action(&self, user_id: i64, action: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn ActivityStore) {}
    }

    #[test]
    fn test_user_profile_serializes_all_columns() {
        let user = UserProfile {
            id: 42,
            first_name: "Ann".to_string(),
            last_name: None,
            username: Some("ann".to_string()),
            language_code: Some("ru".to_string()),
            is_premium: false,
        };
        let value = serde_json::to_value(&user).unwrap();
        let object = value.as_object().unwrap();
        for column in [
            "id",
            "first_name",
            "last_name",
            "username",
            "language_code",
            "is_premium",
        ] {
            assert!(object.contains_key(column), "missing column {column}");
        }
        assert!(object["last_name"].is_null());
        assert_eq!(object["id"], 42);
    }
}
