use voxnote_core::StoreError;
use voxnote_store::{ActivityStore, SupabaseStore, UserProfile, VOICE_MESSAGE_ACTION};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn alice() -> UserProfile {
    UserProfile {
        id: 777,
        first_name: "Alice".to_string(),
        last_name: Some("Liddell".to_string()),
        username: Some("alice".to_string()),
        language_code: Some("en".to_string()),
        is_premium: true,
    }
}

#[tokio::test]
async fn test_record_user_upserts_on_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(query_param("on_conflict", "id"))
        .and(header("apikey", "service-key"))
        .and(header("Authorization", "Bearer service-key"))
        .and(header("Prefer", "resolution=merge-duplicates"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(serde_json::json!({
            "id": 777,
            "first_name": "Alice",
            "last_name": "Liddell",
            "username": "alice",
            "language_code": "en",
            "is_premium": true
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&server.uri(), "service-key");
    store.record_user(&alice()).await.unwrap();
}

#[tokio::test]
async fn test_record_action_posts_log_entry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/activity_log"))
        .and(header("apikey", "service-key"))
        .and(body_json(serde_json::json!({
            "user_id": 777,
            "action": "voice_message"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&server.uri(), "service-key");
    store
        .record_action(777, VOICE_MESSAGE_ACTION)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_write_maps_to_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&server.uri(), "wrong");
    match store.record_user(&alice()).await {
        Err(StoreError::Status(code)) => assert_eq!(code, 401),
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_store_maps_to_request_error() {
    // nothing listens on port 9 (discard) in the test environment
    let store = SupabaseStore::new("http://127.0.0.1:9", "k");
    assert!(matches!(
        store.record_action(1, VOICE_MESSAGE_ACTION).await,
        Err(StoreError::Request(_))
    ));
}
