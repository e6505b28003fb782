#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Session lifecycle tests: restore, login, logout and forced logout.
//!
//! Storage is an `Arc<MemoryStorage>` shared with the store so each test can
//! check exactly what was persisted or cleared.

mod common;

use std::sync::Arc;

use goose_tap_client::protocol::Role;
use goose_tap_client::storage::{TOKEN_KEY, USER_KEY};
use goose_tap_client::{
    ApiClient, ClientConfig, GooseError, MemoryStorage, Method, RoundEvent, RoundWatcher,
    SessionState, SessionStorage, SessionStore, StopReason,
};

use common::{detail_json, round_id, round_path, token_json, user_json, MockTransport};

fn store_with(mock: &MockTransport, storage: Arc<MemoryStorage>) -> SessionStore {
    SessionStore::with_shared_storage(ApiClient::new(mock.clone()), storage)
}

fn persisted(token: &str, user: Option<&str>) -> Arc<MemoryStorage> {
    let mut values = vec![(TOKEN_KEY, token.to_string())];
    if let Some(user) = user {
        values.push((USER_KEY, user.to_string()));
    }
    Arc::new(MemoryStorage::with_values(values))
}

// ════════════════════════════════════════════════════════════════════
// Restore
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn restore_without_token_stays_unauthenticated() {
    let mock = MockTransport::new();
    let store = store_with(&mock, Arc::new(MemoryStorage::new()));

    assert_eq!(store.restore().await, SessionState::Unauthenticated);
    assert!(mock.requests.lock().unwrap().is_empty(), "no request without a token");
}

#[tokio::test]
async fn restore_shows_cached_user_then_validates() {
    let mock = MockTransport::new();
    mock.respond(Method::Get, "/auth/me", 200, user_json("alice", "ADMIN"));
    let storage = persisted("tok-1", Some(&user_json("alice", "SURVIVOR")));
    let store = store_with(&mock, Arc::clone(&storage));

    let mut states = store.subscribe();
    let state = store.restore().await;

    let user = state.user().expect("authenticated after validation").clone();
    assert_eq!(user.username, "alice");
    assert_eq!(user.role, Role::Admin, "validated profile replaces the cached one");

    // The watch channel saw the cached user before validation finished.
    assert!(states.has_changed().unwrap());
    assert!(store.is_authenticated());

    let me = mock.requests_to(Method::Get, "/auth/me");
    assert_eq!(me.len(), 1);
    assert_eq!(me[0].bearer_token.as_deref(), Some("tok-1"));

    let saved = storage.get(USER_KEY).unwrap().unwrap();
    assert!(saved.contains("ADMIN"), "validated user is persisted: {saved}");
}

#[tokio::test]
async fn restore_without_cached_user_is_loading_until_validated() {
    let mock = MockTransport::new();
    mock.respond(Method::Get, "/auth/me", 200, user_json("bob", "SURVIVOR"));
    mock.delay(Method::Get, "/auth/me", std::time::Duration::from_millis(100));
    let store = Arc::new(store_with(&mock, persisted("tok-2", None)));

    let task = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.restore().await })
    };
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
    assert_eq!(store.state(), SessionState::Loading);

    let state = task.await.unwrap();
    assert_eq!(state.user().map(|u| u.username.as_str()), Some("bob"));
}

#[tokio::test]
async fn rejected_token_logs_out_and_clears_storage() {
    let mock = MockTransport::new();
    mock.respond(Method::Get, "/auth/me", 401, r#"{"message":"Unauthorized"}"#);
    mock.respond(Method::Post, "/auth/logout", 200, "{}");
    let storage = persisted("stale", Some(&user_json("alice", "SURVIVOR")));
    let store = store_with(&mock, Arc::clone(&storage));

    assert_eq!(store.restore().await, SessionState::Unauthenticated);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
    assert!(!store.api().has_token().await);
    assert_eq!(mock.count(Method::Post, "/auth/logout"), 1);
}

#[tokio::test]
async fn unreachable_server_during_restore_also_logs_out() {
    let mock = MockTransport::new();
    mock.fail(Method::Get, "/auth/me", "connection refused");
    let storage = persisted("tok", Some(&user_json("alice", "SURVIVOR")));
    let store = store_with(&mock, Arc::clone(&storage));

    assert_eq!(store.restore().await, SessionState::Unauthenticated);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
}

// ════════════════════════════════════════════════════════════════════
// Login / logout
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn login_persists_token_and_user() {
    let mock = MockTransport::new();
    mock.respond(Method::Post, "/auth/login", 200, token_json("fresh"));
    mock.respond(Method::Get, "/auth/me", 200, user_json("carol", "SURVIVOR"));
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(&mock, Arc::clone(&storage));

    let user = store.login("carol", "pw").await.unwrap();
    assert_eq!(user.username, "carol");
    assert_eq!(store.current_user(), Some(user));
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
    assert!(storage.get(USER_KEY).unwrap().is_some());

    let login = mock.requests_to(Method::Post, "/auth/login");
    assert_eq!(login[0].bearer_token, None, "login is sent without a token");
    let body: serde_json::Value = serde_json::from_str(login[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body["username"], "carol");
    assert_eq!(body["password"], "pw");

    let me = mock.requests_to(Method::Get, "/auth/me");
    assert_eq!(me[0].bearer_token.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn login_failure_surfaces_server_message() {
    let mock = MockTransport::new();
    mock.respond(
        Method::Post,
        "/auth/login",
        401,
        r#"{"message":"Invalid username or password"}"#,
    );
    let store = store_with(&mock, Arc::new(MemoryStorage::new()));

    let err = store.login("carol", "wrong").await.unwrap_err();
    match err {
        GooseError::Authentication { message } => {
            assert_eq!(message, "Invalid username or password");
        }
        other => panic!("expected Authentication, got {other:?}"),
    }
    assert_eq!(store.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn login_failure_without_message_uses_generic_text() {
    let mock = MockTransport::new();
    mock.respond(Method::Post, "/auth/login", 500, "");
    let store = store_with(&mock, Arc::new(MemoryStorage::new()));

    let err = store.login("carol", "pw").await.unwrap_err();
    assert!(matches!(err, GooseError::Authentication { ref message } if message == "login failed"));
}

#[tokio::test]
async fn failed_profile_fetch_after_login_clears_token() {
    let mock = MockTransport::new();
    mock.respond(Method::Post, "/auth/login", 200, token_json("fresh"));
    mock.respond(Method::Get, "/auth/me", 500, "{}");
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(&mock, Arc::clone(&storage));

    let err = store.login("carol", "pw").await.unwrap_err();
    assert!(matches!(err, GooseError::Authentication { .. }));
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert!(!store.api().has_token().await);
}

#[tokio::test]
async fn logout_clears_even_when_server_logout_fails() {
    let mock = MockTransport::new();
    mock.respond(Method::Post, "/auth/login", 200, token_json("fresh"));
    mock.respond(Method::Get, "/auth/me", 200, user_json("carol", "SURVIVOR"));
    mock.fail(Method::Post, "/auth/logout", "network down");
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(&mock, Arc::clone(&storage));
    store.login("carol", "pw").await.unwrap();

    store.logout().await;

    assert_eq!(store.state(), SessionState::Unauthenticated);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
    let logout = mock.requests_to(Method::Post, "/auth/logout");
    assert_eq!(logout[0].bearer_token.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn unauthorized_error_forces_silent_logout() {
    let mock = MockTransport::new();
    mock.respond(Method::Post, "/auth/login", 200, token_json("fresh"));
    mock.respond(Method::Get, "/auth/me", 200, user_json("carol", "SURVIVOR"));
    let store = store_with(&mock, Arc::new(MemoryStorage::new()));
    store.login("carol", "pw").await.unwrap();

    assert!(!store.handle_error(&GooseError::NotFound).await);
    assert!(store.is_authenticated());

    assert!(store.handle_error(&GooseError::Unauthorized).await);
    assert_eq!(store.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn watcher_rejected_by_server_logs_the_session_out() {
    let mock = MockTransport::new();
    mock.respond(Method::Post, "/auth/login", 200, token_json("fresh"));
    mock.respond(Method::Get, "/auth/me", 200, user_json("carol", "SURVIVOR"));
    let id = round_id(77);
    let path = round_path(id);
    mock.respond(Method::Get, &path, 200, detail_json(id, -10_000, 10_000, 0, (0, 0), &[]));
    let storage = Arc::new(MemoryStorage::new());
    let store = store_with(&mock, Arc::clone(&storage));
    store.login("carol", "pw").await.unwrap();

    let config = ClientConfig::new("http://goose.test/api")
        .with_poll_interval(std::time::Duration::from_millis(30))
        .with_tick_interval(std::time::Duration::from_secs(60));
    let (_watcher, mut rx) = RoundWatcher::start(store.api().clone(), id, &config);
    let first = tokio::time::timeout(std::time::Duration::from_secs(3), rx.recv())
        .await
        .expect("round did not load");
    assert!(matches!(first, Some(RoundEvent::Loaded(_))));

    // Polling now hits a rejected token.
    mock.replace(Method::Get, &path, 401, r#"{"message":"Unauthorized"}"#);

    let reason = tokio::time::timeout(std::time::Duration::from_secs(3), async {
        loop {
            if let Some(RoundEvent::Stopped { reason }) = rx.recv().await {
                return reason;
            }
        }
    })
    .await
    .expect("watcher did not stop");
    assert_eq!(reason, StopReason::SessionInvalid);

    assert!(store.handle_stop(reason).await);
    assert_eq!(store.state(), SessionState::Unauthenticated);
    assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn ordinary_watcher_stops_keep_the_session() {
    let mock = MockTransport::new();
    mock.respond(Method::Post, "/auth/login", 200, token_json("fresh"));
    mock.respond(Method::Get, "/auth/me", 200, user_json("carol", "SURVIVOR"));
    let store = store_with(&mock, Arc::new(MemoryStorage::new()));
    store.login("carol", "pw").await.unwrap();

    assert!(!store.handle_stop(StopReason::Completed).await);
    assert!(!store.handle_stop(StopReason::Shutdown).await);
    assert!(store.is_authenticated());
}

// ════════════════════════════════════════════════════════════════════
// Round creation
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn survivors_cannot_create_rounds() {
    let mock = MockTransport::new();
    mock.respond(Method::Post, "/auth/login", 200, token_json("fresh"));
    mock.respond(Method::Get, "/auth/me", 200, user_json("sam", "SURVIVOR"));
    let store = store_with(&mock, Arc::new(MemoryStorage::new()));
    store.login("sam", "pw").await.unwrap();

    assert!(matches!(store.create_round().await, Err(GooseError::Forbidden)));
    assert_eq!(mock.count(Method::Post, "/rounds"), 0, "no request is sent");
}

#[tokio::test]
async fn create_round_requires_a_session() {
    let mock = MockTransport::new();
    let store = store_with(&mock, Arc::new(MemoryStorage::new()));
    assert!(matches!(
        store.create_round().await,
        Err(GooseError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn admins_create_rounds_in_cooldown() {
    let mock = MockTransport::new();
    mock.respond(Method::Post, "/auth/login", 200, token_json("fresh"));
    mock.respond(Method::Get, "/auth/me", 200, user_json("root", "ADMIN"));
    let id = common::round_id(42);
    mock.respond(
        Method::Post,
        "/rounds",
        201,
        common::round_value(id, 30_000, 90_000, 0).to_string(),
    );
    let store = store_with(&mock, Arc::new(MemoryStorage::new()));
    store.login("root", "pw").await.unwrap();

    let created = store.create_round().await.unwrap();
    assert_eq!(created.round.id, id);
    assert_eq!(created.phase, goose_tap_client::RoundPhase::Cooldown);
}
