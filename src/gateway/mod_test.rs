use super::*;
use crate::config::TOKEN_KEY;
use crate::navigator::RecordingNavigator;
use crate::storage::{DurableStorage, MemoryStorage, lock};
use crate::test_support::Harness;
use serde_json::json;
use std::sync::Mutex;

// =========================================================================
// GatedTransport: holds every request until `n` are in flight, then 401s.
// =========================================================================

struct GatedTransport {
    barrier: tokio::sync::Barrier,
    seen: Mutex<Vec<Option<String>>>,
}

impl GatedTransport {
    fn new(in_flight: usize) -> Self {
        Self { barrier: tokio::sync::Barrier::new(in_flight), seen: Mutex::new(Vec::new()) }
    }
}

#[async_trait::async_trait]
impl Transport for GatedTransport {
    async fn send(&self, request: OutboundRequest) -> Result<InboundResponse, TransportError> {
        lock(&self.seen).push(request.authorization.clone());
        self.barrier.wait().await;
        Ok(InboundResponse::new(401, json!({ "detail": "Given token not valid for any token type" })))
    }
}

fn gated(token: Option<&str>, in_flight: usize) -> (Arc<GatedTransport>, Arc<MemoryStorage>, Arc<RecordingNavigator>, Gateway) {
    let storage = Arc::new(match token {
        Some(token) => MemoryStorage::with_entry(TOKEN_KEY, token),
        None => MemoryStorage::new(),
    });
    let transport = Arc::new(GatedTransport::new(in_flight));
    let navigator = Arc::new(RecordingNavigator::new());
    let session = Arc::new(SessionStore::new(storage.clone()));
    let gateway = Gateway::new(transport.clone(), session, navigator.clone(), &ClientConfig::default());
    (transport, storage, navigator, gateway)
}

// =========================================================================
// credential attachment
// =========================================================================

#[tokio::test]
async fn attaches_bearer_when_session_holds_token() {
    let h = Harness::with_token("tok-A");
    h.transport.respond(Method::Get, "books/", 200, json!([]));
    h.gateway.get("books/").await.unwrap();
    let sent = h.transport.sent();
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer tok-A"));
}

#[tokio::test]
async fn no_authorization_when_session_empty() {
    let h = Harness::new();
    h.transport.respond(Method::Get, "books/", 200, json!([]));
    h.gateway.get("books/").await.unwrap();
    assert!(h.transport.sent()[0].authorization.is_none());
}

#[tokio::test]
async fn token_set_between_calls_is_seen_by_next_dispatch() {
    let h = Harness::new();
    h.transport.respond(Method::Get, "books/", 200, json!([]));
    h.gateway.get("books/").await.unwrap();
    h.session.set("fresh").unwrap();
    h.gateway.get("books/").await.unwrap();
    let sent = h.transport.sent();
    assert!(sent[0].authorization.is_none());
    assert_eq!(sent[1].authorization.as_deref(), Some("Bearer fresh"));
}

// =========================================================================
// pass-through
// =========================================================================

#[tokio::test]
async fn success_body_returned_unchanged() {
    let h = Harness::with_token("t");
    let body = json!([{ "id": 1, "title": "Dune", "description": "", "owner": "alice" }]);
    h.transport.respond(Method::Get, "books/", 200, body.clone());
    assert_eq!(h.gateway.get("books/").await.unwrap(), body);
}

#[tokio::test]
async fn verbs_map_to_methods_and_bodies() {
    let h = Harness::with_token("t");
    h.transport
        .respond(Method::Post, "books/", 201, json!({}))
        .respond(Method::Put, "books/3/", 200, json!({}))
        .respond(Method::Delete, "books/3/", 204, Value::Null);
    h.gateway.post("books/", json!({ "title": "abc" })).await.unwrap();
    h.gateway.put("books/3/", json!({ "title": "abcd" })).await.unwrap();
    h.gateway.delete("books/3/").await.unwrap();

    let sent = h.transport.sent();
    assert_eq!(sent[0].method, Method::Post);
    assert_eq!(sent[0].body, Some(json!({ "title": "abc" })));
    assert_eq!(sent[1].method, Method::Put);
    assert_eq!(sent[2].method, Method::Delete);
    assert!(sent[2].body.is_none());
}

#[tokio::test]
async fn non_401_error_passes_through_and_keeps_session() {
    let h = Harness::with_token("t");
    h.transport
        .respond(Method::Post, "books/", 400, json!({ "error": "A book with this title already exists for this user." }));
    let err = h.gateway.post("books/", json!({})).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
    assert_eq!(h.session.get().unwrap().as_deref(), Some("t"));
    assert!(h.navigator.history().is_empty());
}

#[tokio::test]
async fn transport_failure_is_transport_error_and_keeps_session() {
    let h = Harness::with_token("t");
    h.transport.fail(Method::Get, "books/", "connection refused");
    let err = h.gateway.get("books/").await.unwrap_err();
    match err {
        ApiError::Transport(message) => assert!(message.contains("connection refused")),
        other => panic!("expected Transport, got {other:?}"),
    }
    assert_eq!(h.session.get().unwrap().as_deref(), Some("t"));
}

#[tokio::test]
async fn fetch_decodes_typed_body() {
    #[derive(serde::Deserialize)]
    struct Me {
        username: String,
    }
    let h = Harness::with_token("t");
    h.transport.respond(Method::Get, "current_user/", 200, json!({ "username": "alice123" }));
    let me: Me = h.gateway.fetch(OutboundRequest::get("current_user/")).await.unwrap();
    assert_eq!(me.username, "alice123");
}

// =========================================================================
// forced logout
// =========================================================================

#[tokio::test]
async fn unauthorized_clears_session_and_redirects_before_returning() {
    let h = Harness::with_token("expired");
    h.transport.respond(Method::Get, "books/", 401, json!({ "detail": "expired" }));
    let err = h.gateway.get("books/").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(h.session.get().unwrap(), None);
    assert_eq!(h.storage.read(TOKEN_KEY).unwrap(), None);
    assert_eq!(h.navigator.history(), vec!["/login".to_owned()]);
}

#[tokio::test]
async fn tokenless_401_after_forced_logout_redirects_again() {
    let h = Harness::with_token("expired");
    h.transport.respond(Method::Get, "books/", 401, Value::Null);
    let _ = h.gateway.get("books/").await;
    // Next call goes out without a credential; its 401 belongs to the new,
    // empty session and triggers its own redirect.
    let _ = h.gateway.get("books/").await;
    assert_eq!(h.navigator.history().len(), 2);
    assert!(h.transport.sent()[1].authorization.is_none());
}

#[tokio::test]
async fn concurrent_401s_log_out_exactly_once() {
    let (transport, storage, navigator, gateway) = gated(Some("tok"), 3);
    let (a, b, c) = tokio::join!(
        gateway.get("books/"),
        gateway.get("favourites/"),
        gateway.get("current_user/")
    );
    for result in [a, b, c] {
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }
    assert_eq!(gateway.session().get().unwrap(), None);
    assert_eq!(storage.read(TOKEN_KEY).unwrap(), None);
    assert_eq!(navigator.history(), vec!["/login".to_owned()]);
    assert!(lock(&transport.seen).iter().all(|auth| auth.as_deref() == Some("Bearer tok")));
}

#[tokio::test]
async fn concurrent_401s_without_session_still_redirect_once() {
    let (_, _, navigator, gateway) = gated(None, 2);
    let (a, b) = tokio::join!(gateway.get("books/"), gateway.get("favourites/"));
    assert!(a.is_err() && b.is_err());
    assert_eq!(navigator.history(), vec!["/login".to_owned()]);
}

#[tokio::test]
async fn other_call_still_completes_after_forced_logout() {
    let h = Harness::with_token("tok");
    h.transport
        .respond(Method::Post, "favourites/", 401, Value::Null)
        .respond(Method::Get, "books/", 200, json!([]));
    let (fav, books) = tokio::join!(h.gateway.post("favourites/", json!({ "book": 7 })), h.gateway.get("books/"));
    assert!(matches!(fav, Err(ApiError::Unauthorized)));
    assert_eq!(books.unwrap(), json!([]));
    assert_eq!(h.session.get().unwrap(), None);
    assert_eq!(h.navigator.history().len(), 1);
}

#[tokio::test]
async fn stale_401_does_not_clear_newer_session() {
    let h = Harness::with_token("old");
    let stale = h.session.snapshot().unwrap();
    h.session.set("new").unwrap();
    h.gateway.force_logout(stale.generation);
    assert_eq!(h.session.get().unwrap().as_deref(), Some("new"));
    assert!(h.navigator.history().is_empty());
}

#[test]
fn login_path_comes_from_config() {
    let mut config = ClientConfig::default();
    config.login_path = "/signin".into();
    let storage = Arc::new(MemoryStorage::new());
    let gateway = Gateway::new(
        Arc::new(crate::test_support::ScriptedTransport::new()),
        Arc::new(SessionStore::new(storage)),
        Arc::new(RecordingNavigator::new()),
        &config,
    );
    assert_eq!(gateway.login_path(), "/signin");
}

// =========================================================================
// public dispatch
// =========================================================================

#[tokio::test]
async fn public_dispatch_sends_no_credential_and_ignores_401() {
    let h = Harness::with_token("tok");
    h.transport.respond(Method::Post, "token/", 401, json!({ "detail": "No active account found" }));
    let err = h
        .gateway
        .dispatch_public(OutboundRequest::post("token/", json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Rejected { status: 401, .. }));
    assert!(h.transport.sent()[0].authorization.is_none());
    assert_eq!(h.session.get().unwrap().as_deref(), Some("tok"));
    assert!(h.navigator.history().is_empty());
}
