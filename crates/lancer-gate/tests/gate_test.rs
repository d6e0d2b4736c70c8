use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use lancer_gate::{
    AuthHandler, AuthRequest, AuthResult, GateConfig, Gatekeeper, HandlerFuture, WebhookEvent,
    build_router, sign,
};
use tokio::sync::Mutex;
use tower::ServiceExt;

const SECRET: &str = "whsec_integration";

/// Resolves owners from a fixed token table, the way a real service would
/// look tokens up in its session store.
struct TokenTable {
    owners: Vec<(&'static str, &'static str)>,
    calls: Arc<AtomicUsize>,
}

impl AuthHandler for TokenTable {
    fn authorize(&self, request: AuthRequest) -> HandlerFuture<AuthResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let owner = self
            .owners
            .iter()
            .find(|(token, _)| *token == request.token)
            .map(|(_, owner)| (*owner).to_owned());
        Box::pin(async move {
            match owner {
                Some(owner) => AuthResult::owned(owner, 201),
                None => AuthResult::denied(401),
            }
        })
    }
}

struct Harness {
    app: Router,
    auth_calls: Arc<AtomicUsize>,
    events: Arc<Mutex<Vec<WebhookEvent>>>,
}

fn harness(verification: bool) -> Harness {
    let auth_calls = Arc::new(AtomicUsize::new(0));
    let events = Arc::new(Mutex::new(Vec::new()));

    let table = TokenTable {
        owners: vec![("tok-alice", "alice"), ("tok-bob", "bob")],
        calls: Arc::clone(&auth_calls),
    };
    let sink = Arc::clone(&events);
    let on_event = move |ev: WebhookEvent| {
        let sink = Arc::clone(&sink);
        async move {
            let ack = ev.event != "unknown.event";
            sink.lock().await.push(ev);
            ack
        }
    };

    let config = GateConfig {
        signing_secret: Some(SECRET.into()),
        webhook_verification: verification,
        ..GateConfig::default()
    };
    let gatekeeper = Gatekeeper::from_config(&config).unwrap();
    let app = build_router(&gatekeeper, &config, table, on_event).unwrap();

    Harness {
        app,
        auth_calls,
        events,
    }
}

fn session_json() -> serde_json::Value {
    serde_json::json!({
        "chunk_size": 8_388_608,
        "file_name": "backup.tar",
        "file_size": 33_554_432,
        "max_chunk": 4,
        "mime_type": "application/x-tar",
        "provider": "r2",
    })
}

fn auth_request(token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/auth")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn webhook_request(body: &str, signature: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some((sig, ts)) = signature {
        builder = builder.header("x-signature", sig).header("x-timestamp", ts);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn auth_without_header_is_forbidden() {
    let h = harness(false);
    let resp = h
        .app
        .oneshot(auth_request(None, &session_json()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(h.auth_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn auth_missing_file_name_is_unprocessable() {
    let h = harness(false);
    let mut body = session_json();
    body.as_object_mut().unwrap().remove("file_name");
    let resp = h
        .app
        .oneshot(auth_request(Some("tok-alice"), &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(h.auth_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn auth_missing_mime_type_is_unprocessable() {
    let h = harness(false);
    let mut body = session_json();
    body.as_object_mut().unwrap().remove("mime_type");
    let resp = h
        .app
        .oneshot(auth_request(Some("tok-alice"), &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn auth_complete_request_returns_handler_status_and_owner() {
    let h = harness(false);
    let resp = h
        .app
        .clone()
        .oneshot(auth_request(Some("tok-bob"), &session_json()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_json(resp).await["ownerId"], "bob");
    assert_eq!(h.auth_calls.load(Ordering::SeqCst), 1);

    let resp = h
        .app
        .oneshot(auth_request(Some("tok-mallory"), &session_json()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(resp).await.get("ownerId").is_none());
    assert_eq!(h.auth_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn webhook_verification_requires_signature_header() {
    let h = harness(true);
    let body = r#"{"event":"file.completed","data":{"id":"f_9"}}"#;
    let req = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("x-timestamp", "1700000000")
        .body(Body::from(body))
        .unwrap();
    let resp = h.app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(h.events.lock().await.is_empty());
}

#[tokio::test]
async fn webhook_correct_signature_is_acknowledged() {
    let h = harness(true);
    let body = r#"{"event":"file.completed","data":{"id":"f_9","owner":"alice"}}"#;
    let ts = "1700000000";
    let sig = sign(body, ts, SECRET);
    let resp = h
        .app
        .oneshot(webhook_request(body, Some((&sig, ts))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let events = h.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, "file.completed");
    assert_eq!(events[0].payload["owner"], "alice");
}

#[tokio::test]
async fn webhook_tampered_body_is_rejected() {
    let h = harness(true);
    let signed = r#"{"event":"file.completed","data":{"id":"f_9"}}"#;
    let sent = r#"{"event":"file.completed","data":{"id":"f_10"}}"#;
    let ts = "1700000000";
    let sig = sign(signed, ts, SECRET);
    let resp = h
        .app
        .oneshot(webhook_request(sent, Some((&sig, ts))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(h.events.lock().await.is_empty());
}

#[tokio::test]
async fn webhook_declined_event_is_bad_request() {
    let h = harness(true);
    let body = r#"{"event":"unknown.event","data":{}}"#;
    let ts = "1700000000";
    let sig = sign(body, ts, SECRET);
    let resp = h
        .app
        .oneshot(webhook_request(body, Some((&sig, ts))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.events.lock().await.len(), 1);
}

#[tokio::test]
async fn webhook_without_verification_always_reaches_handler() {
    let h = harness(false);
    let body = r#"{"event":"session.created","data":{"id":"s_1"}}"#;

    let resp = h
        .app
        .clone()
        .oneshot(webhook_request(body, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = h
        .app
        .oneshot(webhook_request(body, Some(("bogus", "nope"))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.events.lock().await.len(), 2);
}

#[tokio::test]
async fn gates_mount_into_existing_router_with_state() {
    #[derive(Clone)]
    struct AppState;

    let gatekeeper = Gatekeeper::new(SECRET);
    let app: Router = Router::new()
        .route(
            "/uploads/session",
            gatekeeper.auth(|req: AuthRequest| async move {
                AuthResult::owned(format!("owner-of-{}", req.token), 200)
            }),
        )
        .route(
            "/uploads/events",
            gatekeeper.webhook(|_ev: WebhookEvent| async { true }, false),
        )
        .with_state(AppState);

    let req = Request::builder()
        .method("POST")
        .uri("/uploads/session")
        .header("authorization", "Bearer t1")
        .body(Body::from(serde_json::to_vec(&session_json()).unwrap()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["ownerId"], "owner-of-t1");
}
