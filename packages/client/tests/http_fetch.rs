//! HttpFetcher and CollectionWalker against a loopback axum server.
//!
//! The fetcher is blocking, so each server runs on its own thread with its
//! own tokio runtime while the test body stays synchronous.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use weftstreams::{AsType, Iri, VocabType};
use weftstreams_client::{
    Cancellation, CollectionWalker, Fetch, FetchConfig, FetchError, HttpFetcher, ACCEPT_ACTIVITY,
};

const NOTE: &str = r#"{"type":"Note","content":"hi"}"#;

/// Bind a loopback port, build the router with its base URL, and serve it
/// from a background thread. Returns the base URL, e.g. `http://127.0.0.1:PORT`.
fn spawn_mock_server(build: impl FnOnce(&str) -> Router) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let router = build(&base);
    listener.set_nonblocking(true).unwrap();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, router).await.unwrap();
        });
    });
    base
}

fn activity(body: impl Into<String>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/activity+json")],
        body.into(),
    )
}

fn fast_config() -> FetchConfig {
    FetchConfig {
        timeout: Duration::from_secs(5),
        max_retries: 3,
        backoff_base: Duration::from_millis(1),
        backoff_max: Duration::from_millis(5),
        ..FetchConfig::default()
    }
}

fn fetcher(config: FetchConfig) -> HttpFetcher {
    HttpFetcher::new(config).unwrap()
}

fn iri(s: &str) -> Iri {
    Iri::parse(s).unwrap()
}

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

#[test]
fn sends_activity_accept_header_and_returns_body() {
    let seen: Arc<Mutex<Option<(String, String)>>> = Arc::default();
    let recorder = Arc::clone(&seen);
    let base = spawn_mock_server(move |_| {
        Router::new().route(
            "/notes/1",
            get(move |headers: HeaderMap| {
                let recorder = Arc::clone(&recorder);
                async move {
                    let value = |name: header::HeaderName| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string()
                    };
                    *recorder.lock().unwrap() =
                        Some((value(header::ACCEPT), value(header::USER_AGENT)));
                    activity(NOTE)
                }
            }),
        )
    });

    let body = fetcher(fast_config())
        .fetch(&iri(&format!("{base}/notes/1")), &Cancellation::new())
        .unwrap();
    let note = weftstreams::from_bytes(&body).unwrap();
    assert_eq!(note.vocab_type(), &VocabType::As(AsType::Note));

    let (accept, user_agent) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(accept, ACCEPT_ACTIVITY);
    assert!(user_agent.starts_with("weftstreams/"));
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

#[test]
fn not_found_is_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let base = spawn_mock_server(move |_| {
        Router::new().route(
            "/missing",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { StatusCode::NOT_FOUND }
            }),
        )
    });

    let err = fetcher(fast_config())
        .fetch(&iri(&format!("{base}/missing")), &Cancellation::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert!(!err.is_transient());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn server_errors_are_retried_until_success() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let base = spawn_mock_server(move |_| {
        Router::new().route(
            "/flaky",
            get(move || {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        StatusCode::SERVICE_UNAVAILABLE.into_response()
                    } else {
                        activity(NOTE).into_response()
                    }
                }
            }),
        )
    });

    let body = fetcher(fast_config())
        .fetch(&iri(&format!("{base}/flaky")), &Cancellation::new())
        .unwrap();
    assert_eq!(body, NOTE.as_bytes());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn retries_are_bounded() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let base = spawn_mock_server(move |_| {
        Router::new().route(
            "/down",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { StatusCode::TOO_MANY_REQUESTS }
            }),
        )
    });

    let config = FetchConfig {
        max_retries: 2,
        ..fast_config()
    };
    let err = fetcher(config)
        .fetch(&iri(&format!("{base}/down")), &Cancellation::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 429, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

// ---------------------------------------------------------------------------
// Body limits, timeouts, cancellation
// ---------------------------------------------------------------------------

#[test]
fn empty_body_is_reported() {
    let base = spawn_mock_server(|_| Router::new().route("/empty", get(|| async { activity("") })));
    let err = fetcher(fast_config())
        .fetch(&iri(&format!("{base}/empty")), &Cancellation::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::EmptyBody { .. }));
}

#[test]
fn oversized_body_is_rejected() {
    let base = spawn_mock_server(|_| {
        Router::new().route("/big", get(|| async { activity("x".repeat(1024)) }))
    });
    let config = FetchConfig {
        max_body_bytes: 64,
        ..fast_config()
    };
    let err = fetcher(config)
        .fetch(&iri(&format!("{base}/big")), &Cancellation::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::BodyTooLarge { limit: 64, .. }));
}

#[test]
fn slow_server_times_out() {
    let base = spawn_mock_server(|_| {
        Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                activity(NOTE)
            }),
        )
    });
    let config = FetchConfig {
        timeout: Duration::from_millis(200),
        max_retries: 0,
        ..fast_config()
    };
    let err = fetcher(config)
        .fetch(&iri(&format!("{base}/slow")), &Cancellation::new())
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }), "got {err}");
}

#[test]
fn deadline_cuts_a_request_short() {
    let base = spawn_mock_server(|_| {
        Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                activity(NOTE)
            }),
        )
    });
    let started = Instant::now();
    let cancel = Cancellation::with_timeout(Duration::from_millis(200));
    let err = fetcher(fast_config())
        .fetch(&iri(&format!("{base}/slow")), &cancel)
        .unwrap_err();
    assert!(err.is_cancelled(), "got {err}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn cancel_aborts_a_request_in_flight() {
    let base = spawn_mock_server(|_| {
        Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                activity(NOTE)
            }),
        )
    });
    let cancel = Cancellation::new();
    let remote = cancel.clone();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        remote.cancel();
    });

    let started = Instant::now();
    let err = fetcher(fast_config())
        .fetch(&iri(&format!("{base}/slow")), &cancel)
        .unwrap_err();
    assert!(err.is_cancelled(), "got {err}");
    assert!(started.elapsed() < Duration::from_secs(2));
    canceller.join().unwrap();
}

// ---------------------------------------------------------------------------
// Walking over HTTP
// ---------------------------------------------------------------------------

#[test]
fn walks_an_actor_outbox_over_http() {
    let base = spawn_mock_server(|base| {
        let actor = json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "type": "Person",
            "id": format!("{base}/users/alice"),
            "inbox": format!("{base}/users/alice/inbox"),
            "outbox": format!("{base}/users/alice/outbox"),
            "preferredUsername": "alice"
        })
        .to_string();
        let outbox = json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "type": "OrderedCollection",
            "id": format!("{base}/users/alice/outbox"),
            "totalItems": 3,
            "first": format!("{base}/users/alice/outbox/1")
        })
        .to_string();
        let page1 = json!({
            "type": "OrderedCollectionPage",
            "id": format!("{base}/users/alice/outbox/1"),
            "orderedItems": [
                {"type": "Create", "object": {"type": "Note", "content": "one"}},
                {"type": "Announce", "object": "https://example.com/notes/9"}
            ],
            "next": format!("{base}/users/alice/outbox/2")
        })
        .to_string();
        let page2 = json!({
            "type": "OrderedCollectionPage",
            "id": format!("{base}/users/alice/outbox/2"),
            "orderedItems": [{"type": "Create", "object": {"type": "Note", "content": "three"}}]
        })
        .to_string();

        Router::new()
            .route("/users/alice", get(move || async move { activity(actor) }))
            .route("/users/alice/outbox", get(move || async move { activity(outbox) }))
            .route("/users/alice/outbox/1", get(move || async move { activity(page1) }))
            .route("/users/alice/outbox/2", get(move || async move { activity(page2) }))
    });

    let walker = CollectionWalker::new(fetcher(fast_config()));
    let walk = walker
        .walk_actor(&iri(&format!("{base}/users/alice")), &Cancellation::new())
        .unwrap();
    assert_eq!(walk.pages, 2);
    let kinds: Vec<_> = walk
        .items
        .iter()
        .filter_map(|v| v.as_object())
        .map(|o| o.vocab_type().clone())
        .collect();
    assert_eq!(
        kinds,
        vec![
            VocabType::As(AsType::Create),
            VocabType::As(AsType::Announce),
            VocabType::As(AsType::Create)
        ]
    );
}
