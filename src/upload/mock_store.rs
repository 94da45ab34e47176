//! Local stand-in for the blob store, for tests.
//!
//! Shared by the unit tests and the integration tests under `tests/`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the mock answers every request.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    /// 201 with the given `Location`.
    Created(&'static str),
    /// The given status with an optional body.
    Status(u16, Option<&'static str>),
    /// 200 without a `Location` header.
    NoLocation,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Clone)]
struct MockState {
    reply: Reply,
    delay: Duration,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockStore {
    /// Endpoint URL to POST to.
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockStore {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Received bodies, parsed as JSON.
    pub fn bodies(&self) -> Vec<serde_json::Value> {
        self.requests()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }
}

pub async fn serve(reply: Reply) -> MockStore {
    serve_delayed(reply, Duration::ZERO).await
}

/// Like [`serve`], but holds each response for `delay` after recording it.
pub async fn serve_delayed(reply: Reply, delay: Duration) -> MockStore {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        reply,
        delay,
        requests: requests.clone(),
    };

    let app = Router::new()
        .route("/api/jsonBlob", post(handle))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockStore {
        url: format!("http://{}/api/jsonBlob", addr),
        requests,
    }
}

/// URL of a port nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/jsonBlob", addr)
}

async fn handle(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    let header_text = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().unwrap().push(RecordedRequest {
        content_type: header_text(header::CONTENT_TYPE),
        accept: header_text(header::ACCEPT),
        body: body.to_vec(),
    });
    tokio::time::sleep(state.delay).await;

    match state.reply {
        Reply::Created(location) => {
            (StatusCode::CREATED, [(header::LOCATION, location)]).into_response()
        }
        Reply::Status(code, body) => {
            let status = StatusCode::from_u16(code).unwrap();
            (status, body.unwrap_or_default().to_string()).into_response()
        }
        Reply::NoLocation => StatusCode::OK.into_response(),
    }
}
