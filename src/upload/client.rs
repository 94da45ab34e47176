//! HTTP client for the JSON blob store.

use crate::midi::MidiDocument;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use thiserror::Error;

/// Public JSON blob store used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://jsonblob.com/api/jsonBlob";

const USER_AGENT: &str = concat!("midishare/", env!("CARGO_PKG_VERSION"));

/// Upload failures. `Display` is the text shown after the error prefix.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request never produced a response.
    #[error("{0}")]
    Network(String),

    /// Non-2xx response. `message` is the body's `message` field when present.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// 2xx response that cannot be used.
    #[error("{0}")]
    MalformedResponse(String),

    #[error("failed to encode document: {0}")]
    Encode(String),
}

/// POSTs documents to a blob-storage endpoint.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl StorageClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, UploadError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UploadError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    /// Serializes `document` and stores it. Returns the `Location` header.
    pub async fn store(&self, document: &MidiDocument) -> Result<String, UploadError> {
        let body = encode(document)?;
        self.store_body(body).await
    }

    /// Stores an already serialized JSON body. No retries; the transport's
    /// default timeout applies.
    pub async fn store_body(&self, body: Vec<u8>) -> Result<String, UploadError> {
        tracing::debug!(endpoint = %self.endpoint, bytes = body.len(), "Uploading document");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = body_message(&body)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            return Err(UploadError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let location = response
            .headers()
            .get(LOCATION)
            .ok_or_else(|| {
                UploadError::MalformedResponse("response has no Location header".to_string())
            })?
            .to_str()
            .map_err(|e| UploadError::MalformedResponse(format!("invalid Location header: {}", e)))?
            .to_string();

        tracing::info!(status = status.as_u16(), location = %location, "Upload stored");
        Ok(location)
    }
}

/// Serializes a document to the JSON request body.
pub fn encode(document: &MidiDocument) -> Result<Vec<u8>, UploadError> {
    serde_json::to_vec(document).map_err(|e| UploadError::Encode(e.to_string()))
}

/// Extracts a non-empty string `message` field from a JSON error body.
fn body_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
