//! Object store client.
//!
//! Uploads and deletes blobs under percent-encoded object paths. An
//! uploaded blob gets two URLs: the durable, tokened download URL that is
//! written into listing records, and an untokened preview URL used while
//! the seller is still composing a listing.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::FirebaseConfig;
use crate::firebase::api_error_message;

/// Errors that can occur when talking to the object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Blob does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The store returned a non-success status.
    #[error("object store returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A blob that has been written to the object store.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// The object path the blob lives under.
    pub path: String,
    /// Durable, tokened download URL.
    pub url: String,
    /// Untokened media URL, distinct from [`StoredBlob::url`].
    pub preview_url: String,
}

/// Client for the object store REST API.
///
/// Cheap to clone; the underlying HTTP client and endpoint are shared.
#[derive(Clone)]
pub struct StorageClient {
    inner: Arc<StorageClientInner>,
}

struct StorageClientInner {
    client: reqwest::Client,
    /// `{host}/v0/b/{bucket}/o`
    bucket_base: String,
}

/// Upload response; only the download token matters here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    #[serde(default)]
    download_tokens: Option<String>,
}

impl StorageClient {
    /// Create a new object store client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let bucket_base = format!("{}/v0/b/{}/o", config.storage_host, config.storage_bucket);

        Self {
            inner: Arc::new(StorageClientInner {
                client: reqwest::Client::new(),
                bucket_base,
            }),
        }
    }

    /// Upload a blob under `path` and return its retrieval URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects the
    /// upload.
    #[instrument(skip(self, bytes, bearer), fields(size = bytes.len()))]
    pub async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        bearer: Option<&str>,
    ) -> Result<StoredBlob, StorageError> {
        let mut request = self
            .inner
            .client
            .post(&self.inner.bucket_base)
            .query(&[("name", path)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &text, path));
        }

        let upload: UploadResponse = serde_json::from_str(&text).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse upload response"
            );
        })?;

        let preview_url = self.media_url(path);
        // Tokens come back comma-separated when the object has several.
        let url = upload
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .map_or_else(
                || preview_url.clone(),
                |token| format!("{preview_url}&token={token}"),
            );

        Ok(StoredBlob {
            path: path.to_owned(),
            url,
            preview_url,
        })
    }

    /// Delete the blob at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when no blob exists at `path`
    /// (deleting a never-written object is a failure, not a success), or
    /// another error if the request fails.
    #[instrument(skip(self, bearer))]
    pub async fn delete(&self, path: &str, bearer: Option<&str>) -> Result<(), StorageError> {
        let url = self.object_base(path);
        let mut request = self.inner.client.delete(&url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(status_error(status, &body, path));
        }
        Ok(())
    }

    /// Untokened `alt=media` URL for a path.
    #[must_use]
    pub fn media_url(&self, path: &str) -> String {
        format!("{}?alt=media", self.object_base(path))
    }

    /// Object resource URL with the path percent-encoded as one segment.
    fn object_base(&self, path: &str) -> String {
        format!("{}/{}", self.inner.bucket_base, urlencoding::encode(path))
    }
}

fn status_error(status: reqwest::StatusCode, body: &str, path: &str) -> StorageError {
    if status == reqwest::StatusCode::NOT_FOUND {
        return StorageError::NotFound(path.to_owned());
    }
    tracing::error!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Object store returned non-success status"
    );
    StorageError::Status {
        status: status.as_u16(),
        message: api_error_message(body),
    }
}
