//! Document store client.
//!
//! Thin typed layer over the documents REST API: create, fetch, delete,
//! and structured queries. Owner-scoped writes pass the signed-in user's
//! bearer token; public reads go unauthenticated and rely on the
//! backend's access rules.

pub mod query;
pub mod value;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::FirebaseConfig;
use crate::firebase::api_error_message;

pub use query::{Direction, FieldOp, StructuredQuery};
pub use value::{Document, Value};

/// Errors that can occur when talking to the document store.
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The store returned a non-success status.
    #[error("document store returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The store's response carried no document id.
    #[error("created document has no id")]
    MissingId,
}

/// Client for the document store REST API.
///
/// Cheap to clone; the underlying HTTP client and endpoint are shared.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    /// `{host}/v1/projects/{project}/databases/(default)/documents`
    documents_base: String,
}

/// One entry of a `runQuery` response stream. Entries that carry only a
/// `readTime` (no document) are skipped.
#[derive(Debug, Deserialize)]
struct RunQueryEntry {
    #[serde(default)]
    document: Option<Document>,
}

impl FirestoreClient {
    /// Create a new document store client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let documents_base = format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            config.firestore_host, config.project_id
        );

        Self {
            inner: Arc::new(FirestoreClientInner {
                client: reqwest::Client::new(),
                documents_base,
            }),
        }
    }

    /// Create a document in `collection`; the store assigns the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects the
    /// write.
    #[instrument(skip(self, fields, bearer))]
    pub async fn create_document(
        &self,
        collection: &str,
        fields: BTreeMap<String, Value>,
        bearer: Option<&str>,
    ) -> Result<Document, FirestoreError> {
        let url = format!("{}/{collection}", self.inner.documents_base);
        let body = Document::from_fields(fields);

        let request = with_bearer(self.inner.client.post(&url), bearer).json(&body);
        let response = request.send().await?;
        let document: Document = decode(response, collection).await?;

        if document.id().is_none() {
            return Err(FirestoreError::MissingId);
        }
        Ok(document)
    }

    /// Fetch a single document by id.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::NotFound` if the document does not exist,
    /// or another error if the request fails.
    #[instrument(skip(self, bearer))]
    pub async fn get_document(
        &self,
        collection: &str,
        id: &str,
        bearer: Option<&str>,
    ) -> Result<Document, FirestoreError> {
        let url = format!("{}/{collection}/{id}", self.inner.documents_base);

        let response = with_bearer(self.inner.client.get(&url), bearer).send().await?;
        decode(response, &format!("{collection}/{id}")).await
    }

    /// Delete a single document by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects the
    /// delete.
    #[instrument(skip(self, bearer))]
    pub async fn delete_document(
        &self,
        collection: &str,
        id: &str,
        bearer: Option<&str>,
    ) -> Result<(), FirestoreError> {
        let url = format!("{}/{collection}/{id}", self.inner.documents_base);

        let response = with_bearer(self.inner.client.delete(&url), bearer).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(status_error(status, &body, &format!("{collection}/{id}")));
        }
        Ok(())
    }

    /// Run a structured query and return the matching documents in the
    /// order the store streamed them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be
    /// parsed.
    #[instrument(skip(self, query, bearer))]
    pub async fn run_query(
        &self,
        query: StructuredQuery,
        bearer: Option<&str>,
    ) -> Result<Vec<Document>, FirestoreError> {
        let url = format!("{}:runQuery", self.inner.documents_base);
        let body = serde_json::json!({ "structuredQuery": query });

        let request = with_bearer(self.inner.client.post(&url), bearer).json(&body);
        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &text, "runQuery"));
        }

        let entries: Vec<RunQueryEntry> = serde_json::from_str(&text).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse query response"
            );
        })?;

        Ok(entries.into_iter().filter_map(|e| e.document).collect())
    }
}

/// Attach a bearer token when one is given.
fn with_bearer(
    request: reqwest::RequestBuilder,
    bearer: Option<&str>,
) -> reqwest::RequestBuilder {
    match bearer {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// Decode a document response, mapping 404 to `NotFound`.
async fn decode(response: reqwest::Response, what: &str) -> Result<Document, FirestoreError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(status_error(status, &text, what));
    }

    serde_json::from_str(&text)
        .inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse document response"
            );
        })
        .map_err(FirestoreError::Parse)
}

fn status_error(status: reqwest::StatusCode, body: &str, what: &str) -> FirestoreError {
    if status == reqwest::StatusCode::NOT_FOUND {
        return FirestoreError::NotFound(what.to_owned());
    }
    tracing::error!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Document store returned non-success status"
    );
    FirestoreError::Status {
        status: status.as_u16(),
        message: api_error_message(body),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_run_query_entries_skip_read_time_only_rows() {
        // The stream interleaves readTime-only entries with documents.
        let body = r#"[
            {"readTime": "2024-03-01T12:00:00Z"},
            {"document": {"name": "projects/p/databases/(default)/documents/cars/a1",
                          "fields": {"name": {"stringValue": "ONIX 1.0"}}},
             "readTime": "2024-03-01T12:00:00Z"}
        ]"#;

        let entries: Vec<RunQueryEntry> = serde_json::from_str(body).unwrap();
        let documents: Vec<Document> = entries.into_iter().filter_map(|e| e.document).collect();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents.first().unwrap().id(), Some("a1"));
    }

    #[test]
    fn test_status_error_maps_404_to_not_found() {
        let err = status_error(reqwest::StatusCode::NOT_FOUND, "{}", "cars/missing");
        assert!(matches!(err, FirestoreError::NotFound(ref what) if what == "cars/missing"));
    }

    #[test]
    fn test_status_error_extracts_backend_message() {
        let body = r#"{"error":{"code":403,"message":"Missing or insufficient permissions.","status":"PERMISSION_DENIED"}}"#;
        let err = status_error(reqwest::StatusCode::FORBIDDEN, body, "cars");
        match err {
            FirestoreError::Status { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Missing or insufficient permissions.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
