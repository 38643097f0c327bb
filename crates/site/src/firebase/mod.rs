//! Typed REST clients for the managed backend.
//!
//! # Architecture
//!
//! - Hand-rolled `reqwest` + `serde_json` clients, one per backend service
//! - The backend is source of truth - NO local sync, direct API calls
//! - Owner-scoped operations carry the signed-in user's bearer token;
//!   public reads go unauthenticated and rely on the backend's rules
//!
//! # Services
//!
//! ## Identity Toolkit ([`auth`])
//! - Email/password sign-up and sign-in, display-name updates
//! - Keyed by the project's public web API key
//!
//! ## Document store ([`firestore`])
//! - Create/get/delete documents, structured queries with filters and
//!   ordering, typed wire-value encoding
//!
//! ## Object store ([`storage`])
//! - Blob upload and delete under percent-encoded paths, tokened download
//!   URLs
//!
//! # Example
//!
//! ```rust,ignore
//! use carlot_site::firebase::{FirestoreClient, StorageClient};
//!
//! let firestore = FirestoreClient::new(&config.firebase);
//! let docs = firestore.run_query(query, None).await?;
//!
//! let storage = StorageClient::new(&config.firebase);
//! let blob = storage.put("images/u1/abc", bytes, "image/jpeg", Some(token)).await?;
//! ```

pub mod auth;
pub mod firestore;
pub mod storage;

pub use auth::{AuthClient, AuthError, AuthSession};
pub use firestore::{FirestoreClient, FirestoreError};
pub use storage::{StorageClient, StorageError, StoredBlob};

use serde::Deserialize;

/// Error envelope returned by every backend service.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

/// The interesting part of the error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}

/// Extract the backend's error message from a response body, falling back
/// to a truncated copy of the raw body when it is not the usual envelope.
pub(crate) fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect::<String>(),
        |parsed| parsed.error.message,
    )
}
