//! Integration tests for Carlot.
//!
//! Every external collaborator is an HTTP service, so the whole backend is
//! stood in for by one `httpmock` server: the same base URL serves as the
//! identity provider, the document store, and the object store, and each
//! test mounts only the endpoints its flow touches.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p carlot-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `firestore_adapter` - Document store client wire behavior
//! - `storage_adapter` - Object store client wire behavior
//! - `auth_flow` - Identity provider sign-in/sign-up
//! - `listing_repository` - The listing operations end to end

use httpmock::MockServer;

use carlot_core::UserId;
use carlot_site::config::FirebaseConfig;
use carlot_site::firebase::{AuthClient, FirestoreClient, StorageClient};
use carlot_site::models::CurrentUser;
use carlot_site::services::{ListingRepository, OwnerContext};

/// Project id every test backend uses.
pub const PROJECT_ID: &str = "carlot-test";
/// Bucket every test backend uses.
pub const BUCKET: &str = "carlot-test.appspot.com";

/// A backend configuration with every service pointed at the mock server.
#[must_use]
pub fn backend_config(server: &MockServer) -> FirebaseConfig {
    FirebaseConfig {
        project_id: PROJECT_ID.to_owned(),
        api_key: "AIzaTestKey".to_owned(),
        storage_bucket: BUCKET.to_owned(),
        auth_host: server.base_url(),
        firestore_host: server.base_url(),
        storage_host: server.base_url(),
    }
}

/// A listing repository wired to the mock backend.
#[must_use]
pub fn repository(server: &MockServer) -> ListingRepository {
    let config = backend_config(server);
    ListingRepository::new(FirestoreClient::new(&config), StorageClient::new(&config))
}

/// A document store client wired to the mock backend.
#[must_use]
pub fn firestore_client(server: &MockServer) -> FirestoreClient {
    FirestoreClient::new(&backend_config(server))
}

/// An object store client wired to the mock backend.
#[must_use]
pub fn storage_client(server: &MockServer) -> StorageClient {
    StorageClient::new(&backend_config(server))
}

/// An identity provider client wired to the mock backend.
#[must_use]
pub fn auth_client(server: &MockServer) -> AuthClient {
    AuthClient::new(&backend_config(server))
}

/// An owner context for a test seller.
#[must_use]
pub fn owner(uid: &str, display_name: &str) -> OwnerContext {
    OwnerContext::from(&CurrentUser {
        uid: UserId::new(uid),
        display_name: display_name.to_owned(),
        email: format!("{uid}@example.com"),
        id_token: format!("token-{uid}"),
    })
}

/// Path prefix of the documents API on the mock server.
#[must_use]
pub fn documents_path() -> String {
    format!("/v1/projects/{PROJECT_ID}/databases/(default)/documents")
}

/// A complete stored listing document, as the documents API returns it.
#[must_use]
pub fn listing_document(
    id: &str,
    name: &str,
    uid: &str,
    created: &str,
    image_names: &[&str],
) -> serde_json::Value {
    let images: Vec<serde_json::Value> = image_names
        .iter()
        .map(|image_name| {
            serde_json::json!({
                "mapValue": {
                    "fields": {
                        "uid": {"stringValue": uid},
                        "name": {"stringValue": image_name},
                        "url": {"stringValue": format!("https://cdn.example/o/images%2F{uid}%2F{image_name}?alt=media&token=t")}
                    }
                }
            })
        })
        .collect();

    serde_json::json!({
        "name": format!("projects/{PROJECT_ID}/databases/(default)/documents/cars/{id}"),
        "fields": {
            "name": {"stringValue": name},
            "model": {"stringValue": "1.0 flex plus manual"},
            "year": {"stringValue": "2024/2024"},
            "km": {"stringValue": "23100"},
            "price": {"stringValue": "46.700"},
            "city": {"stringValue": "Recife - PE"},
            "whatsapp": {"stringValue": "81988880000"},
            "description": {"stringValue": "Well kept, single owner."},
            "created": {"timestampValue": created},
            "owner": {"stringValue": "Seller"},
            "uid": {"stringValue": uid},
            "image": {"arrayValue": {"values": images}}
        },
        "createTime": created,
        "updateTime": created
    })
}
