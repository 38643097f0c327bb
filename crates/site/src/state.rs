//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::firebase::{AuthClient, FirestoreClient, StorageClient};
use crate::services::ListingRepository;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources: configuration, the backend clients, and the listing
/// repository composed over them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    auth: AuthClient,
    listings: ListingRepository,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: SiteConfig) -> Self {
        let auth = AuthClient::new(&config.firebase);
        let firestore = FirestoreClient::new(&config.firebase);
        let storage = StorageClient::new(&config.firebase);
        let listings = ListingRepository::new(firestore, storage);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                auth,
                listings,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn auth(&self) -> &AuthClient {
        &self.inner.auth
    }

    /// Get a reference to the listing repository.
    #[must_use]
    pub fn listings(&self) -> &ListingRepository {
        &self.inner.listings
    }
}
