//! Session-related types.
//!
//! Types stored in the session: the signed-in identity and the pending
//! photo set a seller builds up while composing a new listing.

use serde::{Deserialize, Serialize};

use carlot_core::UserId;

use crate::models::listing::ImageRef;

/// Session-stored user identity.
///
/// The bearer token travels with the session so owner-scoped backend
/// calls can be made on the user's behalf; it never appears in rendered
/// pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Provider-assigned account id.
    pub uid: UserId,
    /// Name shown on listings this user publishes.
    pub display_name: String,
    /// Account email.
    pub email: String,
    /// Bearer token for owner-scoped backend calls.
    pub id_token: String,
}

/// One uploaded-but-not-yet-published photo.
///
/// Lives in the session between upload and listing creation. The preview
/// URL renders in the composer; the [`ImageRef`] is what gets written
/// into the record on submit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingImage {
    /// The stored blob this entry points at.
    pub image: ImageRef,
    /// Untokened URL used only while composing.
    pub preview_url: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the pending photo set on the new-listing page.
    pub const PENDING_IMAGES: &str = "pending_images";
}
