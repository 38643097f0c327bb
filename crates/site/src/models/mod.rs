//! Domain and session models.

pub mod listing;
pub mod session;

pub use listing::{ImageRef, Listing, ListingDecodeError, NewListing};
pub use session::{CurrentUser, PendingImage, keys as session_keys};
