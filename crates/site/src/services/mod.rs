//! Application services.

pub mod listings;

pub use listings::{
    CascadeOutcome, ListingError, ListingRepository, OwnerContext, UploadedImage,
};
