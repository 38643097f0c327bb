//! Listing repository: sequences backend calls into listing-level
//! operations.
//!
//! Every operation is a single-shot request chain - no retries, no
//! transactions, no rollback. The two multi-step flows are deliberately
//! best-effort:
//!
//! - create: photos are uploaded first, the record write comes later;
//!   abandoning the composer leaves orphaned blobs.
//! - delete: the record goes first, then each photo blob independently;
//!   a failed blob delete never rolls the record back.
//!
//! Operations that act on behalf of a seller take an explicit
//! [`OwnerContext`] rather than reading ambient session state.

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use carlot_core::{ImageFormat, ImageFormatError, ListingId, UserId};

use crate::firebase::firestore::{Direction, FieldOp, StructuredQuery, Value};
use crate::firebase::{FirestoreClient, FirestoreError, StorageClient, StorageError};
use crate::models::listing::{COLLECTION, ImageRef, Listing, ListingDecodeError, NewListing};
use crate::models::session::CurrentUser;

/// Everything after the last assigned character, so `[prefix, prefix+X]`
/// covers exactly the strings starting with `prefix`. The store has no
/// native prefix search; this range emulation is the standard workaround.
const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Errors from listing operations, grouped by which collaborator failed.
#[derive(Debug, Error)]
pub enum ListingError {
    /// Rejected before any network call: not an accepted photo format.
    #[error(transparent)]
    UnsupportedImageType(#[from] ImageFormatError),

    /// Rejected before any write: a listing needs at least one photo.
    #[error("a listing needs at least one photo")]
    NoImages,

    /// Object store operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Document read failed.
    #[error("listing read failed: {0}")]
    Read(#[source] FirestoreError),

    /// Document write failed.
    #[error("listing write failed: {0}")]
    Write(#[source] FirestoreError),

    /// A stored document did not decode as a listing.
    #[error(transparent)]
    Decode(#[from] ListingDecodeError),
}

/// Explicit per-request seller identity.
#[derive(Debug, Clone)]
pub struct OwnerContext {
    /// Seller account id.
    pub uid: UserId,
    /// Name written onto created listings.
    pub display_name: String,
    id_token: String,
}

impl OwnerContext {
    /// Bearer token for owner-scoped backend calls.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        Some(&self.id_token)
    }
}

impl From<&CurrentUser> for OwnerContext {
    fn from(user: &CurrentUser) -> Self {
        Self {
            uid: user.uid.clone(),
            display_name: user.display_name.clone(),
            id_token: user.id_token.clone(),
        }
    }
}

/// Result of a successful photo upload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// The reference a listing record will carry.
    pub image: ImageRef,
    /// Untokened URL for the composer, distinct from the stored URL.
    pub preview_url: String,
}

/// Tally of the blob cascade after a listing delete.
///
/// The record is already gone by the time this exists; failed blobs stay
/// orphaned in the object store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeOutcome {
    /// Blobs deleted.
    pub deleted_blobs: usize,
    /// Blobs that could not be deleted.
    pub failed_blobs: usize,
}

impl CascadeOutcome {
    /// True when every referenced blob was deleted.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed_blobs == 0
    }
}

/// Sequences the document and object store clients into listing
/// operations.
#[derive(Clone)]
pub struct ListingRepository {
    firestore: FirestoreClient,
    storage: StorageClient,
}

impl ListingRepository {
    /// Create a new repository over the two store clients.
    #[must_use]
    pub const fn new(firestore: FirestoreClient, storage: StorageClient) -> Self {
        Self { firestore, storage }
    }

    /// Upload one photo for `owner` and return its reference plus a
    /// composer preview URL.
    ///
    /// # Errors
    ///
    /// Returns `ListingError::UnsupportedImageType` (before any network
    /// call) for content types outside {jpeg, png}, or a storage error if
    /// the upload fails.
    #[instrument(skip(self, owner, bytes), fields(uid = %owner.uid, size = bytes.len()))]
    pub async fn upload_image(
        &self,
        owner: &OwnerContext,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, ListingError> {
        let format = ImageFormat::from_content_type(content_type)?;

        let blob_name = Uuid::new_v4().to_string();
        let path = format!("images/{}/{blob_name}", owner.uid);
        let blob = self
            .storage
            .put(&path, bytes, format.content_type(), owner.bearer())
            .await?;

        Ok(UploadedImage {
            image: ImageRef {
                uid: owner.uid.clone(),
                name: blob_name,
                url: blob.url,
            },
            preview_url: blob.preview_url,
        })
    }

    /// Delete one uploaded photo blob.
    ///
    /// # Errors
    ///
    /// Deleting a never-written path surfaces the store's `NotFound` - a
    /// recoverable failure, not a success.
    #[instrument(skip(self, owner), fields(uid = %owner.uid, path = %image.blob_path()))]
    pub async fn delete_image(
        &self,
        owner: &OwnerContext,
        image: &ImageRef,
    ) -> Result<(), ListingError> {
        self.storage
            .delete(&image.blob_path(), owner.bearer())
            .await?;
        Ok(())
    }

    /// Create a listing record from validated fields and already-uploaded
    /// photos.
    ///
    /// Not atomic with the uploads: the photos must already exist, and a
    /// crash before this call leaves them orphaned.
    ///
    /// # Errors
    ///
    /// Returns `ListingError::NoImages` (before any write) for an empty
    /// photo set, or a write error if the record create fails.
    #[instrument(skip(self, owner, new, images), fields(uid = %owner.uid, photos = images.len()))]
    pub async fn create_listing(
        &self,
        owner: &OwnerContext,
        new: NewListing,
        images: Vec<ImageRef>,
    ) -> Result<ListingId, ListingError> {
        if images.is_empty() {
            return Err(ListingError::NoImages);
        }

        let fields = new.into_fields(&images, &owner.uid, &owner.display_name, Utc::now());
        let document = self
            .firestore
            .create_document(COLLECTION, fields, owner.bearer())
            .await
            .map_err(ListingError::Write)?;

        let id = document.id().ok_or(ListingDecodeError::MissingId)?;
        tracing::info!(listing = %id, "Listing created");
        Ok(ListingId::new(id))
    }

    /// Delete a listing record, then best-effort delete every referenced
    /// photo blob.
    ///
    /// The record delete gates the cascade: if it fails, no blob is
    /// touched. Blob deletes are independent and non-short-circuiting;
    /// failures are logged, tallied, and left orphaned.
    ///
    /// # Errors
    ///
    /// Returns `ListingError::Write` only for the record delete. The blob
    /// cascade itself never errors; see [`CascadeOutcome`].
    #[instrument(skip(self, owner, listing), fields(uid = %owner.uid, listing = %listing.id))]
    pub async fn delete_listing(
        &self,
        owner: &OwnerContext,
        listing: &Listing,
    ) -> Result<CascadeOutcome, ListingError> {
        self.firestore
            .delete_document(COLLECTION, listing.id.as_str(), owner.bearer())
            .await
            .map_err(ListingError::Write)?;

        let mut outcome = CascadeOutcome::default();
        for image in &listing.images {
            match self.storage.delete(&image.blob_path(), owner.bearer()).await {
                Ok(()) => outcome.deleted_blobs += 1,
                Err(error) => {
                    tracing::warn!(
                        path = %image.blob_path(),
                        error = %error,
                        "Failed to delete listing photo; blob stays orphaned"
                    );
                    outcome.failed_blobs += 1;
                }
            }
        }

        if !outcome.is_clean() {
            tracing::warn!(
                listing = %listing.id,
                failed = outcome.failed_blobs,
                "Listing deleted with partial photo cascade"
            );
        }
        Ok(outcome)
    }

    /// Fetch one listing; `None` when the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns a read error for anything other than a missing record.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &ListingId) -> Result<Option<Listing>, ListingError> {
        match self
            .firestore
            .get_document(COLLECTION, id.as_str(), None)
            .await
        {
            Ok(document) => Ok(Some(Listing::from_document(&document)?)),
            Err(FirestoreError::NotFound(_)) => Ok(None),
            Err(error) => Err(ListingError::Read(error)),
        }
    }

    /// All listings, newest first. Unbounded - pagination is a known
    /// limitation.
    ///
    /// # Errors
    ///
    /// Returns a read error if the query fails or a record is malformed.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Listing>, ListingError> {
        let query =
            StructuredQuery::collection(COLLECTION).order_by("created", Direction::Descending);
        self.run_listing_query(query).await
    }

    /// The listings owned by `uid`, in store order.
    ///
    /// # Errors
    ///
    /// Returns a read error if the query fails or a record is malformed.
    #[instrument(skip(self))]
    pub async fn list_by_owner(&self, uid: &UserId) -> Result<Vec<Listing>, ListingError> {
        let query = StructuredQuery::collection(COLLECTION).filter(
            "uid",
            FieldOp::Equal,
            Value::string(uid.as_str()),
        );
        self.run_listing_query(query).await
    }

    /// Listings whose name starts with `prefix`, case-normalized.
    ///
    /// Names are stored upper-cased, so the prefix is upper-cased too and
    /// matched with a `[prefix, prefix + sentinel]` range.
    ///
    /// # Errors
    ///
    /// Returns a read error if the query fails or a record is malformed.
    #[instrument(skip(self))]
    pub async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<Listing>, ListingError> {
        let (lower, upper) = prefix_bounds(prefix);
        let query = StructuredQuery::collection(COLLECTION)
            .filter("name", FieldOp::GreaterThanOrEqual, Value::string(lower))
            .filter("name", FieldOp::LessThanOrEqual, Value::string(upper));
        self.run_listing_query(query).await
    }

    async fn run_listing_query(
        &self,
        query: StructuredQuery,
    ) -> Result<Vec<Listing>, ListingError> {
        let documents = self
            .firestore
            .run_query(query, None)
            .await
            .map_err(ListingError::Read)?;

        documents
            .iter()
            .map(|document| Listing::from_document(document).map_err(ListingError::from))
            .collect()
    }
}

/// Range bounds emulating a prefix match against upper-cased names.
fn prefix_bounds(prefix: &str) -> (String, String) {
    let lower = prefix.trim().to_uppercase();
    let upper = format!("{lower}{PREFIX_SENTINEL}");
    (lower, upper)
}
