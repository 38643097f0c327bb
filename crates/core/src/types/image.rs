//! Accepted photo formats for listing uploads.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a content type is not an accepted photo format.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unsupported image content type: {content_type}")]
pub struct ImageFormatError {
    /// The rejected content type.
    pub content_type: String,
}

/// A photo format accepted for listing uploads.
///
/// Only JPEG and PNG are accepted; anything else is rejected before a
/// single byte is sent to the object store.
///
/// ## Examples
///
/// ```
/// use carlot_core::ImageFormat;
///
/// assert!(ImageFormat::from_content_type("image/jpeg").is_ok());
/// assert!(ImageFormat::from_content_type("image/png").is_ok());
/// assert!(ImageFormat::from_content_type("image/gif").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    /// `image/jpeg`
    Jpeg,
    /// `image/png`
    Png,
}

impl ImageFormat {
    /// Parse an `ImageFormat` from a MIME content type.
    ///
    /// # Errors
    ///
    /// Returns [`ImageFormatError`] for any content type outside the
    /// accepted set.
    pub fn from_content_type(content_type: &str) -> Result<Self, ImageFormatError> {
        match content_type {
            "image/jpeg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            other => Err(ImageFormatError {
                content_type: other.to_owned(),
            }),
        }
    }

    /// The MIME content type for this format.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content_type())
    }
}
