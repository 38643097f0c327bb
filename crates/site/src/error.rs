//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::firebase::AuthError;
use crate::services::ListingError;

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// Listing operation failed.
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated or not the owner.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures of the backend or this process, as opposed to
    /// client mistakes.
    fn is_server_class(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Listing(listing) => matches!(
                listing,
                ListingError::Storage(_)
                    | ListingError::Read(_)
                    | ListingError::Write(_)
                    | ListingError::Decode(_)
            ),
            Self::Auth(auth) => matches!(
                auth,
                AuthError::Http(_) | AuthError::Api { .. } | AuthError::Parse(_)
            ),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_class() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Listing(listing) => match listing {
                ListingError::UnsupportedImageType(_) | ListingError::NoImages => {
                    StatusCode::BAD_REQUEST
                }
                ListingError::Storage(_)
                | ListingError::Read(_)
                | ListingError::Write(_)
                | ListingError::Decode(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Auth(auth) => match auth {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose backend error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_owned(),
            Self::Listing(listing) => match listing {
                ListingError::UnsupportedImageType(_) => {
                    "Send a JPEG or PNG image".to_owned()
                }
                ListingError::NoImages => "Send at least one photo".to_owned(),
                _ => "External service error".to_owned(),
            },
            Self::Auth(auth) => match auth {
                AuthError::InvalidCredentials => "Invalid email or password".to_owned(),
                AuthError::EmailExists => {
                    "An account with this email already exists".to_owned()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                _ => "Authentication error".to_owned(),
            },
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<tower_sessions::session::Error> for AppError {
    fn from(error: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {error}"))
    }
}

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
