//! Identity provider client.
//!
//! Email/password sign-up and sign-in against the Identity Toolkit REST
//! API. The provider issues stateless bearer tokens; sign-out is purely a
//! matter of discarding the token (the session layer's job), so no
//! endpoint exists for it here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use carlot_core::UserId;

use crate::config::FirebaseConfig;
use crate::firebase::api_error_message;

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password pair was rejected.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    EmailExists,

    /// The provider rejected the password as too weak.
    #[error("password rejected: {0}")]
    WeakPassword(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an unexpected error.
    #[error("identity provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A freshly authenticated identity.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The provider-assigned account id.
    pub uid: UserId,
    /// Account email.
    pub email: String,
    /// Display name, when one has been set.
    pub display_name: Option<String>,
    /// Bearer token for owner-scoped backend calls.
    pub id_token: String,
}

/// Client for the identity provider REST API.
///
/// Cheap to clone; the underlying HTTP client and endpoint are shared.
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<AuthClientInner>,
}

struct AuthClientInner {
    client: reqwest::Client,
    /// `{host}/v1/accounts`
    accounts_base: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
}

impl AuthClient {
    /// Create a new identity provider client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let accounts_base = format!("{}/v1/accounts", config.auth_host);

        Self {
            inner: Arc::new(AuthClientInner {
                client: reqwest::Client::new(),
                accounts_base,
                api_key: config.api_key.clone(),
            }),
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a rejected pair, or
    /// another error if the request fails.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let account = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(session_from(account, email))
    }

    /// Create an account and set its display name.
    ///
    /// The profile update is a second call on the fresh token; a failure
    /// there surfaces as an error even though the account already exists
    /// (the next sign-in simply has no display name yet).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailExists` or `AuthError::WeakPassword` for
    /// provider rejections, or another error if a request fails.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthSession, AuthError> {
        let created = self
            .call(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let updated = self
            .call(
                "update",
                &UpdateProfileRequest {
                    id_token: &created.id_token,
                    display_name,
                    return_secure_token: true,
                },
            )
            .await?;

        let mut session = session_from(updated, email);
        if session.display_name.is_none() {
            session.display_name = Some(display_name.to_owned());
        }
        Ok(session)
    }

    /// Issue one `accounts:{op}` call.
    async fn call<B: Serialize + Sync>(
        &self,
        op: &str,
        body: &B,
    ) -> Result<AccountResponse, AuthError> {
        let url = format!("{}:{op}", self.inner.accounts_base);

        let response = self
            .inner
            .client
            .post(&url)
            .query(&[("key", self.inner.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(map_api_error(status.as_u16(), &api_error_message(&text)));
        }

        serde_json::from_str(&text)
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %text.chars().take(500).collect::<String>(),
                    "Failed to parse identity response"
                );
            })
            .map_err(AuthError::Parse)
    }
}

fn session_from(account: AccountResponse, fallback_email: &str) -> AuthSession {
    AuthSession {
        uid: UserId::new(account.local_id),
        email: account.email.unwrap_or_else(|| fallback_email.to_owned()),
        display_name: account.display_name,
        id_token: account.id_token,
    }
}

/// The provider signals rejections through well-known message codes.
fn map_api_error(status: u16, message: &str) -> AuthError {
    match message {
        "EMAIL_EXISTS" => AuthError::EmailExists,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthError::InvalidCredentials
        }
        other if other.starts_with("WEAK_PASSWORD") => AuthError::WeakPassword(other.to_owned()),
        other => AuthError::Api {
            status,
            message: other.to_owned(),
        },
    }
}
