//! Authentication route handlers.
//!
//! Login, registration and logout against the identity provider. Errors
//! surface as redirect messages rendered as transient banners; the app
//! stays interactive after any failure.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::firebase::{AuthError, AuthSession};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, PendingImage, session_keys};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
    pub signed_in: bool,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub signed_in: bool,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().map(login_error_message),
        success: query.success.as_deref().map(|_| {
            "Account created. Welcome!".to_owned()
        }),
        signed_in: false,
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth().sign_in(&form.email, &form.password).await {
        Ok(auth_session) => start_session(&session, auth_session).await,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login failed: invalid credentials");
            Redirect::to("/auth/login?error=credentials").into_response()
        }
        Err(error) => {
            tracing::error!(error = %error, "Login failed");
            Redirect::to("/auth/login?error=failed").into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        error: query.error.as_deref().map(register_error_message),
        signed_in: false,
    }
}

/// Handle registration form submission.
///
/// Creates the account, sets the display name, and signs the user straight
/// in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    let name = form.name.trim();
    if name.is_empty() {
        return Redirect::to("/auth/register?error=name").into_response();
    }

    match state
        .auth()
        .sign_up(&form.email, &form.password, name)
        .await
    {
        Ok(auth_session) => start_session(&session, auth_session).await,
        Err(AuthError::EmailExists) => {
            Redirect::to("/auth/register?error=email_taken").into_response()
        }
        Err(AuthError::WeakPassword(_)) => {
            Redirect::to("/auth/register?error=weak_password").into_response()
        }
        Err(error) => {
            tracing::error!(error = %error, "Registration failed");
            Redirect::to("/auth/register?error=failed").into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout: discard the identity and any half-composed listing
/// photos, then go home.
pub async fn logout(session: Session) -> Response {
    if let Err(error) = clear_current_user(&session).await {
        tracing::error!(error = %error, "Failed to clear session on logout");
    }
    if let Err(error) = session
        .remove::<Vec<PendingImage>>(session_keys::PENDING_IMAGES)
        .await
    {
        tracing::error!(error = %error, "Failed to clear pending photos on logout");
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}

// =============================================================================
// Helpers
// =============================================================================

/// Store the fresh identity in the session and land on the dashboard.
async fn start_session(session: &Session, auth_session: AuthSession) -> Response {
    let user = CurrentUser {
        uid: auth_session.uid,
        display_name: auth_session
            .display_name
            .unwrap_or_else(|| auth_session.email.clone()),
        email: auth_session.email,
        id_token: auth_session.id_token,
    };

    if let Err(error) = set_current_user(session, &user).await {
        tracing::error!(error = %error, "Failed to set session");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    set_sentry_user(&user.uid, Some(&user.email));
    Redirect::to("/dashboard").into_response()
}

fn login_error_message(code: &str) -> String {
    match code {
        "credentials" => "Invalid email or password.",
        "session" => "Session expired, please try again.",
        _ => "Login failed, please try again.",
    }
    .to_owned()
}

fn register_error_message(code: &str) -> String {
    match code {
        "name" => "Tell us your name.",
        "email_taken" => "An account with this email already exists.",
        "weak_password" => "Pick a longer password (at least 6 characters).",
        _ => "Registration failed, please try again.",
    }
    .to_owned()
}
