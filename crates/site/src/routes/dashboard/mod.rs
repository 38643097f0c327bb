//! Seller dashboard route handlers.

pub mod new;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};

use carlot_core::ListingId;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::auth::MessageQuery;
use crate::routes::home::CardView;
use crate::services::OwnerContext;
use crate::state::AppState;

/// Dashboard page template: the seller's own listings.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/index.html")]
pub struct DashboardTemplate {
    pub cars: Vec<CardView>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub signed_in: bool,
}

/// Display the signed-in seller's listings.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<DashboardTemplate> {
    let listings = state.listings().list_by_owner(&user.uid).await?;

    Ok(DashboardTemplate {
        cars: listings.iter().map(CardView::from).collect(),
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().map(success_message),
        signed_in: true,
    })
}

/// Delete one of the seller's listings: the record first, then every photo
/// blob best-effort.
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    let Some(listing) = state.listings().get(&ListingId::new(id)).await? else {
        return Ok(Redirect::to("/dashboard?error=missing").into_response());
    };

    if listing.uid != user.uid {
        tracing::warn!(listing = %listing.id, uid = %user.uid, "Refused delete of another seller's listing");
        return Ok(Redirect::to("/dashboard?error=not_yours").into_response());
    }

    let owner = OwnerContext::from(&user);
    let outcome = state.listings().delete_listing(&owner, &listing).await?;

    let target = if outcome.is_clean() {
        "/dashboard?success=deleted"
    } else {
        // Record is gone either way; some photos stayed behind.
        "/dashboard?success=deleted_partial"
    };
    Ok(Redirect::to(target).into_response())
}

fn error_message(code: &str) -> String {
    match code {
        "missing" => "That listing no longer exists.",
        "not_yours" => "That listing belongs to another seller.",
        _ => "Something went wrong, please try again.",
    }
    .to_owned()
}

fn success_message(code: &str) -> String {
    match code {
        "published" => "Listing published!",
        "deleted" => "Listing deleted.",
        "deleted_partial" => "Listing deleted; some photos could not be removed.",
        _ => "Done.",
    }
    .to_owned()
}
