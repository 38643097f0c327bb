//! New-listing composer route handlers.
//!
//! Publishing is a multi-step flow: photos upload one at a time into a
//! session-held pending set, then the form submit writes the record
//! referencing the already-stored blobs. The steps are not atomic; a
//! seller who walks away leaves orphaned blobs behind, and nothing
//! reclaims them.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use carlot_core::Phone;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{NewListing, PendingImage, session_keys};
use crate::routes::auth::MessageQuery;
use crate::services::{ListingError, OwnerContext};
use crate::state::AppState;

/// New-listing form data, unvalidated.
#[derive(Debug, Deserialize)]
pub struct NewListingForm {
    pub name: String,
    pub model: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub whatsapp: String,
    pub description: String,
}

/// One pending photo for the composer template.
#[derive(Clone)]
pub struct PendingView {
    pub name: String,
    pub preview_url: String,
}

/// New-listing composer template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/new.html")]
pub struct NewListingTemplate {
    pub images: Vec<PendingView>,
    pub error: Option<String>,
    pub signed_in: bool,
}

/// Display the composer with the photos uploaded so far.
pub async fn page(
    RequireAuth(_user): RequireAuth,
    session: Session,
    Query(query): Query<MessageQuery>,
) -> Result<NewListingTemplate> {
    let pending = pending_images(&session).await?;

    Ok(NewListingTemplate {
        images: pending
            .iter()
            .map(|p| PendingView {
                name: p.image.name.clone(),
                preview_url: p.preview_url.clone(),
            })
            .collect(),
        error: query.error.as_deref().map(error_message),
        signed_in: true,
    })
}

/// Upload one photo and append it to the pending set.
pub async fn upload(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("image") {
            let content_type = field.content_type().unwrap_or_default().to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            file = Some((content_type, bytes.to_vec()));
            break;
        }
    }

    let Some((content_type, bytes)) = file else {
        return Ok(Redirect::to("/dashboard/new?error=no_file").into_response());
    };

    let owner = OwnerContext::from(&user);
    match state.listings().upload_image(&owner, &content_type, bytes).await {
        Ok(uploaded) => {
            let mut pending = pending_images(&session).await?;
            pending.push(PendingImage {
                image: uploaded.image,
                preview_url: uploaded.preview_url,
            });
            store_pending(&session, &pending).await?;
            Ok(Redirect::to("/dashboard/new").into_response())
        }
        Err(ListingError::UnsupportedImageType(error)) => {
            tracing::warn!(error = %error, "Rejected photo upload");
            Ok(Redirect::to("/dashboard/new?error=format").into_response())
        }
        Err(error) => {
            tracing::error!(error = %error, "Photo upload failed");
            Ok(Redirect::to("/dashboard/new?error=upload_failed").into_response())
        }
    }
}

/// Remove one pending photo: delete the blob, then drop it from the
/// session. On a failed delete the pending set is left unchanged.
pub async fn delete_image(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(name): Path<String>,
) -> Result<Response> {
    let pending = pending_images(&session).await?;
    let Some(entry) = pending.iter().find(|p| p.image.name == name) else {
        return Ok(Redirect::to("/dashboard/new").into_response());
    };

    let owner = OwnerContext::from(&user);
    match state.listings().delete_image(&owner, &entry.image).await {
        Ok(()) => {
            let remaining: Vec<PendingImage> = pending
                .into_iter()
                .filter(|p| p.image.name != name)
                .collect();
            store_pending(&session, &remaining).await?;
            Ok(Redirect::to("/dashboard/new").into_response())
        }
        Err(error) => {
            tracing::error!(error = %error, "Failed to delete pending photo");
            Ok(Redirect::to("/dashboard/new?error=photo_delete").into_response())
        }
    }
}

/// Publish: validate the form, require at least one photo, write the
/// record, clear the pending set.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<NewListingForm>,
) -> Result<Response> {
    let new = match validate(form) {
        Ok(new) => new,
        Err(code) => {
            return Ok(Redirect::to(&format!("/dashboard/new?error={code}")).into_response());
        }
    };

    let pending = pending_images(&session).await?;
    if pending.is_empty() {
        return Ok(Redirect::to("/dashboard/new?error=no_photos").into_response());
    }
    let images = pending.into_iter().map(|p| p.image).collect();

    let owner = OwnerContext::from(&user);
    match state.listings().create_listing(&owner, new, images).await {
        Ok(id) => {
            session
                .remove::<Vec<PendingImage>>(session_keys::PENDING_IMAGES)
                .await
                .map_err(AppError::from)?;
            tracing::info!(listing = %id, "Listing published");
            Ok(Redirect::to("/dashboard?success=published").into_response())
        }
        Err(error) => {
            tracing::error!(error = %error, "Failed to publish listing");
            Ok(Redirect::to("/dashboard/new?error=publish_failed").into_response())
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// The photos uploaded so far in this session.
async fn pending_images(session: &Session) -> Result<Vec<PendingImage>> {
    Ok(session
        .get::<Vec<PendingImage>>(session_keys::PENDING_IMAGES)
        .await
        .map_err(AppError::from)?
        .unwrap_or_default())
}

async fn store_pending(session: &Session, pending: &Vec<PendingImage>) -> Result<()> {
    session
        .insert(session_keys::PENDING_IMAGES, pending)
        .await
        .map_err(AppError::from)
}

/// Every text field is required; the phone number must be 11-12 digits.
fn validate(form: NewListingForm) -> std::result::Result<NewListing, &'static str> {
    let required = [
        (&form.name, "name"),
        (&form.model, "model"),
        (&form.year, "year"),
        (&form.km, "km"),
        (&form.price, "price"),
        (&form.city, "city"),
        (&form.description, "description"),
    ];
    for (value, code) in required {
        if value.trim().is_empty() {
            return Err(code);
        }
    }

    let whatsapp = Phone::parse(form.whatsapp.trim()).map_err(|_| "whatsapp")?;

    Ok(NewListing {
        name: form.name.trim().to_owned(),
        model: form.model.trim().to_owned(),
        year: form.year.trim().to_owned(),
        km: form.km.trim().to_owned(),
        price: form.price.trim().to_owned(),
        city: form.city.trim().to_owned(),
        whatsapp,
        description: form.description.trim().to_owned(),
    })
}

fn error_message(code: &str) -> String {
    match code {
        "no_file" => "Pick a photo to upload.",
        "format" => "Send a JPEG or PNG image.",
        "upload_failed" => "Photo upload failed, please try again.",
        "photo_delete" => "Could not remove that photo, please try again.",
        "no_photos" => "Send at least one photo.",
        "publish_failed" => "Could not publish the listing, please try again.",
        "whatsapp" => "That phone number doesn't look right (digits only, with area code).",
        "name" | "model" | "year" | "km" | "price" | "city" | "description" => {
            "Fill in every field."
        }
        _ => "Something went wrong, please try again.",
    }
    .to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete_form() -> NewListingForm {
        NewListingForm {
            name: "Onix 1.0".to_owned(),
            model: "1.0 flex plus manual".to_owned(),
            year: "2024/2024".to_owned(),
            km: "23100".to_owned(),
            price: "46.700".to_owned(),
            city: "Recife - PE".to_owned(),
            whatsapp: "81988880000".to_owned(),
            description: "Well kept.".to_owned(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let new = validate(complete_form()).unwrap();
        assert_eq!(new.name, "Onix 1.0");
        assert_eq!(new.whatsapp.as_str(), "81988880000");
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut form = complete_form();
        form.city = "   ".to_owned();
        assert!(matches!(validate(form), Err("city")));
    }

    #[test]
    fn test_validate_rejects_bad_phone() {
        let mut form = complete_form();
        form.whatsapp = "not-a-phone".to_owned();
        assert!(matches!(validate(form), Err("whatsapp")));
    }
}
