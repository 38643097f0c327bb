//! Listing detail route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};

use carlot_core::ListingId;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Listing;
use crate::state::AppState;

/// Listing detail data for the template.
#[derive(Clone)]
pub struct CarView {
    pub name: String,
    pub model: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub whatsapp: String,
    pub description: String,
    pub owner: String,
    pub image_urls: Vec<String>,
}

impl From<&Listing> for CarView {
    fn from(listing: &Listing) -> Self {
        Self {
            name: listing.name.clone(),
            model: listing.model.clone(),
            year: listing.year.clone(),
            km: listing.km.clone(),
            price: listing.price.clone(),
            city: listing.city.clone(),
            whatsapp: listing.whatsapp.clone(),
            description: listing.description.clone(),
            owner: listing.owner.clone(),
            image_urls: listing.images.iter().map(|image| image.url.clone()).collect(),
        }
    }
}

/// Listing detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "cars/show.html")]
pub struct CarShowTemplate {
    pub car: CarView,
    pub whatsapp_link: String,
    pub signed_in: bool,
}

/// Display a listing detail page; a missing record redirects home.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<String>,
) -> Result<Response> {
    let Some(listing) = state.listings().get(&ListingId::new(id)).await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let whatsapp_link = whatsapp_link(&listing.whatsapp, &listing.name);
    Ok(CarShowTemplate {
        car: CarView::from(&listing),
        whatsapp_link,
        signed_in: user.is_some(),
    }
    .into_response())
}

/// Deep link that opens a chat with the seller, message prefilled.
fn whatsapp_link(phone: &str, listing_name: &str) -> String {
    let text = format!("Hello! I saw the {listing_name} listing and I'm interested.");
    format!(
        "https://api.whatsapp.com/send?phone={phone}&text={}",
        urlencoding::encode(&text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatsapp_link_encodes_message() {
        let link = whatsapp_link("81988880000", "ONIX 1.0");
        assert!(link.starts_with("https://api.whatsapp.com/send?phone=81988880000&text="));
        assert!(link.contains("ONIX%201.0"));
        assert!(!link.contains(' '));
    }
}
