//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Listing;
use crate::state::AppState;

/// Listing card data for grid templates.
#[derive(Clone)]
pub struct CardView {
    pub id: String,
    pub name: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub cover_url: String,
}

impl From<&Listing> for CardView {
    fn from(listing: &Listing) -> Self {
        Self {
            id: listing.id.to_string(),
            name: listing.name.clone(),
            year: listing.year.clone(),
            km: listing.km.clone(),
            price: listing.price.clone(),
            city: listing.city.clone(),
            cover_url: listing
                .cover()
                .map(|image| image.url.clone())
                .unwrap_or_default(),
        }
    }
}

/// Search box query parameter.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub cars: Vec<CardView>,
    pub query: String,
    pub signed_in: bool,
}

/// Display the home page: every listing newest-first, or the name-prefix
/// search results when a term was entered.
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<SearchQuery>,
) -> Result<HomeTemplate> {
    let term = query.q.unwrap_or_default();

    let listings = if term.trim().is_empty() {
        state.listings().list_all().await?
    } else {
        state.listings().search_by_name_prefix(&term).await?
    };

    Ok(HomeTemplate {
        cars: listings.iter().map(CardView::from).collect(),
        query: term,
        signed_in: user.is_some(),
    })
}
