//! Public artist pages.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::platform::{Product, Profile};
use crate::state::AppState;

/// Artist page body.
#[derive(Debug, Serialize)]
pub struct ArtistPage {
    pub profile: Profile,
    pub products: Vec<Product>,
}

/// An artist's public profile and approved work.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ArtistPage>> {
    let mut profile = state.platform().get_profile_by_username(&username).await?;
    // Public page: never echo the contact address
    profile.email = None;
    let products = state.platform().products_by_artist(&profile.id).await?;
    Ok(Json(ArtistPage { profile, products }))
}
