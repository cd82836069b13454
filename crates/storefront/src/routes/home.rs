//! Home feed.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::moderation::{ProductWithArtist, attach_artists};
use crate::state::AppState;

/// Home feed body.
#[derive(Debug, Serialize)]
pub struct HomeFeed {
    pub featured: Vec<ProductWithArtist>,
    pub products: Vec<ProductWithArtist>,
}

/// Featured and newest approved products, each labelled with its artist.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeFeed>> {
    let platform = state.platform();
    let (products, artists) = tokio::try_join!(platform.list_products(), platform.list_artists())?;

    let products = attach_artists(products, &artists);
    let featured = products
        .iter()
        .filter(|p| p.product.featured)
        .cloned()
        .collect();

    Ok(Json(HomeFeed { featured, products }))
}
