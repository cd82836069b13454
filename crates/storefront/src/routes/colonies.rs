//! Colony route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::platform::{Colony, Product};
use crate::state::AppState;

/// Colony detail body.
#[derive(Debug, Serialize)]
pub struct ColonyDetail {
    pub colony: Colony,
    pub products: Vec<Product>,
}

/// List all colonies.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Colony>>> {
    Ok(Json(state.platform().list_colonies().await?))
}

/// One colony and its approved products. Unknown slugs are 404.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ColonyDetail>> {
    let colony = state.platform().get_colony(&slug).await?;
    let products = state.platform().colony_products(&colony).await?;
    Ok(Json(ColonyDetail { colony, products }))
}
