//! Admin moderation: user roles and product review.

use axum::{
    Form, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use arthive_core::{ProductId, ProductStatus, ProfileId, UserRole};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::moderation::{RoleFilter, StatusFilter, filter_products, filter_profiles};
use crate::platform::{Product, Profile};
use crate::state::AppState;

/// Query string for the users tab.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub role: Option<String>,
    pub q: Option<String>,
}

/// Query string for the products tab.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

/// Role change form.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: UserRole,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: ProductStatus,
}

/// Profiles filtered by role and a username/email search.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<Profile>>> {
    let role = RoleFilter::parse(query.role.as_deref()).map_err(AppError::BadRequest)?;
    let profiles = state.platform().list_profiles(&admin.access_token).await?;
    Ok(Json(filter_profiles(
        profiles,
        role,
        query.q.as_deref().unwrap_or_default(),
    )))
}

/// Change a user's role. Granting or revoking clears any pending request.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProfileId>,
    Form(form): Form<RoleForm>,
) -> Result<Json<Profile>> {
    if id == admin.id && form.role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "Admins cannot demote themselves".to_string(),
        ));
    }

    let update = crate::platform::ProfileUpdate {
        role: Some(form.role),
        artist_request: Some(false),
        ..Default::default()
    };
    let profile = state
        .platform()
        .update_profile(&admin.access_token, &id, &update)
        .await?;

    tracing::info!(profile_id = %id, role = %form.role, "Role changed");
    add_breadcrumb(
        "admin",
        "Role changed",
        Some(&[("profile_id", id.as_str()), ("role", form.role.as_str())]),
    );
    Ok(Json(profile))
}

/// Products in any status, filtered by status and a title search.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let status = StatusFilter::parse(query.status.as_deref()).map_err(AppError::BadRequest)?;
    let products = state.platform().list_all_products(&admin.access_token).await?;
    Ok(Json(filter_products(
        products,
        status,
        query.q.as_deref().unwrap_or_default(),
    )))
}

/// Approve, reject or re-queue a product.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Form(form): Form<StatusForm>,
) -> Result<Json<Product>> {
    let product = state
        .platform()
        .set_product_status(&admin.access_token, &id, form.status)
        .await?;

    tracing::info!(product_id = %id, status = %form.status, "Product status changed");
    add_breadcrumb(
        "admin",
        "Product status changed",
        Some(&[("product_id", id.as_str()), ("status", form.status.as_str())]),
    );
    Ok(Json(product))
}

/// Delete a product permanently.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<serde_json::Value>> {
    state
        .platform()
        .delete_product(&admin.access_token, &id)
        .await?;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(serde_json::json!({ "deleted": id })))
}
