//! Artist product submissions.

use axum::{
    Json,
    extract::{Multipart, State},
};
use rust_decimal::Decimal;
use tracing::instrument;

use arthive_core::ProductStatus;

use crate::error::{AppError, Result};
use crate::middleware::RequireArtist;
use crate::platform::{NewProduct, PRODUCT_IMAGES_BUCKET, Product};
use crate::state::AppState;

use super::upload::MultipartForm;

/// Build a pending submission from form fields.
fn new_product(form: &MultipartForm, artist: &arthive_core::ProfileId) -> Result<NewProduct> {
    let title = form
        .text("title")
        .ok_or_else(|| AppError::BadRequest("Title is required".to_string()))?;
    let price: Decimal = form
        .text("price")
        .ok_or_else(|| AppError::BadRequest("Price is required".to_string()))?
        .parse()
        .map_err(|_| AppError::BadRequest("Price must be a number".to_string()))?;
    if price.is_sign_negative() {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }

    Ok(NewProduct {
        title: title.to_owned(),
        description: form.text("description").map(str::to_owned),
        price,
        image_url: form.text("image_url").unwrap_or_default().to_owned(),
        artist_id: artist.clone(),
        status: ProductStatus::Pending,
    })
}

/// The artist's own products in every status.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_products(
    State(state): State<AppState>,
    RequireArtist(user): RequireArtist,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(
        state
            .platform()
            .my_products(&user.access_token, &user.id)
            .await?,
    ))
}

/// Submit a new product for review.
///
/// Multipart fields: `title`, `price`, optional `description`, and either an
/// `image` file or an `image_url`. New products start as pending.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn submit_product(
    State(state): State<AppState>,
    RequireArtist(user): RequireArtist,
    multipart: Multipart,
) -> Result<Json<Product>> {
    let form = MultipartForm::read(multipart, "image").await?;
    let mut product = new_product(&form, &user.id)?;

    if let Some(image) = form.image {
        let path = image.object_path(&user.id);
        let url = state
            .platform()
            .upload_object(
                &user.access_token,
                PRODUCT_IMAGES_BUCKET,
                &path,
                image.bytes,
                &image.content_type,
            )
            .await?;
        product.image_url = url.to_string();
    }

    let created = state
        .platform()
        .create_product(&user.access_token, &product)
        .await?;
    tracing::info!(product_id = %created.id, "Product submitted for review");
    Ok(Json(created))
}
