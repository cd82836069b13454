//! Product route handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use rust_decimal::Decimal;
use tracing::instrument;

use arthive_core::{ProductId, ProductStatus};

use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireArtist};
use crate::models::CurrentUser;
use crate::moderation::{ProductWithArtist, attach_artists};
use crate::platform::{PRODUCT_IMAGES_BUCKET, Product, ProductUpdate};
use crate::state::AppState;

use super::upload::MultipartForm;

/// Product edit form. Blank fields are left unchanged.
#[derive(Debug, Default)]
pub struct EditProductForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
}

impl EditProductForm {
    /// Collect the text fields of a multipart edit form.
    ///
    /// # Errors
    ///
    /// Rejects a price that is not a number.
    pub fn from_multipart(form: &MultipartForm) -> Result<Self> {
        let price = form
            .text("price")
            .map(str::parse::<Decimal>)
            .transpose()
            .map_err(|_| AppError::BadRequest("Price must be a number".to_string()))?;

        Ok(Self {
            title: form.text("title").map(str::to_owned),
            description: form.text("description").map(str::to_owned),
            price,
            image_url: form.text("image_url").map(str::to_owned),
        })
    }

    /// Turn the form into a platform update.
    ///
    /// # Errors
    ///
    /// Rejects a negative price or a form with nothing to change.
    pub fn into_update(self) -> Result<ProductUpdate> {
        let non_blank = |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());

        if self.price.is_some_and(|p| p.is_sign_negative()) {
            return Err(AppError::BadRequest("Price cannot be negative".to_string()));
        }

        let update = ProductUpdate {
            title: non_blank(self.title),
            description: non_blank(self.description),
            price: self.price,
            image_url: non_blank(self.image_url),
            status: None,
        };

        if update.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }
        Ok(update)
    }
}

/// Whether `user` may see or edit a product outside the public catalog.
fn owns(user: &CurrentUser, product: &Product) -> bool {
    user.role.is_admin() || product.artist_id.as_ref() == Some(&user.id)
}

/// Product detail.
///
/// Pending and rejected products are only visible to their artist and to
/// admins; everyone else gets a 404.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductWithArtist>> {
    let product = state.platform().get_product(&id).await?;

    let visible = product.status == ProductStatus::Approved
        || user.as_ref().is_some_and(|u| owns(u, &product));
    if !visible {
        return Err(AppError::NotFound(format!("Product not found: {id}")));
    }

    let artists = state.platform().list_artists().await?;
    let mut enriched = attach_artists(vec![product], &artists);
    enriched
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("product lost during enrichment".to_string()))
}

/// Edit one of the artist's own products. A new image replaces the old
/// one.
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
pub async fn edit(
    State(state): State<AppState>,
    RequireArtist(user): RequireArtist,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Json<Product>> {
    let form = MultipartForm::read(multipart, "image").await?;
    let mut edit = EditProductForm::from_multipart(&form)?;

    let product = state.platform().get_product(&id).await?;
    if !owns(&user, &product) {
        return Err(AppError::Forbidden(
            "You can only edit your own products".to_string(),
        ));
    }

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
        edit.image_url = Some(url.to_string());
    }
    let update = edit.into_update()?;

    let updated = state
        .platform()
        .update_product(&user.access_token, &id, &update)
        .await?;
    tracing::info!(product_id = %id, "Product edited");
    Ok(Json(updated))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use arthive_core::{Email, ProfileId, UserRole};

    use super::*;

    fn user(id: &str, role: UserRole) -> CurrentUser {
        CurrentUser {
            id: ProfileId::new(id),
            email: Email::parse("a@b.co").unwrap(),
            role,
            access_token: "t".to_string(),
        }
    }

    fn product(artist: Option<&str>) -> Product {
        Product {
            id: "p1".into(),
            title: "T".to_string(),
            description: None,
            price: Decimal::from(10),
            image_url: String::new(),
            featured: false,
            status: ProductStatus::Pending,
            artist_id: artist.map(ProfileId::new),
            created_at: None,
        }
    }

    #[test]
    fn test_owns() {
        assert!(owns(&user("u1", UserRole::Artist), &product(Some("u1"))));
        assert!(!owns(&user("u2", UserRole::Artist), &product(Some("u1"))));
        assert!(!owns(&user("u2", UserRole::Artist), &product(None)));
        assert!(owns(&user("boss", UserRole::Admin), &product(Some("u1"))));
    }

    #[test]
    fn test_edit_form_blank_fields_are_skipped() {
        let form = EditProductForm {
            title: Some("  New title ".to_string()),
            description: Some("   ".to_string()),
            ..EditProductForm::default()
        };
        let update = form.into_update().unwrap();
        assert_eq!(update.title.as_deref(), Some("New title"));
        assert!(update.description.is_none());
    }

    #[test]
    fn test_edit_form_rejects_empty_and_negative() {
        assert!(EditProductForm::default().into_update().is_err());

        let form = EditProductForm {
            price: Some(Decimal::from(-5)),
            ..EditProductForm::default()
        };
        assert!(matches!(form.into_update(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_edit_form_from_multipart() {
        let form = MultipartForm {
            fields: vec![
                ("title".to_string(), " Koi ".to_string()),
                ("price".to_string(), "12.50".to_string()),
                ("description".to_string(), String::new()),
            ],
            image: None,
        };
        let edit = EditProductForm::from_multipart(&form).unwrap();
        assert_eq!(edit.title.as_deref(), Some("Koi"));
        assert_eq!(edit.price, Some(Decimal::new(1250, 2)));
        assert!(edit.description.is_none());

        let bad = MultipartForm {
            fields: vec![("price".to_string(), "cheap".to_string())],
            image: None,
        };
        assert!(matches!(
            EditProductForm::from_multipart(&bad),
            Err(AppError::BadRequest(_))
        ));
    }
}
