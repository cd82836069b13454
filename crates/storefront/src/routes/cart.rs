//! Cart route handlers.
//!
//! The cart lives in the visitor's session as the same JSON array the CLI
//! writes to disk. Each request lifts it into a [`CartStore`] over a
//! [`MemoryPersistence`] snapshot, runs one operation, and writes the
//! snapshot back to the session.

use axum::{Form, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use arthive_core::cart::{CartItem, CartStore, MemoryPersistence, ProductSnapshot};
use arthive_core::{Price, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;

// =============================================================================
// Session Helpers
// =============================================================================

/// A cart loaded from a session for the span of one request.
struct SessionCart {
    session: Session,
    store: CartStore<MemoryPersistence>,
}

impl SessionCart {
    async fn load(session: Session) -> Result<Self> {
        let raw: Option<String> = session.get(session_keys::CART).await?;
        let store = CartStore::new(MemoryPersistence::seeded(session_keys::CART, raw));
        Ok(Self { session, store })
    }

    /// Write the snapshot back, dropping the session key if the cart was cleared.
    async fn commit(self) -> Result<CartView> {
        let key = self.store.key();
        match self.store.persistence().entry(key) {
            Some(raw) => self.session.insert(key, raw).await?,
            None => {
                self.session.remove::<String>(key).await?;
            }
        }
        Ok(CartView::from_items(self.store.read()))
    }
}

// =============================================================================
// Views
// =============================================================================

/// One cart line with its computed total.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: CartItem,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
}

/// Cart response body.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub total_display: String,
}

impl CartView {
    fn from_items(items: Vec<CartItem>) -> Self {
        let item_count = arthive_core::cart::item_count(&items);
        let total = arthive_core::cart::cart_total(&items);
        Self {
            items: items
                .into_iter()
                .map(|item| CartLineView {
                    line_total: item.line_total(),
                    item,
                })
                .collect(),
            item_count,
            total,
            total_display: Price::store(total).to_string(),
        }
    }
}

/// Cart badge body.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartCount {
    pub count: u32,
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data: the product snapshot shown on the page.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: ProductId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: ProductId,
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = SessionCart::load(session).await?;
    Ok(Json(CartView::from_items(cart.store.read())))
}

/// Add a product to the cart.
#[instrument(skip(session))]
pub async fn add(session: Session, Form(form): Form<AddToCartForm>) -> Result<Json<CartView>> {
    if form.price.is_sign_negative() {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }

    let product_id = form.id.to_string();
    let snapshot = ProductSnapshot::new(form.id, form.title, form.price, form.image_url);

    let cart = SessionCart::load(session).await?;
    cart.store.add(snapshot, form.quantity.unwrap_or(1))?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    Ok(Json(cart.commit().await?))
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Json<CartView>> {
    let cart = SessionCart::load(session).await?;
    cart.store.update_quantity(&form.id, form.quantity)?;
    Ok(Json(cart.commit().await?))
}

/// Remove a product from the cart.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Json<CartView>> {
    let cart = SessionCart::load(session).await?;
    cart.store.remove(&form.id)?;
    Ok(Json(cart.commit().await?))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let cart = SessionCart::load(session).await?;
    cart.store.clear()?;
    Ok(Json(cart.commit().await?))
}

/// Units in the cart, for the header badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = SessionCart::load(session).await?;
    Ok(Json(CartCount {
        count: cart.store.item_count(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_view_totals() {
        let items = vec![
            CartItem::from_snapshot(ProductSnapshot::new("a", "A", Decimal::from(100), ""), 1),
            CartItem::from_snapshot(ProductSnapshot::new("b", "B", Decimal::from(50), ""), 2),
        ];
        let view = CartView::from_items(items);

        assert_eq!(view.item_count, 3);
        assert_eq!(view.total, Decimal::from(200));
        assert_eq!(view.total_display, "₱200.00");
        assert_eq!(view.items[1].line_total, Decimal::from(100));
    }

    #[test]
    fn test_cart_view_json_shape() {
        let items = vec![CartItem::from_snapshot(
            ProductSnapshot::new("a", "A", Decimal::new(1050, 2), "/a.jpg"),
            2,
        )];
        let json = serde_json::to_value(CartView::from_items(items)).unwrap();

        assert_eq!(json["items"][0]["id"], "a");
        assert_eq!(json["items"][0]["quantity"], 2);
        assert_eq!(json["items"][0]["line_total"], 21.0);
        assert_eq!(json["total"], 21.0);
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::from_items(Vec::new());
        assert_eq!(view.item_count, 0);
        assert_eq!(view.total, Decimal::ZERO);
        assert!(view.items.is_empty());
    }
}
