//! Local cart commands.
//!
//! The cart is kept in `<store-dir>/arthive-cart` as the same JSON array the
//! storefront keeps in its sessions.
//!
//! # Usage
//!
//! ```bash
//! arthive cart add --id p1 --title "Harbor Print" --price 100 --quantity 2
//! arthive cart update p1 5
//! arthive cart list
//! arthive cart remove p1
//! arthive cart clear
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

use arthive_core::cart::{CartStore, FilePersistence, ProductSnapshot};
use arthive_core::{CartError, CartItem, Price, ProductId};

/// Errors from cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// The store directory could not be opened.
    #[error("cannot open cart directory {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError<std::io::Error>),

    /// Prices must not be negative.
    #[error("price cannot be negative: {0}")]
    NegativePrice(Decimal),
}

/// Product fields for `cart add`.
#[derive(Debug, Clone)]
pub struct AddArgs {
    pub id: String,
    pub title: String,
    pub price: Decimal,
    pub image_url: String,
    pub quantity: u32,
}

/// Open the file-backed cart under `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn open(dir: &Path) -> Result<CartStore<FilePersistence>, CartCommandError> {
    let persistence = FilePersistence::open(dir).map_err(|source| CartCommandError::Open {
        path: dir.display().to_string(),
        source,
    })?;
    Ok(CartStore::new(persistence))
}

/// Cart summary as printed by every command.
#[must_use]
pub fn summary(items: &[CartItem]) -> serde_json::Value {
    let total = arthive_core::cart::cart_total(items);
    json!({
        "items": items,
        "item_count": arthive_core::cart::item_count(items),
        "total": Price::store(total).to_string(),
    })
}

/// Current cart, surfacing corruption instead of hiding it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a cart.
pub fn list(store: &CartStore<FilePersistence>) -> Result<Vec<CartItem>, CartCommandError> {
    Ok(store.try_read()?)
}

/// Add a product.
///
/// # Errors
///
/// Returns an error for a negative price, zero quantity or failed write.
pub fn add(
    store: &CartStore<FilePersistence>,
    args: AddArgs,
) -> Result<Vec<CartItem>, CartCommandError> {
    if args.price.is_sign_negative() {
        return Err(CartCommandError::NegativePrice(args.price));
    }
    let snapshot = ProductSnapshot::new(args.id, args.title, args.price, args.image_url);
    store.add(snapshot, args.quantity)?;
    tracing::debug!(dir = %store.persistence().dir().display(), "Cart updated");
    Ok(store.read())
}

/// Remove a product.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn remove(
    store: &CartStore<FilePersistence>,
    id: &str,
) -> Result<Vec<CartItem>, CartCommandError> {
    store.remove(&ProductId::new(id))?;
    Ok(store.read())
}

/// Set a product's quantity; zero removes it.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn update(
    store: &CartStore<FilePersistence>,
    id: &str,
    quantity: u32,
) -> Result<Vec<CartItem>, CartCommandError> {
    store.update_quantity(&ProductId::new(id), quantity)?;
    Ok(store.read())
}

/// Delete the cart file.
///
/// # Errors
///
/// Returns an error if the file cannot be removed.
pub fn clear(store: &CartStore<FilePersistence>) -> Result<Vec<CartItem>, CartCommandError> {
    store.clear()?;
    Ok(Vec::new())
}
