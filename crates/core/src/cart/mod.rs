//! Device-local shopping cart.
//!
//! A cart is an ordered list of [`CartItem`]s, at most one per product,
//! stored as a JSON array under a single key. [`CartStore`] owns the
//! read-modify-write cycle; where the JSON actually lives is decided by the
//! [`CartPersistence`] implementation it was built with:
//!
//! - [`MemoryPersistence`] - in-process map, also used as a request-scoped
//!   snapshot of a web session
//! - [`FilePersistence`] - one file per key in a directory
//! - [`UnavailablePersistence`] - nothing to store into; reads are empty and
//!   writes are dropped
//!
//! # Example
//!
//! ```rust
//! use arthive_core::cart::{CartStore, MemoryPersistence, ProductSnapshot};
//! use rust_decimal::Decimal;
//!
//! let store = CartStore::new(MemoryPersistence::new());
//! let print = ProductSnapshot::new("p1", "Harbor Print", Decimal::from(100), "/img/p1.jpg");
//!
//! store.add(print.clone(), 2).unwrap();
//! store.add(print, 3).unwrap();
//!
//! let cart = store.read();
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart[0].quantity, 5);
//! ```

mod item;
mod persistence;
mod store;

pub use item::{CartItem, ProductSnapshot, cart_total, item_count};
pub use persistence::{
    CartPersistence, FilePersistence, MemoryPersistence, UnavailablePersistence,
};
pub use store::{CART_STORAGE_KEY, CartStore};

/// Errors surfaced by [`CartStore`] operations.
///
/// A missing storage medium is not an error; see [`UnavailablePersistence`].
#[derive(Debug, thiserror::Error)]
pub enum CartError<E>
where
    E: std::error::Error + 'static,
{
    /// The persistence backend failed to read or write.
    #[error("cart storage error: {0}")]
    Persistence(#[source] E),

    /// The cart could not be encoded as JSON.
    #[error("failed to encode cart: {0}")]
    Encode(#[source] serde_json::Error),

    /// The stored value is not a valid cart.
    #[error("stored cart is corrupted: {0}")]
    Corrupted(#[source] serde_json::Error),

    /// `add` was called with a quantity of zero.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}
