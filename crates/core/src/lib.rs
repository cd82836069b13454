//! ArtHive Core - Shared types and the device-local cart store.
//!
//! This crate provides the pieces shared by every ArtHive component:
//! - `storefront` - Public marketplace HTTP service
//! - `cli` - Command-line tools for local carts and moderation
//!
//! # Architecture
//!
//! The core crate does no network I/O. The cart store talks to its storage
//! only through the [`cart::CartPersistence`] capability, so it can run over
//! a web session snapshot, a directory on disk, or nothing at all.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, roles and statuses
//! - [`cart`] - Cart items, the cart store, and its persistence backends

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{CartError, CartItem, CartPersistence, CartStore, ProductSnapshot};
pub use types::*;
