//! Domain models for the storefront.
//!
//! Catalog and profile rows live in [`crate::platform::types`]; this module
//! only holds what the storefront keeps in its own session.

mod session;

pub use session::{CurrentUser, keys as session_keys};
