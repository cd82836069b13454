//! Client for the hosted backend platform.
//!
//! # Architecture
//!
//! The platform owns every piece of shared data: the relational tables
//! (`products`, `profiles`, `colonies`, `product_colony`), the identity
//! provider, and the object-storage buckets (`avatars`, `product-images`).
//! This module is a typed request/response wrapper over its three HTTP
//! APIs:
//!
//! - `/rest/v1/<table>` - row queries using `col=eq.value` filters
//! - `/auth/v1/*` - sign-up, sign-in, sign-out, current user
//! - `/storage/v1/object/<bucket>/<path>` - uploads and public URLs
//!
//! Catalog reads are cached in memory via `moka`; any product mutation made
//! through this client drops the cache. Nothing is retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use arthive_storefront::platform::PlatformClient;
//!
//! let client = PlatformClient::new(&config.platform);
//! let products = client.list_products().await?;
//! let colony = client.get_colony("ceramics").await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::{AVATARS_BUCKET, PRODUCT_IMAGES_BUCKET, PlatformClient};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials were missing, wrong, or lacked permission.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// Pull a human-readable message out of an error body.
///
/// The REST, auth and storage APIs each use a different key for it.
pub(crate) fn error_message(body: &str) -> String {
    const KEYS: &[&str] = &["message", "msg", "error_description", "error"];

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in KEYS {
            if let Some(serde_json::Value::String(message)) = map.get(*key)
                && !message.is_empty()
            {
                return message.clone();
            }
        }
    }

    if body.trim().is_empty() {
        return "(empty response body)".to_string();
    }
    body.chars().take(200).collect()
}
