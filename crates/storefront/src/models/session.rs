//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use arthive_core::{Email, ProfileId, UserRole};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in user and to
/// call the platform on their behalf. Implements `Debug` manually to redact
/// the access token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Platform user ID (also the profile ID).
    pub id: ProfileId,
    /// User's email address.
    pub email: Email,
    /// Last known role. Role-gated extractors refresh it from the profile.
    pub role: UserRole,
    /// Platform access token for row-level-security scoped calls.
    pub access_token: String,
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cart JSON array. Shares its name with the file-backed
    /// store so a cart exported from one reads in the other.
    pub const CART: &str = arthive_core::cart::CART_STORAGE_KEY;
}
