//! Records exchanged with the hosted backend.
//!
//! Field names follow the backend's column names so these types
//! deserialize straight from REST responses.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use arthive_core::{ColonyId, ProductId, ProductStatus, ProfileId, UserRole};

// =============================================================================
// Catalog
// =============================================================================

/// A product listed by an artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub artist_id: Option<ProfileId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A themed grouping of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colony {
    pub id: ColonyId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// One row of the `product_colony` join with its embedded product.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ColonyProductRow {
    #[serde(default)]
    pub products: Option<Product>,
}

/// New product submitted by an artist.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: String,
    pub artist_id: ProfileId,
    pub status: ProductStatus,
}

/// Partial update to a product. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
}

impl ProductUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
            && self.status.is_none()
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// Marketplace profile linked one-to-one with an identity-provider user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub artist_request: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Public slice of a profile shown next to products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistSummary {
    pub id: ProfileId,
    #[serde(default)]
    pub username: Option<String>,
}

/// Row inserted when a profile is first created.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: ProfileId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub role: UserRole,
    pub artist_request: bool,
}

/// Partial update to a profile.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_request: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
            && self.artist_request.is_none()
            && self.role.is_none()
    }
}

// =============================================================================
// Identity
// =============================================================================

/// User record from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: ProfileId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens issued on sign-in.
///
/// `Debug` is implemented manually to keep tokens out of logs.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish()
    }
}

/// Sign-up returns a session when email confirmation is off, or just the
/// user when a confirmation mail was sent.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    Session(AuthSession),
    ConfirmationRequired(AuthUser),
}

impl SignUpOutcome {
    #[must_use]
    pub const fn user(&self) -> &AuthUser {
        match self {
            Self::Session(session) => &session.user,
            Self::ConfirmationRequired(user) => user,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_tolerates_sparse_rows() {
        let raw = r#"{"id":"p1","title":"Koi","price":120.5}"#;
        let product: Product = serde_json::from_str(raw).unwrap();
        assert_eq!(product.price, Decimal::new(1205, 1));
        assert_eq!(product.status, ProductStatus::Pending);
        assert!(!product.featured);
        assert!(product.artist_id.is_none());
    }

    #[test]
    fn test_product_update_skips_unset_fields() {
        let update = ProductUpdate {
            status: Some(ProductStatus::Approved),
            ..ProductUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"status": "approved"}));
        assert!(ProductUpdate::default().is_empty());
    }

    #[test]
    fn test_product_update_price_is_numeric() {
        let update = ProductUpdate {
            price: Some(Decimal::new(999, 2)),
            ..ProductUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert!(json["price"].is_number());
    }

    #[test]
    fn test_sign_up_outcome_variants() {
        let session = r#"{"access_token":"t","user":{"id":"u1","email":"a@b.co"}}"#;
        let outcome: SignUpOutcome = serde_json::from_str(session).unwrap();
        assert!(matches!(outcome, SignUpOutcome::Session(_)));

        let user = r#"{"id":"u2","email":"c@d.co","confirmation_sent_at":"2024-01-01T00:00:00Z"}"#;
        let outcome: SignUpOutcome = serde_json::from_str(user).unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));
        assert_eq!(outcome.user().id.as_str(), "u2");
    }

    #[test]
    fn test_auth_session_debug_redacts_tokens() {
        let session: AuthSession = serde_json::from_str(
            r#"{"access_token":"very-secret","refresh_token":"also-secret","user":{"id":"u"}}"#,
        )
        .unwrap();
        let debug = format!("{session:?}");
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("also-secret"));
    }
}
