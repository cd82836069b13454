//! Role and status enums shared with the hosted backend.
//!
//! Both enums serialize as the lowercase strings stored in the `profiles.role`
//! and `products.status` columns.

use serde::{Deserialize, Serialize};

/// Marketplace role of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Buyer. Every new profile starts here.
    #[default]
    User,
    /// May submit and edit their own products.
    Artist,
    /// May moderate products and change roles.
    Admin,
}

impl UserRole {
    /// Whether this role may submit products for sale.
    #[must_use]
    pub const fn can_sell(self) -> bool {
        matches!(self, Self::Artist | Self::Admin)
    }

    /// Whether this role may use the moderation endpoints.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Artist => "artist",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "artist" => Ok(Self::Artist),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Moderation status of a submitted product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Submitted by an artist, awaiting review.
    #[default]
    Pending,
    /// Visible in the public catalog.
    Approved,
    /// Hidden from the public catalog.
    Rejected,
}

impl ProductStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("invalid product status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [UserRole::User, UserRole::Artist, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_serde_matches_column_values() {
        assert_eq!(serde_json::to_string(&UserRole::Artist).unwrap(), "\"artist\"");
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn test_role_permissions() {
        assert!(!UserRole::User.can_sell());
        assert!(UserRole::Artist.can_sell());
        assert!(!UserRole::Artist.is_admin());
        assert!(UserRole::Admin.is_admin());
    }

    #[test]
    fn test_product_status_parse() {
        assert_eq!(
            "rejected".parse::<ProductStatus>().unwrap(),
            ProductStatus::Rejected
        );
        assert_eq!(ProductStatus::default(), ProductStatus::Pending);
        assert!("archived".parse::<ProductStatus>().is_err());
    }
}
