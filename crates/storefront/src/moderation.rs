//! List filtering for the admin dashboard and the home feed.
//!
//! Everything here is pure: handlers fetch full lists from the platform and
//! narrow them in process.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;

use arthive_core::{ProductStatus, ProfileId, UserRole};

use crate::platform::{ArtistSummary, Product, Profile};

/// Either every value or one specific value.
///
/// Parses from a query parameter: absent, empty or `all` means [`Filter::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter<T> {
    #[default]
    All,
    Only(T),
}

/// Role filter on the users tab.
pub type RoleFilter = Filter<UserRole>;

/// Status filter on the products tab.
pub type StatusFilter = Filter<ProductStatus>;

impl<T: FromStr + PartialEq> Filter<T> {
    /// Parse an optional query value.
    ///
    /// # Errors
    ///
    /// Returns the parse error of `T` for an unrecognized value.
    pub fn parse(raw: Option<&str>) -> Result<Self, T::Err> {
        match raw.map(str::trim) {
            None | Some("" | "all") => Ok(Self::All),
            Some(value) => value.parse().map(Self::Only),
        }
    }

    /// Whether `value` passes this filter.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Profiles matching a role filter and a free-text search.
///
/// The search is a case-insensitive substring of the username or the email;
/// an empty search matches everything.
#[must_use]
pub fn filter_profiles(profiles: Vec<Profile>, role: RoleFilter, search: &str) -> Vec<Profile> {
    let needle = search.trim().to_lowercase();
    profiles
        .into_iter()
        .filter(|p| role.matches(&p.role))
        .filter(|p| {
            needle.is_empty()
                || p.username.as_deref().is_some_and(|u| contains_ci(u, &needle))
                || p.email.as_deref().is_some_and(|e| contains_ci(e, &needle))
        })
        .collect()
}

/// Products matching a status filter and a case-insensitive title search.
#[must_use]
pub fn filter_products(products: Vec<Product>, status: StatusFilter, search: &str) -> Vec<Product> {
    let needle = search.trim().to_lowercase();
    products
        .into_iter()
        .filter(|p| status.matches(&p.status))
        .filter(|p| needle.is_empty() || contains_ci(&p.title, &needle))
        .collect()
}

/// A product paired with its artist's username.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithArtist {
    #[serde(flatten)]
    pub product: Product,
    pub artist_username: Option<String>,
}

/// Pair each product with the username of its artist.
///
/// Products without an artist, or whose artist has no username, get `None`.
#[must_use]
pub fn attach_artists(products: Vec<Product>, artists: &[ArtistSummary]) -> Vec<ProductWithArtist> {
    let names: HashMap<&ProfileId, &str> = artists
        .iter()
        .filter_map(|a| a.username.as_deref().map(|name| (&a.id, name)))
        .collect();

    products
        .into_iter()
        .map(|product| {
            let artist_username = product
                .artist_id
                .as_ref()
                .and_then(|id| names.get(id))
                .map(|name| (*name).to_owned());
            ProductWithArtist {
                product,
                artist_username,
            }
        })
        .collect()
}
