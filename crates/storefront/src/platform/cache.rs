//! Cache types for catalog reads.

use arthive_core::ProductId;

use super::types::{ArtistSummary, Colony, Product};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products,
    Artists,
    Colonies,
    Colony(String),
    ColonyProducts(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Artists(Vec<ArtistSummary>),
    Colonies(Vec<Colony>),
    Colony(Box<Colony>),
}
