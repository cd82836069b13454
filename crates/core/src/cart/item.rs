//! Cart line types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Product fields captured at the moment it is added to a cart.
///
/// The cart never re-reads the catalog, so title, price and image are
/// whatever the product page showed when the buyer clicked "add".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: String,
}

impl ProductSnapshot {
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        price: Decimal,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            image_url: image_url.into(),
        }
    }
}

/// One distinct product held in a cart.
///
/// The serialized field names are the persisted format; changing them
/// orphans every stored cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: String,
    pub quantity: u32,
}

impl CartItem {
    /// Build a cart line from a snapshot and a quantity.
    #[must_use]
    pub fn from_snapshot(snapshot: ProductSnapshot, quantity: u32) -> Self {
        Self {
            id: snapshot.id,
            title: snapshot.title,
            price: snapshot.price,
            image_url: snapshot.image_url,
            quantity,
        }
    }

    /// `price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Sum of line totals.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

/// Total number of units across all lines.
#[must_use]
pub fn item_count(items: &[CartItem]) -> u32 {
    items
        .iter()
        .fold(0u32, |count, item| count.saturating_add(item.quantity))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem::from_snapshot(
            ProductSnapshot::new(id, format!("Art {id}"), Decimal::from(price), "u"),
            quantity,
        )
    }

    #[test]
    fn test_totals() {
        let cart = vec![item("a", 100, 1), item("b", 50, 2)];
        assert_eq!(cart_total(&cart), Decimal::from(200));
        assert_eq!(item_count(&cart), 3);
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_item_count_saturates() {
        let cart = vec![item("a", 1, u32::MAX), item("b", 1, 5)];
        assert_eq!(item_count(&cart), u32::MAX);
    }

    #[test]
    fn test_persisted_shape() {
        let json = serde_json::to_value(item("a", 100, 1)).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["title"], "Art a");
        assert_eq!(json["image_url"], "u");
        assert_eq!(json["quantity"], 1);
        assert!(json["price"].is_number());
    }

    #[test]
    fn test_reads_numeric_prices_written_by_other_clients() {
        let raw = r#"{"id":"x","title":"T","price":49.95,"image_url":"i","quantity":2}"#;
        let parsed: CartItem = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.price, Decimal::new(4995, 2));
        assert_eq!(parsed.line_total(), Decimal::new(9990, 2));
    }
}
