//! Read-modify-write operations over a persisted cart.

use rust_decimal::Decimal;

use super::item::{self, CartItem, ProductSnapshot};
use super::persistence::CartPersistence;
use super::CartError;
use crate::types::ProductId;

/// Key the cart is stored under.
pub const CART_STORAGE_KEY: &str = "arthive-cart";

type Result<T, P> = std::result::Result<T, CartError<<P as CartPersistence>::Error>>;

/// A shopping cart bound to one persistence medium.
///
/// Each operation loads the whole cart, changes it, and writes the whole
/// cart back. Nothing is cached between calls, so two stores over the same
/// medium always agree after each call returns.
#[derive(Debug)]
pub struct CartStore<P> {
    persistence: P,
    key: String,
}

impl<P: CartPersistence> CartStore<P> {
    /// Create a store using [`CART_STORAGE_KEY`].
    #[must_use]
    pub fn new(persistence: P) -> Self {
        Self::with_key(persistence, CART_STORAGE_KEY)
    }

    /// Create a store under a custom key.
    #[must_use]
    pub fn with_key(persistence: P, key: impl Into<String>) -> Self {
        Self {
            persistence,
            key: key.into(),
        }
    }

    #[must_use]
    pub const fn persistence(&self) -> &P {
        &self.persistence
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current cart, in insertion order.
    ///
    /// Never fails. An absent key, an unavailable medium, a storage error or
    /// unparsable content all read as an empty cart; the latter two are
    /// logged.
    #[must_use]
    pub fn read(&self) -> Vec<CartItem> {
        match self.try_read() {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Discarding unreadable cart");
                Vec::new()
            }
        }
    }

    /// Current cart, surfacing storage and corruption errors.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the medium fails and
    /// [`CartError::Corrupted`] if the stored value is not a cart.
    pub fn try_read(&self) -> Result<Vec<CartItem>, P> {
        let Some(raw) = self
            .persistence
            .load(&self.key)
            .map_err(CartError::Persistence)?
        else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(CartError::Corrupted)
    }

    /// Replace the whole persisted cart. Last write wins; no validation.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the storage write fails.
    pub fn write(&self, cart: &[CartItem]) -> Result<(), P> {
        let raw = serde_json::to_string(cart).map_err(CartError::Encode)?;
        self.persistence
            .save(&self.key, &raw)
            .map_err(CartError::Persistence)
    }

    /// Cart to modify: like [`Self::try_read`], but corrupted content is
    /// discarded so the next write replaces it.
    fn load_for_update(&self) -> Result<Vec<CartItem>, P> {
        match self.try_read() {
            Err(CartError::Corrupted(e)) => {
                tracing::warn!(key = %self.key, error = %e, "Replacing corrupted cart");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// An existing line for the same product has its quantity increased
    /// (saturating); otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity, or an
    /// error if the stored cart cannot be loaded or the write fails.
    pub fn add(&self, item: ProductSnapshot, quantity: u32) -> Result<(), P> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut cart = self.load_for_update()?;
        if let Some(existing) = cart.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            cart.push(CartItem::from_snapshot(item, quantity));
        }
        self.write(&cart)
    }

    /// Drop every line for `id`. Removing an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored cart cannot be loaded or the write
    /// fails.
    pub fn remove(&self, id: &ProductId) -> Result<(), P> {
        let mut cart = self.load_for_update()?;
        cart.retain(|line| &line.id != id);
        self.write(&cart)
    }

    /// Set the quantity of an existing line; zero removes it.
    ///
    /// Unknown products are ignored rather than added, since there is no
    /// snapshot to build a line from.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored cart cannot be loaded or the write
    /// fails.
    pub fn update_quantity(&self, id: &ProductId, quantity: u32) -> Result<(), P> {
        if quantity == 0 {
            return self.remove(id);
        }

        let mut cart = self.load_for_update()?;
        let Some(line) = cart.iter_mut().find(|line| &line.id == id) else {
            return Ok(());
        };
        line.quantity = quantity;
        self.write(&cart)
    }

    /// Delete the stored cart entirely (the key is removed, not emptied).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage delete fails.
    pub fn clear(&self) -> Result<(), P> {
        self.persistence
            .remove(&self.key)
            .map_err(CartError::Persistence)
    }

    /// Total units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        item::item_count(&self.read())
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        item::cart_total(&self.read())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cart::{MemoryPersistence, UnavailablePersistence};

    fn snapshot(id: &str, price: i64) -> ProductSnapshot {
        ProductSnapshot::new(id, format!("Art {id}"), Decimal::from(price), format!("/{id}.jpg"))
    }

    fn ids(cart: &[CartItem]) -> Vec<&str> {
        cart.iter().map(|line| line.id.as_str()).collect()
    }

    #[test]
    fn read_empty_when_never_written() {
        let store = CartStore::new(MemoryPersistence::new());
        assert!(store.read().is_empty());
        assert!(!store.persistence().contains_key(CART_STORAGE_KEY));
    }

    #[test]
    fn distinct_adds_sum_per_id() {
        let store = CartStore::new(MemoryPersistence::new());
        let adds = [("a", 1), ("b", 4), ("a", 2), ("c", 1), ("b", 1)];
        for (id, qty) in adds {
            store.add(snapshot(id, 10), qty).unwrap();
        }

        let cart = store.read();
        assert_eq!(ids(&cart), ["a", "b", "c"]);
        assert_eq!(cart[0].quantity, 3);
        assert_eq!(cart[1].quantity, 5);
        assert_eq!(cart[2].quantity, 1);
    }

    #[test]
    fn duplicate_add_accumulates() {
        let store = CartStore::new(MemoryPersistence::new());
        store.add(snapshot("p1", 10), 2).unwrap();
        store.add(snapshot("p1", 10), 3).unwrap();

        let cart = store.read();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 5);
    }

    #[test]
    fn add_keeps_first_snapshot() {
        let store = CartStore::new(MemoryPersistence::new());
        store.add(snapshot("p1", 10), 1).unwrap();
        store.add(snapshot("p1", 99), 1).unwrap();

        assert_eq!(store.read()[0].price, Decimal::from(10));
    }

    #[test]
    fn add_zero_is_rejected() {
        let store = CartStore::new(MemoryPersistence::new());
        let err = store.add(snapshot("p1", 10), 0).unwrap_err();
        assert!(matches!(err, CartError::InvalidQuantity));
        assert!(!store.persistence().contains_key(CART_STORAGE_KEY));
    }

    #[test]
    fn add_saturates_quantity() {
        let store = CartStore::new(MemoryPersistence::new());
        store.add(snapshot("p1", 1), u32::MAX).unwrap();
        store.add(snapshot("p1", 1), 10).unwrap();
        assert_eq!(store.read()[0].quantity, u32::MAX);
    }

    #[test]
    fn remove_preserves_order_of_others() {
        let store = CartStore::new(MemoryPersistence::new());
        store.add(snapshot("p0", 1), 1).unwrap();
        store.add(snapshot("p1", 1), 1).unwrap();
        store.add(snapshot("p2", 1), 1).unwrap();

        store.remove(&ProductId::new("p1")).unwrap();
        assert_eq!(ids(&store.read()), ["p0", "p2"]);
    }

    #[test]
    fn remove_missing_is_noop() {
        let store = CartStore::new(MemoryPersistence::new());
        store.add(snapshot("p1", 1), 2).unwrap();
        store.add(snapshot("p2", 3), 1).unwrap();
        let before = store.read();

        store.remove(&ProductId::new("nonexistent")).unwrap();
        assert_eq!(store.read(), before);
    }

    #[test]
    fn removing_last_item_leaves_empty_array() {
        let store = CartStore::new(MemoryPersistence::new());
        store.add(snapshot("p1", 1), 1).unwrap();
        store.remove(&ProductId::new("p1")).unwrap();

        assert!(store.read().is_empty());
        assert_eq!(
            store.persistence().entry(CART_STORAGE_KEY).as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn clear_removes_key() {
        let store = CartStore::new(MemoryPersistence::new());
        store.add(snapshot("p1", 1), 1).unwrap();

        store.clear().unwrap();
        assert!(store.read().is_empty());
        assert!(!store.persistence().contains_key(CART_STORAGE_KEY));
    }

    #[test]
    fn write_is_last_write_wins() {
        let once = CartStore::new(MemoryPersistence::new());
        let twice = CartStore::new(MemoryPersistence::new());
        let cart = vec![
            CartItem::from_snapshot(snapshot("x", 5), 2),
            CartItem::from_snapshot(snapshot("y", 7), 1),
        ];

        once.write(&cart).unwrap();
        twice.write(&[CartItem::from_snapshot(snapshot("z", 1), 9)]).unwrap();
        twice.write(&cart).unwrap();
        twice.write(&cart).unwrap();

        assert_eq!(
            once.persistence().entry(CART_STORAGE_KEY),
            twice.persistence().entry(CART_STORAGE_KEY)
        );
    }

    #[test]
    fn write_does_not_validate() {
        let store = CartStore::new(MemoryPersistence::new());
        let dup = CartItem::from_snapshot(snapshot("x", 5), 1);
        store.write(&[dup.clone(), dup]).unwrap();
        assert_eq!(store.read().len(), 2);
    }

    #[test]
    fn update_quantity_sets_and_removes() {
        let store = CartStore::new(MemoryPersistence::new());
        store.add(snapshot("a", 1), 1).unwrap();
        store.add(snapshot("b", 1), 1).unwrap();

        store.update_quantity(&ProductId::new("a"), 7).unwrap();
        assert_eq!(store.read()[0].quantity, 7);

        store.update_quantity(&ProductId::new("a"), 0).unwrap();
        assert_eq!(ids(&store.read()), ["b"]);

        store.update_quantity(&ProductId::new("ghost"), 3).unwrap();
        assert_eq!(ids(&store.read()), ["b"]);
    }

    #[test]
    fn scenario_two_items_total() {
        let store = CartStore::new(MemoryPersistence::new());
        store
            .add(ProductSnapshot::new("a", "Art A", Decimal::from(100), "u"), 1)
            .unwrap();
        store
            .add(ProductSnapshot::new("b", "Art B", Decimal::from(50), "v"), 2)
            .unwrap();

        let cart = store.read();
        assert_eq!(ids(&cart), ["a", "b"]);
        assert_eq!(cart[0].quantity, 1);
        assert_eq!(cart[1].quantity, 2);
        assert_eq!(store.total(), Decimal::from(200));
        assert_eq!(store.item_count(), 3);
    }

    #[test]
    fn corrupted_content_reads_empty() {
        let memory = MemoryPersistence::seeded(CART_STORAGE_KEY, Some("{not json".to_owned()));
        let store = CartStore::new(&memory);

        assert!(store.read().is_empty());
        assert!(matches!(store.try_read(), Err(CartError::Corrupted(_))));

        store.add(snapshot("p1", 1), 1).unwrap();
        assert_eq!(ids(&store.read()), ["p1"]);
    }

    #[test]
    fn negative_quantity_in_storage_is_corruption() {
        let raw = r#"[{"id":"p","title":"t","price":1,"image_url":"u","quantity":-2}]"#;
        let store = CartStore::new(MemoryPersistence::seeded(CART_STORAGE_KEY, Some(raw.to_owned())));
        assert!(matches!(store.try_read(), Err(CartError::Corrupted(_))));
    }

    #[test]
    fn unavailable_medium_is_silent() {
        let store = CartStore::new(UnavailablePersistence);
        store.add(snapshot("p1", 1), 3).unwrap();
        store.remove(&ProductId::new("p1")).unwrap();
        store.clear().unwrap();
        assert!(store.read().is_empty());
        assert_eq!(store.total(), Decimal::ZERO);
    }

    /// Memory medium whose loads can be switched to fail.
    #[derive(Default)]
    struct FlakyLoad {
        inner: MemoryPersistence,
        fail_loads: std::cell::Cell<bool>,
    }

    impl CartPersistence for FlakyLoad {
        type Error = std::io::Error;

        fn load(&self, key: &str) -> std::result::Result<Option<String>, Self::Error> {
            if self.fail_loads.get() {
                return Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
            }
            Ok(self.inner.entry(key))
        }

        fn save(&self, key: &str, value: &str) -> std::result::Result<(), Self::Error> {
            self.inner.save(key, value).map_err(|never| match never {})
        }

        fn remove(&self, key: &str) -> std::result::Result<(), Self::Error> {
            self.inner.remove(key).map_err(|never| match never {})
        }
    }

    #[test]
    fn load_failure_aborts_mutation_and_keeps_cart() {
        let store = CartStore::new(FlakyLoad::default());
        for id in ["a", "b", "c"] {
            store.add(snapshot(id, 10), 1).unwrap();
        }

        store.persistence().fail_loads.set(true);
        assert!(matches!(
            store.add(snapshot("d", 10), 1),
            Err(CartError::Persistence(_))
        ));
        assert!(matches!(
            store.remove(&ProductId::new("a")),
            Err(CartError::Persistence(_))
        ));
        assert!(matches!(
            store.update_quantity(&ProductId::new("b"), 7),
            Err(CartError::Persistence(_))
        ));
        assert!(store.read().is_empty());

        store.persistence().fail_loads.set(false);
        let cart = store.read();
        assert_eq!(ids(&cart), ["a", "b", "c"]);
        assert_eq!(store.item_count(), 3);
    }

    #[test]
    fn custom_key_isolated() {
        let memory = MemoryPersistence::new();
        let main = CartStore::new(&memory);
        let wishlist = CartStore::with_key(&memory, "wishlist");

        main.add(snapshot("a", 1), 1).unwrap();
        wishlist.add(snapshot("b", 1), 1).unwrap();

        assert_eq!(ids(&main.read()), ["a"]);
        assert_eq!(ids(&wishlist.read()), ["b"]);
        assert_eq!(wishlist.key(), "wishlist");
    }
}
