//! Cart storage and per-user serialization.
//!
//! # Design Decisions
//! - The store is a dumb keyed blob store behind a trait, injected at
//!   construction so tests substitute a deterministic in-memory double
//! - Serialization lives above the store: a per-user async mutex guards
//!   every read-modify-write, so last-writer-wins on the blob can never
//!   lose an update
//! - The cart service is the sole mutator of cart blobs

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::catalog::Product;

/// One line item. Quantity starts at 1 and only grows via upserts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub product_id: u32,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

/// A user's cart. Invariant: `total` equals the sum of
/// `price * quantity` over all items, recomputed on every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total: f64,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a product, merging by product id rather than appending a
    /// duplicate line. Recomputes the total unconditionally.
    pub fn upsert(&mut self, product: &Product, quantity: u32) {
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            Some(item) => item.quantity += quantity,
            None => self.items.push(CartItem {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                quantity,
            }),
        }
        self.recompute_total();
    }

    pub fn recompute_total(&mut self) {
        self.total = self
            .items
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum();
    }
}

/// Storage failure. The in-memory store never raises one; a durable
/// backend would.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Aggregate store state served by the cart metrics endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreStats {
    pub active_carts: usize,
    pub total_items: usize,
}

/// Keyed blob store owning all carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Option<Cart>, StoreError>;
    async fn save(&self, user_id: &str, cart: &Cart) -> Result<(), StoreError>;
    async fn remove(&self, user_id: &str) -> Result<(), StoreError>;
    async fn stats(&self) -> Result<StoreStats, StoreError>;
}

/// Volatile store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: DashMap<String, Cart>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, user_id: &str) -> Result<Option<Cart>, StoreError> {
        Ok(self.carts.get(user_id).map(|c| c.value().clone()))
    }

    async fn save(&self, user_id: &str, cart: &Cart) -> Result<(), StoreError> {
        self.carts.insert(user_id.to_string(), cart.clone());
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> Result<(), StoreError> {
        self.carts.remove(user_id);
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let mut total_items = 0usize;
        for cart in self.carts.iter() {
            total_items += cart.items.len();
        }
        Ok(StoreStats {
            active_carts: self.carts.len(),
            total_items,
        })
    }
}

/// Registry of per-user mutexes guarding cart read-modify-writes.
#[derive(Debug, Default)]
pub struct UserLocks {
    inner: DashMap<String, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (or create) the mutex for one user. Callers hold the guard
    /// across the whole load-mutate-save sequence.
    pub fn acquire(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.inner
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: u32, price: f64) -> Product {
        Product {
            id,
            name: format!("product-{id}"),
            price,
            category: "test".to_string(),
        }
    }

    #[test]
    fn total_tracks_every_mutation_exactly() {
        let mut cart = Cart::default();
        cart.upsert(&product(1, 999.0), 1);
        cart.upsert(&product(2, 249.0), 2);
        cart.upsert(&product(1, 999.0), 1);
        let expected = 999.0 * 2.0 + 249.0 * 2.0;
        assert!((cart.total - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn upsert_merges_by_product_id() {
        let mut cart = Cart::default();
        cart.upsert(&product(1, 10.0), 1);
        cart.upsert(&product(1, 10.0), 3);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 4);
    }

    #[tokio::test]
    async fn store_round_trips_and_removes() {
        let store = InMemoryCartStore::new();
        assert!(store.load("alice").await.unwrap().is_none());

        let mut cart = Cart::default();
        cart.upsert(&product(1, 5.0), 2);
        store.save("alice", &cart).await.unwrap();

        let loaded = store.load("alice").await.unwrap().unwrap();
        assert_eq!(loaded, cart);

        store.remove("alice").await.unwrap();
        assert!(store.load("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_adds_for_one_user_both_persist() {
        let store = Arc::new(InMemoryCartStore::new());
        let locks = Arc::new(UserLocks::new());

        let mut handles = Vec::new();
        for id in [1u32, 2u32] {
            let store = store.clone();
            let locks = locks.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("alice").lock_owned().await;
                let mut cart = store.load("alice").await.unwrap().unwrap_or_default();
                cart.upsert(&product(id, 100.0), 1);
                // Hold the lock across an await to widen the race window.
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                store.save("alice", &cart).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let cart = store.load("alice").await.unwrap().unwrap();
        assert_eq!(cart.items.len(), 2, "no update may be lost");
        assert!((cart.total - 200.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn stats_count_carts_and_items() {
        let store = InMemoryCartStore::new();
        let mut cart = Cart::default();
        cart.upsert(&product(1, 1.0), 1);
        cart.upsert(&product(2, 1.0), 1);
        store.save("alice", &cart).await.unwrap();
        store.save("bob", &Cart::default()).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.active_carts, 2);
        assert_eq!(stats.total_items, 2);
    }
}
