use async_trait::async_trait;
use chrono::Utc;
use shared::{
    InventoryError, NewProduct, NewWarehouse, Product, RemainingProduct, Result, StockOperation, Warehouse,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{InventoryStore, StockLedger};
use crate::models::StockLevel;
use crate::reservation::apply_batch;

#[derive(Debug, Default)]
struct MemoryState {
    warehouses: BTreeMap<i32, Warehouse>,
    products: BTreeMap<i32, Product>,
    last_warehouse_id: i32,
    last_product_id: i32,
}

/// Process-local store with the same transactional contract as Postgres.
///
/// Batches are serialized by a single lock and run against a staged copy of
/// the product table, which replaces the live table only when the batch
/// succeeds.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    latency: Option<Duration>,
    failing_write: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every row lookup inside a batch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the `nth` (1-based) quantity adjustment of every batch fail with
    /// a storage error.
    pub fn with_failing_write(mut self, nth: usize) -> Self {
        self.failing_write = Some(nth);
        self
    }
}

struct MemoryLedger {
    products: BTreeMap<i32, Product>,
    latency: Option<Duration>,
    failing_write: Option<usize>,
    writes: usize,
}

#[async_trait]
impl StockLedger for MemoryLedger {
    async fn lock_product(&mut self, code: &str) -> Result<Option<StockLevel>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        Ok(self.products.values().find(|p| p.code == code).map(|p| StockLevel {
            id: p.id,
            code: p.code.clone(),
            quantity: p.quantity,
        }))
    }

    async fn adjust_quantity(&mut self, product_id: i32, delta: i32) -> Result<()> {
        self.writes += 1;
        if self.failing_write == Some(self.writes) {
            return Err(InventoryError::storage(format!("write {} to product {} failed", self.writes, product_id)));
        }

        let product = self
            .products
            .get_mut(&product_id)
            .ok_or_else(|| InventoryError::not_found(format!("product {} not found", product_id)))?;

        let quantity = product
            .quantity
            .checked_add(delta)
            .ok_or_else(|| InventoryError::invalid_argument(format!("quantity of product {} out of range", product.code)))?;
        if quantity < 0 {
            return Err(InventoryError::invalid_argument(format!(
                "quantity of product {} cannot become negative",
                product.code
            )));
        }

        product.quantity = quantity;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn insert_warehouse(&self, new: &NewWarehouse) -> Result<Warehouse> {
        let mut state = self.state.lock().await;
        state.last_warehouse_id += 1;

        let warehouse = Warehouse {
            id: state.last_warehouse_id,
            name: new.name.clone(),
            is_available: new.is_available,
            created_at: Some(Utc::now()),
        };
        state.warehouses.insert(warehouse.id, warehouse.clone());

        Ok(warehouse)
    }

    async fn warehouse_exists(&self, id: i32) -> Result<bool> {
        Ok(self.state.lock().await.warehouses.contains_key(&id))
    }

    async fn insert_product(&self, new: &NewProduct) -> Result<Product> {
        let mut state = self.state.lock().await;

        if !state.warehouses.contains_key(&new.warehouse_id) {
            return Err(InventoryError::not_found(format!("warehouse {} not found", new.warehouse_id)));
        }
        if state.products.values().any(|p| p.code == new.code) {
            return Err(InventoryError::invalid_argument(format!(
                "product code {} already exists",
                new.code
            )));
        }

        state.last_product_id += 1;
        let product = Product {
            id: state.last_product_id,
            name: new.name.clone(),
            size: new.size.clone(),
            code: new.code.clone(),
            quantity: new.quantity,
            warehouse_id: new.warehouse_id,
            created_at: Some(Utc::now()),
        };
        state.products.insert(product.id, product.clone());

        Ok(product)
    }

    async fn delete_product(&self, id: i32) -> Result<()> {
        self.state.lock().await.products.remove(&id);
        Ok(())
    }

    async fn remaining_products(&self, warehouse_id: i32) -> Result<Vec<RemainingProduct>> {
        let state = self.state.lock().await;

        Ok(state
            .products
            .values()
            .filter(|p| p.warehouse_id == warehouse_id)
            .map(|p| RemainingProduct {
                code: p.code.clone(),
                quantity: p.quantity,
            })
            .collect())
    }

    async fn run_batch(&self, op: StockOperation, codes: &[String]) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut ledger = MemoryLedger {
            products: state.products.clone(),
            latency: self.latency,
            failing_write: self.failing_write,
            writes: 0,
        };

        apply_batch(&mut ledger, op, codes).await?;

        state.products = ledger.products;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    async fn seeded() -> (MemoryStore, Warehouse) {
        let store = MemoryStore::new();
        let warehouse = store
            .insert_warehouse(&NewWarehouse {
                name: "W1".to_string(),
                is_available: true,
            })
            .await
            .unwrap();
        (store, warehouse)
    }

    fn product(code: &str, quantity: i32, warehouse_id: i32) -> NewProduct {
        NewProduct {
            name: format!("Product {}", code),
            size: BigDecimal::from(42),
            code: code.to_string(),
            quantity,
            warehouse_id,
        }
    }

    #[tokio::test]
    async fn assigns_sequential_ids() {
        let (store, warehouse) = seeded().await;
        assert_eq!(warehouse.id, 1);

        let first = store.insert_product(&product("A", 1, warehouse.id)).await.unwrap();
        let second = store.insert_product(&product("B", 1, warehouse.id)).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));
    }

    #[tokio::test]
    async fn rejects_duplicate_codes_and_unknown_warehouses() {
        let (store, warehouse) = seeded().await;
        store.insert_product(&product("A", 1, warehouse.id)).await.unwrap();

        let duplicate = store.insert_product(&product("A", 5, warehouse.id)).await.unwrap_err();
        assert!(matches!(duplicate, InventoryError::InvalidArgument(_)));

        let orphan = store.insert_product(&product("B", 5, 99)).await.unwrap_err();
        assert!(matches!(orphan, InventoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_batch_leaves_live_rows_untouched() {
        let (store, warehouse) = seeded().await;
        store.insert_product(&product("A", 2, warehouse.id)).await.unwrap();

        let codes = vec!["A".to_string(), "missing".to_string()];
        assert!(store.run_batch(StockOperation::Reserve, &codes).await.is_err());

        let remaining = store.remaining_products(warehouse.id).await.unwrap();
        assert_eq!(remaining[0].quantity, 2);
    }

    #[tokio::test]
    async fn ledger_refuses_negative_quantity() {
        let (store, warehouse) = seeded().await;
        let created = store.insert_product(&product("A", 0, warehouse.id)).await.unwrap();

        let mut ledger = MemoryLedger {
            products: store.state.lock().await.products.clone(),
            latency: None,
            failing_write: None,
            writes: 0,
        };
        let err = ledger.adjust_quantity(created.id, -1).await.unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(_)));
    }
}
