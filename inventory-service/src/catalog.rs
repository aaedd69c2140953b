use bigdecimal::BigDecimal;
use num_traits::Zero;
use shared::{InventoryError, NewProduct, NewWarehouse, Product, RemainingProduct, Result, Warehouse};
use std::sync::Arc;
use tracing::info;

use crate::store::InventoryStore;

/// Warehouse and product bookkeeping around the reservation engine.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn InventoryStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub async fn create_warehouse(&self, new: NewWarehouse) -> Result<Warehouse> {
        if new.name.trim().is_empty() {
            return Err(InventoryError::invalid_argument("warehouse name must not be empty"));
        }

        let warehouse = self.store.insert_warehouse(&new).await?;
        info!("Created warehouse {} ({})", warehouse.id, warehouse.name);
        Ok(warehouse)
    }

    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        if new.name.trim().is_empty() {
            return Err(InventoryError::invalid_argument("product name must not be empty"));
        }
        if new.code.trim().is_empty() {
            return Err(InventoryError::invalid_argument("product code must not be empty"));
        }
        if new.quantity < 0 {
            return Err(InventoryError::invalid_argument("quantity must not be negative"));
        }
        if new.size < BigDecimal::zero() {
            return Err(InventoryError::invalid_argument("size must not be negative"));
        }
        if !self.store.warehouse_exists(new.warehouse_id).await? {
            return Err(InventoryError::not_found(format!("warehouse {} not found", new.warehouse_id)));
        }

        let product = self.store.insert_product(&new).await?;
        info!(
            "Created product {} ({}) in warehouse {} with quantity {}",
            product.id, product.code, product.warehouse_id, product.quantity
        );
        Ok(product)
    }

    /// Succeeds whether or not the product exists.
    pub async fn delete_product(&self, id: i32) -> Result<()> {
        self.store.delete_product(id).await?;
        info!("Deleted product {}", id);
        Ok(())
    }

    pub async fn remaining_products(&self, warehouse_id: i32) -> Result<Vec<RemainingProduct>> {
        self.store.remaining_products(warehouse_id).await
    }
}
