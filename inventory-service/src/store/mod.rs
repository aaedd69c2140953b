//! Storage gateway: the transactional store behind the catalog and the
//! reservation engine.

use async_trait::async_trait;
use shared::{NewProduct, NewWarehouse, Product, RemainingProduct, Result, StockOperation, Warehouse};

use crate::models::StockLevel;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{pool_error, PgStore};

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn insert_warehouse(&self, new: &NewWarehouse) -> Result<Warehouse>;

    async fn warehouse_exists(&self, id: i32) -> Result<bool>;

    /// Fails with `InvalidArgument` when the code is already taken.
    async fn insert_product(&self, new: &NewProduct) -> Result<Product>;

    /// Deleting an id that does not exist is a no-op.
    async fn delete_product(&self, id: i32) -> Result<()>;

    async fn remaining_products(&self, warehouse_id: i32) -> Result<Vec<RemainingProduct>>;

    /// Runs one reservation or release batch inside a single transaction.
    /// Every change is committed when the batch succeeds and none are when it
    /// fails or the returned future is dropped before completion.
    /// Concurrent batches naming the same codes in different orders can
    /// deadlock on Postgres; the aborted one fails with a retriable
    /// `StorageFailure`.
    async fn run_batch(&self, op: StockOperation, codes: &[String]) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}

/// Product rows as seen from inside an open batch transaction.
#[async_trait]
pub trait StockLedger: Send {
    /// Looks a product up by code and holds its row until the transaction ends.
    async fn lock_product(&mut self, code: &str) -> Result<Option<StockLevel>>;

    async fn adjust_quantity(&mut self, product_id: i32, delta: i32) -> Result<()>;
}
