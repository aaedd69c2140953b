//! Reservation engine: all-or-nothing stock reservation and release over a
//! batch of product codes.

use shared::{InventoryError, Result, StockOperation};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::store::{InventoryStore, StockLedger};

#[derive(Clone)]
pub struct ReservationEngine {
    store: Arc<dyn InventoryStore>,
}

impl ReservationEngine {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Takes one unit of every listed code, or nothing at all.
    pub async fn reserve_products(&self, codes: &[String]) -> Result<()> {
        self.run(StockOperation::Reserve, codes).await
    }

    /// Returns one unit of every listed code, or nothing at all.
    ///
    /// There is no ceiling: releasing a code that was never reserved still
    /// raises its quantity.
    pub async fn release_products(&self, codes: &[String]) -> Result<()> {
        self.run(StockOperation::Release, codes).await
    }

    #[instrument(name = "stock_batch", skip(self, codes), fields(batch_size = codes.len()))]
    async fn run(&self, op: StockOperation, codes: &[String]) -> Result<()> {
        validate_batch(codes)?;

        match self.store.run_batch(op, codes).await {
            Ok(()) => {
                info!("Committed {} batch of {} codes", op, codes.len());
                Ok(())
            }
            Err(e @ InventoryError::StorageFailure(_)) => {
                error!("Rolled back {} batch: {}", op, e);
                Err(e)
            }
            Err(e) => {
                warn!("Rejected {} batch: {}", op, e);
                Err(e)
            }
        }
    }
}

fn validate_batch(codes: &[String]) -> Result<()> {
    if codes.is_empty() {
        return Err(InventoryError::invalid_argument("empty product codes"));
    }
    if codes.iter().any(|code| code.trim().is_empty()) {
        return Err(InventoryError::invalid_argument("blank product code"));
    }
    Ok(())
}

/// Applies one batch inside an already open transaction, in the given order.
///
/// Returns on the first failure; the caller owns the transaction and must
/// roll it back.
pub async fn apply_batch<L>(ledger: &mut L, op: StockOperation, codes: &[String]) -> Result<()>
where
    L: StockLedger + ?Sized,
{
    for code in codes {
        let level = ledger
            .lock_product(code)
            .await?
            .ok_or_else(|| InventoryError::not_found(format!("product {} not found", code)))?;

        if op == StockOperation::Reserve && level.quantity < 1 {
            return Err(InventoryError::out_of_stock(code.as_str()));
        }
        if level.quantity.checked_add(op.delta()).is_none() {
            return Err(InventoryError::invalid_argument(format!(
                "quantity of product {} out of range",
                code
            )));
        }

        ledger.adjust_quantity(level.id, op.delta()).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::store::MemoryStore;
    use bigdecimal::BigDecimal;
    use futures::future::join_all;
    use shared::{NewProduct, NewWarehouse, RemainingProduct};
    use std::time::Duration;

    struct Fixture {
        catalog: Catalog,
        engine: ReservationEngine,
        warehouse_id: i32,
    }

    async fn fixture(store: MemoryStore, stock: &[(&str, i32)]) -> Fixture {
        let store: Arc<dyn InventoryStore> = Arc::new(store);
        let catalog = Catalog::new(store.clone());
        let engine = ReservationEngine::new(store);

        let warehouse = catalog
            .create_warehouse(NewWarehouse {
                name: "W1".to_string(),
                is_available: true,
            })
            .await
            .unwrap();

        for (code, quantity) in stock {
            catalog
                .create_product(NewProduct {
                    name: format!("Product {}", code),
                    size: BigDecimal::from(40),
                    code: code.to_string(),
                    quantity: *quantity,
                    warehouse_id: warehouse.id,
                })
                .await
                .unwrap();
        }

        Fixture {
            catalog,
            engine,
            warehouse_id: warehouse.id,
        }
    }

    fn codes(items: &[&str]) -> Vec<String> {
        items.iter().map(|c| c.to_string()).collect()
    }

    impl Fixture {
        async fn quantities(&self) -> Vec<(String, i32)> {
            self.catalog
                .remaining_products(self.warehouse_id)
                .await
                .unwrap()
                .into_iter()
                .map(|RemainingProduct { code, quantity }| (code, quantity))
                .collect()
        }
    }

    fn stock(items: &[(&str, i32)]) -> Vec<(String, i32)> {
        items.iter().map(|(c, q)| (c.to_string(), *q)).collect()
    }

    #[tokio::test]
    async fn reserve_decrements_only_named_products() {
        let f = fixture(MemoryStore::new(), &[("A", 5), ("B", 2), ("C", 9)]).await;

        f.engine.reserve_products(&codes(&["A", "B"])).await.unwrap();

        assert_eq!(f.quantities().await, stock(&[("A", 4), ("B", 1), ("C", 9)]));
    }

    #[tokio::test]
    async fn out_of_stock_rolls_back_whole_batch() {
        let f = fixture(MemoryStore::new(), &[("A", 5), ("EMPTY", 0), ("C", 3)]).await;

        let err = f.engine.reserve_products(&codes(&["A", "EMPTY", "C"])).await.unwrap_err();

        assert!(matches!(err, InventoryError::OutOfStock(ref code) if code == "EMPTY"));
        assert_eq!(f.quantities().await, stock(&[("A", 5), ("EMPTY", 0), ("C", 3)]));
    }

    #[tokio::test]
    async fn unknown_code_rolls_back_whole_batch() {
        let f = fixture(MemoryStore::new(), &[("A", 5), ("B", 1)]).await;

        let err = f.engine.reserve_products(&codes(&["A", "B", "NOPE"])).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(_)));

        let err = f.engine.release_products(&codes(&["A", "NOPE"])).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(_)));

        assert_eq!(f.quantities().await, stock(&[("A", 5), ("B", 1)]));
    }

    #[tokio::test]
    async fn empty_and_blank_batches_are_rejected() {
        let f = fixture(MemoryStore::new(), &[("A", 1)]).await;

        let err = f.engine.reserve_products(&[]).await.unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(ref m) if m == "empty product codes"));

        let err = f.engine.release_products(&[]).await.unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(_)));

        let err = f.engine.reserve_products(&codes(&["A", "  "])).await.unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(_)));

        assert_eq!(f.quantities().await, stock(&[("A", 1)]));
    }

    #[tokio::test]
    async fn reserve_then_release_restores_quantity() {
        let f = fixture(MemoryStore::new(), &[("A", 3)]).await;

        f.engine.reserve_products(&codes(&["A"])).await.unwrap();
        assert_eq!(f.quantities().await, stock(&[("A", 2)]));

        f.engine.release_products(&codes(&["A"])).await.unwrap();
        assert_eq!(f.quantities().await, stock(&[("A", 3)]));
    }

    #[tokio::test]
    async fn release_has_no_ceiling() {
        let f = fixture(MemoryStore::new(), &[("A", 1)]).await;

        f.engine.release_products(&codes(&["A", "A"])).await.unwrap();

        assert_eq!(f.quantities().await, stock(&[("A", 3)]));
    }

    #[tokio::test]
    async fn repeated_codes_drain_stock_within_one_batch() {
        let f = fixture(MemoryStore::new(), &[("SH1", 3)]).await;

        f.engine.reserve_products(&codes(&["SH1", "SH1", "SH1"])).await.unwrap();
        assert_eq!(f.quantities().await, stock(&[("SH1", 0)]));

        let err = f.engine.reserve_products(&codes(&["SH1"])).await.unwrap_err();
        assert!(matches!(err, InventoryError::OutOfStock(_)));
        assert_eq!(f.quantities().await, stock(&[("SH1", 0)]));
    }

    #[tokio::test]
    async fn overdrawn_repeated_codes_reserve_nothing() {
        let f = fixture(MemoryStore::new(), &[("SH1", 2)]).await;

        let err = f.engine.reserve_products(&codes(&["SH1", "SH1", "SH1"])).await.unwrap_err();

        assert!(matches!(err, InventoryError::OutOfStock(_)));
        assert_eq!(f.quantities().await, stock(&[("SH1", 2)]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_never_oversell() {
        let f = fixture(MemoryStore::new(), &[("HOT", 7)]).await;

        let tasks = (0..20).map(|_| {
            let engine = f.engine.clone();
            tokio::spawn(async move { engine.reserve_products(&["HOT".to_string()]).await })
        });
        let results: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let out_of_stock = results
            .iter()
            .filter(|r| matches!(r, Err(InventoryError::OutOfStock(_))))
            .count();

        assert_eq!(successes, 7);
        assert_eq!(out_of_stock, 13);
        assert_eq!(f.quantities().await, stock(&[("HOT", 0)]));
    }

    #[tokio::test]
    async fn storage_failure_mid_batch_rolls_back() {
        let store = MemoryStore::new().with_failing_write(2);
        let f = fixture(store, &[("A", 5), ("B", 2)]).await;

        let err = f.engine.reserve_products(&codes(&["A", "B"])).await.unwrap_err();

        assert!(matches!(err, InventoryError::StorageFailure(_)));
        assert!(err.is_retriable());
        assert_eq!(f.quantities().await, stock(&[("A", 5), ("B", 2)]));

        f.engine.reserve_products(&codes(&["B"])).await.unwrap();
        assert_eq!(f.quantities().await, stock(&[("A", 5), ("B", 1)]));
    }

    #[tokio::test]
    async fn release_past_integer_range_is_rejected() {
        let f = fixture(MemoryStore::new(), &[("A", 4), ("MAX", i32::MAX)]).await;

        let err = f.engine.release_products(&codes(&["A", "MAX"])).await.unwrap_err();

        assert!(matches!(err, InventoryError::InvalidArgument(ref m) if m == "quantity of product MAX out of range"));
        assert_eq!(f.quantities().await, stock(&[("A", 4), ("MAX", i32::MAX)]));
    }

    #[tokio::test]
    async fn cancelled_batch_commits_nothing() {
        let store = MemoryStore::new().with_latency(Duration::from_millis(40));
        let f = fixture(store, &[("A", 1), ("B", 1), ("C", 1)]).await;

        let batch = codes(&["A", "B", "C"]);
        let outcome = tokio::time::timeout(Duration::from_millis(60), f.engine.reserve_products(&batch)).await;

        assert!(outcome.is_err());
        assert_eq!(f.quantities().await, stock(&[("A", 1), ("B", 1), ("C", 1)]));
    }
}
