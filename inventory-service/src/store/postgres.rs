use async_trait::async_trait;
use bb8::RunError;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::{
    InventoryError, NewProduct, NewWarehouse, Product, RemainingProduct, Result, StockOperation, Warehouse,
};
use std::fmt::Display;

use super::{InventoryStore, StockLedger};
use crate::db::DbPool;
use crate::models::*;
use crate::reservation::apply_batch;
use crate::schema::*;

pub fn pool_error<E: Display>(err: RunError<E>) -> InventoryError {
    match err {
        RunError::User(e) => InventoryError::storage(format!("database connection failed: {}", e)),
        RunError::TimedOut => InventoryError::storage("timed out waiting for a database connection"),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

struct PgLedger<'c> {
    conn: &'c mut AsyncPgConnection,
}

#[async_trait]
impl<'c> StockLedger for PgLedger<'c> {
    async fn lock_product(&mut self, code: &str) -> Result<Option<StockLevel>> {
        let level = products::table
            .filter(products::code.eq(code))
            .select((products::id, products::code, products::quantity))
            .for_update()
            .first::<StockLevel>(&mut *self.conn)
            .await
            .optional()?;
        Ok(level)
    }

    async fn adjust_quantity(&mut self, product_id: i32, delta: i32) -> Result<()> {
        diesel::update(products::table.find(product_id))
            .set(products::quantity.eq(products::quantity + delta))
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn insert_warehouse(&self, new: &NewWarehouse) -> Result<Warehouse> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = diesel::insert_into(warehouses::table)
            .values(NewWarehouseRow::from(new))
            .get_result::<WarehouseRow>(&mut *conn)
            .await?;

        Ok(row.into())
    }

    async fn warehouse_exists(&self, id: i32) -> Result<bool> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let exists = diesel::select(diesel::dsl::exists(warehouses::table.find(id)))
            .get_result::<bool>(&mut *conn)
            .await?;

        Ok(exists)
    }

    async fn insert_product(&self, new: &NewProduct) -> Result<Product> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = diesel::insert_into(products::table)
            .values(NewProductRow::from(new))
            .get_result::<ProductRow>(&mut *conn)
            .await
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    InventoryError::invalid_argument(format!("product code {} already exists", new.code))
                }
                DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    InventoryError::not_found(format!("warehouse {} not found", new.warehouse_id))
                }
                other => other.into(),
            })?;

        Ok(row.into())
    }

    async fn delete_product(&self, id: i32) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::delete(products::table.find(id))
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    async fn remaining_products(&self, warehouse_id: i32) -> Result<Vec<RemainingProduct>> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows = products::table
            .filter(products::warehouse_id.eq(warehouse_id))
            .order(products::id.asc())
            .select((products::code, products::quantity))
            .load::<(String, i32)>(&mut *conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(code, quantity)| RemainingProduct { code, quantity })
            .collect())
    }

    async fn run_batch(&self, op: StockOperation, codes: &[String]) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let codes = codes.to_vec();

        conn.transaction::<_, InventoryError, _>(|conn| {
            Box::pin(async move {
                let mut ledger = PgLedger { conn };
                apply_batch(&mut ledger, op, &codes).await
            })
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::sql_query("SELECT 1")
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
