use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared::{NewProduct, NewWarehouse, Product, Warehouse};

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::warehouses)]
pub struct WarehouseRow {
    pub id: i32,
    pub name: String,
    pub is_available: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::warehouses)]
pub struct NewWarehouseRow<'a> {
    pub name: &'a str,
    pub is_available: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::products)]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub size: BigDecimal,
    pub code: String,
    pub quantity: i32,
    pub warehouse_id: i32,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProductRow<'a> {
    pub name: &'a str,
    pub size: &'a BigDecimal,
    pub code: &'a str,
    pub quantity: i32,
    pub warehouse_id: i32,
}

impl<'a> From<&'a NewWarehouse> for NewWarehouseRow<'a> {
    fn from(new: &'a NewWarehouse) -> Self {
        Self {
            name: &new.name,
            is_available: new.is_available,
        }
    }
}

impl<'a> From<&'a NewProduct> for NewProductRow<'a> {
    fn from(new: &'a NewProduct) -> Self {
        Self {
            name: &new.name,
            size: &new.size,
            code: &new.code,
            quantity: new.quantity,
            warehouse_id: new.warehouse_id,
        }
    }
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            is_available: row.is_available,
            created_at: row.created_at,
        }
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            size: row.size,
            code: row.code,
            quantity: row.quantity,
            warehouse_id: row.warehouse_id,
            created_at: row.created_at,
        }
    }
}

/// Locked view of a product row inside a batch transaction.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct StockLevel {
    pub id: i32,
    pub code: String,
    pub quantity: i32,
}
