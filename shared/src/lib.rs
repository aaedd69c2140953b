use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

mod error;
mod retry;

pub use error::InventoryError;
pub use retry::{retry_with_backoff, ConnectionError, RetryPolicy};

pub type Result<T, E = InventoryError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: i32,
    pub name: String,
    pub is_available: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub name: String,
    #[serde(default)]
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub size: BigDecimal,
    pub code: String,
    pub quantity: i32,
    pub warehouse_id: i32,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub size: BigDecimal,
    pub code: String,
    pub quantity: i32,
    pub warehouse_id: i32,
}

/// Stock level of a single product as reported per warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingProduct {
    pub code: String,
    pub quantity: i32,
}

/// Direction of a batch stock mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockOperation {
    Reserve,
    Release,
}

impl StockOperation {
    /// Quantity change applied to a product for every occurrence of its code.
    pub fn delta(self) -> i32 {
        match self {
            StockOperation::Reserve => -1,
            StockOperation::Release => 1,
        }
    }
}

impl fmt::Display for StockOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockOperation::Reserve => f.write_str("reserve"),
            StockOperation::Release => f.write_str("release"),
        }
    }
}
