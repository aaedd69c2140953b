use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Failure taxonomy shared by the reservation engine, the catalog and the API.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Malformed or empty input. Not retriable as-is.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    /// Carries the code of the product that had no stock left.
    #[error("product is out of stock: {0}")]
    OutOfStock(String),

    /// Transaction begin/exec/commit failures, pool exhaustion and timeouts.
    #[error("storage failure: {0}")]
    StorageFailure(String),
}

impl InventoryError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn out_of_stock(code: impl Into<String>) -> Self {
        Self::OutOfStock(code.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageFailure(msg.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::NotFound(_) => 404,
            Self::OutOfStock(_) => 409,
            Self::StorageFailure(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::OutOfStock(_) => "out_of_stock",
            Self::StorageFailure(_) => "storage_failure",
        }
    }

    /// Whether the same request may succeed later without being changed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::StorageFailure(_))
    }
}

impl From<DieselError> for InventoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound("record not found".to_string()),
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::InvalidArgument(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::NotFound(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::InvalidArgument(info.message().to_string()),
                _ => Self::StorageFailure(info.message().to_string()),
            },
            other => Self::StorageFailure(other.to_string()),
        }
    }
}
