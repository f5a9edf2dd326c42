//! # Storage and Service Errors
//!
//! [`DbError`] classifies what SQLite said. [`ServiceError`] is what
//! [`CouponService`](crate::CouponService) callers match on: either the
//! store failed, or the engine refused the coupon.
//!
//! ```text
//! sqlx::Error ─► DbError ─┐
//!                         ├─► ServiceError
//!           CoreError ────┘
//! ```

use coupon_core::{CoreError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the requested id, including rows deleted meanwhile.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A `UNIQUE` column already holds the value, in practice `coupons.code`.
    #[error("Duplicate value for {column}")]
    UniqueViolation { column: String },

    /// A `CHECK` rejected the row, e.g. a negative usage count.
    #[error("Constraint violation: {message}")]
    ConstraintViolation { message: String },

    /// The store could not be opened, or the pool was already closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Rule details could not be turned into JSON for storage.
    #[error("Invalid stored details: {0}")]
    Serialization(String),

    /// Every connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

/// SQLite reports constraint failures only through the message text,
/// e.g. `UNIQUE constraint failed: coupons.code`.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if let Some(column) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        column: column.to_string(),
                    }
                } else if msg.starts_with("CHECK constraint failed") {
                    DbError::ConstraintViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Errors returned by [`CouponService`](crate::CouponService).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

impl ServiceError {
    /// The requested coupon id does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Db(DbError::NotFound { .. }))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Coupon", 17);
        assert_eq!(err.to_string(), "Coupon not found: 17");
        assert!(ServiceError::from(err).is_not_found());
    }

    #[test]
    fn test_engine_refusal_is_not_not_found() {
        let err = ServiceError::from(CoreError::CouponInactive { coupon_id: 3 });
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Coupon 3 is not active");
    }

    #[test]
    fn test_validation_wraps_into_core() {
        let err = ServiceError::from(ValidationError::Required {
            field: "code".to_string(),
        });
        assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));
    }
}
