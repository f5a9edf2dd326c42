//! # Errors
//!
//! Two enums live here. [`ValidationError`] rejects malformed input (a cart
//! line with quantity 0, a BxGy rule with no buy products). [`CoreError`]
//! explains why one specific coupon cannot be applied to one specific cart.
//!
//! ```text
//! ValidationError ──► CoreError ──► ServiceError (coupon-db) ──► CLI exit 1
//!                                         ▲
//!                               DbError ──┘
//! ```
//!
//! Listing applicable coupons never produces these errors: an ineligible
//! coupon is simply left out of the list. Only a direct "apply this coupon"
//! request surfaces *why* it was rejected.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::money::Money;

/// Why a coupon was refused, or why its stored rule could not be read.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Coupon has been switched off.
    #[error("Coupon {coupon_id} is not active")]
    CouponInactive { coupon_id: i64 },

    /// Coupon expiry time is before the evaluation time.
    #[error("Coupon {coupon_id} expired at {expired_at}")]
    CouponExpired {
        coupon_id: i64,
        expired_at: DateTime<Utc>,
    },

    /// Coupon has already been redeemed `max_usage` times.
    #[error("Coupon {coupon_id} usage limit of {max_usage} reached")]
    UsageLimitExceeded { coupon_id: i64, max_usage: i64 },

    /// Cart subtotal is below the coupon's minimum cart value.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart subtotal: $40.00
    ///      │
    ///      ▼
    /// apply SAVE10 (min cart value $50.00)
    ///      │
    ///      ▼
    /// MinimumCartValueNotMet { required: $50.00, actual: $40.00 }
    ///      │
    ///      ▼
    /// UI shows: "Minimum cart value of $50.00 required"
    /// ```
    #[error("Minimum cart value of {required} required (cart is {actual})")]
    MinimumCartValueNotMet { required: Money, actual: Money },

    /// The stored kind tag is not one of `cart-wise`, `product-wise`, `bxgy`.
    #[error("Unsupported coupon type: {0}")]
    UnsupportedRuleKind(String),

    /// The kind tag is known but its details do not have the expected shape.
    #[error("Invalid {kind} coupon details: {reason}")]
    InvalidRuleDetails { kind: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Malformed carts and coupon definitions, caught before evaluation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Missing, empty, or an empty list.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// e.g. a coupon code containing whitespace.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
