//! # Eligibility Module
//!
//! The checks a coupon must pass before its rule is even looked at.
//!
//! ## Two Policies, One Set of Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                   ineligibility(coupon, subtotal, now)                  │
//! │                      │                                                  │
//! │        ┌─────────────┴──────────────┐                                   │
//! │        ▼                            ▼                                   │
//! │  filter_applicable            check_eligibility                         │
//! │  (list coupons)               (apply one coupon)                        │
//! │  Some(_) → skip silently      Some(_) → CoreError, fail fast            │
//! │                                                                         │
//! │  Order: inactive → expired → usage limit → minimum cart value          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Coupon;

/// Why a coupon cannot be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    Inactive,
    Expired { expired_at: DateTime<Utc> },
    UsageLimitReached { max_usage: i64 },
    BelowMinimumCartValue { required: Money },
}

impl Ineligibility {
    /// Converts the reason into the error a direct application reports.
    pub fn into_error(self, coupon_id: i64, cart_subtotal: Money) -> CoreError {
        match self {
            Ineligibility::Inactive => CoreError::CouponInactive { coupon_id },
            Ineligibility::Expired { expired_at } => CoreError::CouponExpired {
                coupon_id,
                expired_at,
            },
            Ineligibility::UsageLimitReached { max_usage } => CoreError::UsageLimitExceeded {
                coupon_id,
                max_usage,
            },
            Ineligibility::BelowMinimumCartValue { required } => {
                CoreError::MinimumCartValueNotMet {
                    required,
                    actual: cart_subtotal,
                }
            }
        }
    }
}

/// Checks the cart-independent status of a coupon.
///
/// A coupon is expired once its expiry time is strictly before `now`.
pub fn status_ineligibility(coupon: &Coupon, now: DateTime<Utc>) -> Option<Ineligibility> {
    if !coupon.is_active {
        return Some(Ineligibility::Inactive);
    }

    if let Some(expired_at) = coupon.expires_at {
        if expired_at < now {
            return Some(Ineligibility::Expired { expired_at });
        }
    }

    if let Some(max_usage) = coupon.max_usage {
        if coupon.usage_count >= max_usage {
            return Some(Ineligibility::UsageLimitReached { max_usage });
        }
    }

    None
}

/// Runs every eligibility check in order and returns the first failure.
pub fn ineligibility(
    coupon: &Coupon,
    cart_subtotal: Money,
    now: DateTime<Utc>,
) -> Option<Ineligibility> {
    if let Some(reason) = status_ineligibility(coupon, now) {
        return Some(reason);
    }

    match coupon.min_cart_value {
        Some(required) if cart_subtotal < required => {
            Some(Ineligibility::BelowMinimumCartValue { required })
        }
        _ => None,
    }
}

/// Guard for a direct "apply this coupon" request.
///
/// ## Errors
/// The first violated check, in order: `CouponInactive`, `CouponExpired`,
/// `UsageLimitExceeded`, `MinimumCartValueNotMet`.
pub fn check_eligibility(
    coupon: &Coupon,
    cart_subtotal: Money,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    match ineligibility(coupon, cart_subtotal, now) {
        Some(reason) => Err(reason.into_error(coupon.id, cart_subtotal)),
        None => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
