//! # coupon-core: Pure Discount Engine
//!
//! Decides whether a coupon matches a cart, how much it takes off, and how
//! that discount lands on the cart's lines.
//!
//! ## Layers
//! ```text
//!   coupons CLI ──► coupon-db::CouponService ──► coupon-core
//!                   (load, decode, bump usage)   (this crate)
//!
//!   coupon-core
//!     validation   reject malformed carts and rules
//!     eligibility  active / expiry / usage / minimum cart
//!     evaluator    which coupons apply, and for how much
//!     applier      split one coupon's discount over the lines
//! ```
//!
//! No I/O happens here and the clock is always passed in, so every result
//! depends only on the arguments.
//!
//! ## Modules
//!
//! - [`types`] - Cart, coupon and rule types, engine outputs
//! - [`money`] - Integer cents and rounding
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation boundary
//! - [`eligibility`] - Active / expiry / usage / minimum-cart checks
//! - [`evaluator`] - Applicable-coupon filtering and discount amounts
//! - [`applier`] - Per-line discount allocation for one coupon
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use coupon_core::{Cart, CartLine, CartWiseRule, Coupon, CouponRule, DiscountRate, Money};
//! use coupon_core::evaluator::filter_applicable;
//!
//! let cart = Cart::new(vec![
//!     CartLine::new(1, 2, Money::from_cents(5000)),
//!     CartLine::new(2, 1, Money::from_cents(3000)),
//! ]);
//! let coupon = Coupon::new(1, CouponRule::CartWise(CartWiseRule {
//!     threshold: Money::from_cents(10000),
//!     discount_bps: DiscountRate::from_bps(1000),
//! }));
//!
//! let applicable = filter_applicable(&[coupon], &cart, Utc::now());
//! assert_eq!(applicable[0].discount.cents(), 1300); // 10% of $130.00
//! ```

pub mod applier;
pub mod eligibility;
pub mod error;
pub mod evaluator;
pub mod money;
pub mod types;
pub mod validation;

pub use applier::{apply_coupon, apply_to_cart};
pub use error::{CoreError, CoreResult, ValidationError};
pub use evaluator::filter_applicable;
pub use money::Money;
pub use types::*;

// Input limits enforced by `validation`.
pub const MAX_CART_ITEMS: usize = 100;
pub const MAX_ITEM_QUANTITY: i64 = 999;
/// $1,000,000,000.00. A full cart at this price still fits in `i64` cents.
pub const MAX_UNIT_PRICE_CENTS: i64 = 100_000_000_000;
pub const MAX_CODE_LENGTH: usize = 50;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

