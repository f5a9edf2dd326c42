//! # Rule Evaluator
//!
//! Decides which coupons apply to a cart and how much each one takes off,
//! without touching the cart.
//!
//! ## Filtering Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for coupon in coupons (input order):                                   │
//! │                                                                         │
//! │    1. status gate      inactive / expired / usage limit  ──► skip      │
//! │    2. cart-value gate  subtotal < min_cart_value          ──► skip      │
//! │    3. discount         per rule kind (below)                            │
//! │    4. discount <= 0                                       ──► skip      │
//! │    5. emit { coupon_id, type, discount, description, code }             │
//! │                                                                         │
//! │  Skips are not errors. They are logged at debug level and dropped.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Discount Per Kind
//! ```text
//! cart-wise     subtotal < threshold ? 0 : subtotal × rate, capped
//! product-wise  Σ subtotal of the product's lines × rate, capped
//! bxgy          repetitions × get bundle, priced from the cart (no cap)
//! ```

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::eligibility;
use crate::money::Money;
use crate::types::{
    ApplicableCoupon, BuyMatching, BxGyRule, Cart, CartWiseRule, Coupon, CouponRule,
    ProductWiseRule,
};

// =============================================================================
// Filtering
// =============================================================================

/// Lists the coupons that give a positive discount on `cart` at time `now`.
///
/// Output preserves input order. Neither the coupons nor the cart are
/// modified, and calling this twice with the same input gives the same
/// output.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use coupon_core::{Cart, CartLine, Coupon, CouponRule, DiscountRate, Money, ProductWiseRule};
/// use coupon_core::evaluator::filter_applicable;
///
/// let cart = Cart::new(vec![CartLine::new(1, 2, Money::from_cents(5000))]);
/// let coupons = vec![
///     Coupon::new(1, CouponRule::ProductWise(ProductWiseRule {
///         product_id: 1,
///         discount_bps: DiscountRate::from_bps(2000),
///     })),
///     Coupon::new(2, CouponRule::ProductWise(ProductWiseRule {
///         product_id: 9, // not in cart
///         discount_bps: DiscountRate::from_bps(2000),
///     })),
/// ];
///
/// let applicable = filter_applicable(&coupons, &cart, Utc::now());
/// assert_eq!(applicable.len(), 1);
/// assert_eq!(applicable[0].discount.cents(), 2000);
/// ```
pub fn filter_applicable(
    coupons: &[Coupon],
    cart: &Cart,
    now: DateTime<Utc>,
) -> Vec<ApplicableCoupon> {
    let subtotal = cart.subtotal();

    coupons
        .iter()
        .filter_map(|coupon| {
            if let Some(reason) = eligibility::ineligibility(coupon, subtotal, now) {
                debug!(coupon_id = coupon.id, ?reason, "Coupon not eligible");
                return None;
            }

            let discount = coupon_discount(coupon, cart);
            if !discount.is_positive() {
                debug!(coupon_id = coupon.id, kind = %coupon.kind(), "Coupon gives no discount");
                return None;
            }

            Some(ApplicableCoupon {
                coupon_id: coupon.id,
                kind: coupon.kind(),
                discount,
                description: coupon.description.clone(),
                code: coupon.code.clone(),
            })
        })
        .collect()
}

// =============================================================================
// Discount Amounts
// =============================================================================

/// Coupon-level discount for a cart, ignoring eligibility.
///
/// `max_discount` caps cart-wise and product-wise rules only.
pub fn coupon_discount(coupon: &Coupon, cart: &Cart) -> Money {
    match &coupon.rule {
        CouponRule::CartWise(rule) => {
            cart_wise_discount(rule, cart.subtotal()).capped_at(coupon.max_discount)
        }
        CouponRule::ProductWise(rule) => {
            product_wise_discount(rule, cart).capped_at(coupon.max_discount)
        }
        CouponRule::BuyXGetY(rule) => bxgy_discount(rule, cart),
    }
}

/// Uncapped cart-wise discount for a cart subtotal.
pub fn cart_wise_discount(rule: &CartWiseRule, subtotal: Money) -> Money {
    if subtotal < rule.threshold {
        return Money::zero();
    }
    subtotal.percentage(rule.discount_bps.clamped())
}

/// Uncapped product-wise discount.
///
/// Every line carrying the product counts; an absent product gives zero.
pub fn product_wise_discount(rule: &ProductWiseRule, cart: &Cart) -> Money {
    cart.subtotal_of(rule.product_id)
        .percentage(rule.discount_bps.clamped())
}

// =============================================================================
// Buy X Get Y
// =============================================================================

/// Number of free bundles the cart earns, capped by the repetition limit.
///
/// Every buy entry counts on its own, so a product listed twice has its
/// cart quantity counted twice.
///
/// ## Matching Policies
/// ```text
/// Pooled      floor(Σ available(entry) / Σ required(entry))
/// PerProduct  min over entries of floor(available(entry) / required(entry))
/// ```
/// A zero requirement never divides; it earns nothing.
pub fn bxgy_repetitions(rule: &BxGyRule, cart: &Cart) -> i64 {
    let buy = &rule.buy_products;

    let earned = match rule.matching {
        BuyMatching::Pooled => {
            let (available, required) = buy.iter().fold((0i64, 0i64), |(avail, req), entry| {
                (
                    avail.saturating_add(cart.quantity_of(entry.product_id)),
                    req.saturating_add(entry.quantity),
                )
            });

            if required <= 0 {
                0
            } else {
                available / required
            }
        }
        BuyMatching::PerProduct => buy
            .iter()
            .map(|entry| {
                if entry.quantity <= 0 {
                    0
                } else {
                    cart.quantity_of(entry.product_id) / entry.quantity
                }
            })
            .min()
            .unwrap_or(0),
    };

    earned.min(rule.repetition_limit).max(0)
}

/// Value of up to `free_units` units of a product, priced line by line in
/// cart order.
fn free_units_value(cart: &Cart, product_id: i64, free_units: i64) -> Money {
    let mut remaining = free_units;
    let mut value = Money::zero();

    for line in cart.lines_for(product_id) {
        if remaining <= 0 {
            break;
        }
        let units = remaining.min(line.quantity);
        value += line.unit_price.multiply_quantity(units);
        remaining -= units;
    }

    value
}

/// Buy-x-get-y discount: the price of the free units present in the cart,
/// summed over every get entry.
///
/// Each entry is capped by the cart quantity of its product on its own. A
/// get product missing from the cart contributes nothing.
pub fn bxgy_discount(rule: &BxGyRule, cart: &Cart) -> Money {
    let repetitions = bxgy_repetitions(rule, cart);
    if repetitions <= 0 {
        return Money::zero();
    }

    rule.get_products
        .iter()
        .map(|entry| {
            let free_units = entry.quantity.saturating_mul(repetitions);
            free_units_value(cart, entry.product_id, free_units)
        })
        .fold(Money::zero(), Money::saturating_add)
}

// =============================================================================
// Unit Tests
// =============================================================================
