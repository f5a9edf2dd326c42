//! # Cart Applier
//!
//! Applies one chosen coupon to a cart and spreads its discount over the
//! cart's lines.
//!
//! ## Allocation Per Kind
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart-wise     every line gets  discount × line / cart subtotal        │
//! │  product-wise  matching lines get  discount × line / product subtotal  │
//! │  bxgy          each get-product line gets                              │
//! │                  min(get qty × repetitions, line qty) × unit price     │
//! │                                                                         │
//! │  total_price    = cart subtotal (undiscounted)                          │
//! │  final_price    = total_price - total_discount                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Proportional shares are rounded per line and never reconciled, so for
//! percentage rules `total_discount` is the coupon-level discount while the
//! line amounts may drift from it by a cent or two.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::eligibility::check_eligibility;
use crate::error::CoreResult;
use crate::evaluator::{bxgy_repetitions, coupon_discount};
use crate::money::Money;
use crate::types::{AppliedCart, AppliedLine, BxGyRule, Cart, Coupon, CouponRule};

/// Guards a direct application, then applies the coupon.
///
/// ## Errors
/// The first failed eligibility check (see [`check_eligibility`]).
pub fn apply_coupon(coupon: &Coupon, cart: &Cart, now: DateTime<Utc>) -> CoreResult<AppliedCart> {
    check_eligibility(coupon, cart.subtotal(), now)?;
    Ok(apply_to_cart(coupon, cart))
}

/// Allocates a coupon's discount across the cart's lines.
///
/// Eligibility is not checked here; the caller gates first.
pub fn apply_to_cart(coupon: &Coupon, cart: &Cart) -> AppliedCart {
    let total_price = cart.subtotal();

    let (items, total_discount) = match &coupon.rule {
        CouponRule::CartWise(_) => {
            let discount = coupon_discount(coupon, cart);
            let items = cart
                .items
                .iter()
                .map(|line| AppliedLine::from_line(line, discount.share(line.subtotal(), total_price)))
                .collect();
            (items, discount)
        }
        CouponRule::ProductWise(rule) => {
            let discount = coupon_discount(coupon, cart);
            let product_subtotal = cart.subtotal_of(rule.product_id);
            let items = cart
                .items
                .iter()
                .map(|line| {
                    let allocated = if line.product_id == rule.product_id {
                        discount.share(line.subtotal(), product_subtotal)
                    } else {
                        Money::zero()
                    };
                    AppliedLine::from_line(line, allocated)
                })
                .collect();
            (items, discount)
        }
        CouponRule::BuyXGetY(rule) => {
            let items = bxgy_lines(rule, cart);
            let discount = items.iter().map(|line| line.total_discount).sum();
            (items, discount)
        }
    };

    debug!(
        coupon_id = coupon.id,
        kind = %coupon.kind(),
        total_price = %total_price,
        total_discount = %total_discount,
        "Coupon applied to cart"
    );

    AppliedCart::new(items, total_price, total_discount)
}

/// Per-line free value; each line is capped by its own quantity.
///
/// Get entries naming the same product add up their free units before the
/// cap, so a line never gets more than its own subtotal.
fn bxgy_lines(rule: &BxGyRule, cart: &Cart) -> Vec<AppliedLine> {
    let repetitions = bxgy_repetitions(rule, cart);
    let mut free_per_product: HashMap<i64, i64> = HashMap::new();
    for entry in &rule.get_products {
        let free = free_per_product.entry(entry.product_id).or_insert(0);
        *free = free.saturating_add(entry.quantity.saturating_mul(repetitions));
    }

    cart.items
        .iter()
        .map(|line| {
            let allocated = match free_per_product.get(&line.product_id) {
                Some(&free) if free > 0 => line.unit_price.multiply_quantity(free.min(line.quantity)),
                _ => Money::zero(),
            };
            AppliedLine::from_line(line, allocated)
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::{
        BuyGetEntry, BuyMatching, CartLine, CartWiseRule, DiscountRate, ProductWiseRule,
    };
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn dollars(amount: i64) -> Money {
        Money::from_major(amount)
    }

    fn line(product_id: i64, quantity: i64, price: i64) -> CartLine {
        CartLine::new(product_id, quantity, dollars(price))
    }

    fn basic_cart() -> Cart {
        Cart::new(vec![line(1, 2, 50), line(2, 1, 30)])
    }

    fn cart_wise(threshold: i64, bps: u32) -> Coupon {
        Coupon::new(
            1,
            CouponRule::CartWise(CartWiseRule {
                threshold: dollars(threshold),
                discount_bps: DiscountRate::from_bps(bps),
            }),
        )
    }

    fn product_wise(product_id: i64, bps: u32) -> Coupon {
        Coupon::new(
            2,
            CouponRule::ProductWise(ProductWiseRule {
                product_id,
                discount_bps: DiscountRate::from_bps(bps),
            }),
        )
    }

    fn bxgy(buy: &[(i64, i64)], get: &[(i64, i64)], limit: i64) -> Coupon {
        Coupon::new(
            3,
            CouponRule::BuyXGetY(BxGyRule {
                buy_products: buy.iter().map(|&(p, q)| BuyGetEntry::new(p, q)).collect(),
                get_products: get.iter().map(|&(p, q)| BuyGetEntry::new(p, q)).collect(),
                repetition_limit: limit,
                matching: BuyMatching::Pooled,
            }),
        )
    }

    fn line_discounts(applied: &AppliedCart) -> Vec<i64> {
        applied.items.iter().map(|l| l.total_discount.cents()).collect()
    }

    #[test]
    fn test_cart_wise_allocation_scenario() {
        let applied = apply_to_cart(&cart_wise(100, 1000), &basic_cart());

        assert_eq!(line_discounts(&applied), vec![1000, 300]);
        assert_eq!(applied.total_price, dollars(130));
        assert_eq!(applied.total_discount, dollars(13));
        assert_eq!(applied.final_price, dollars(117));
    }

    #[test]
    fn test_cart_wise_below_threshold_allocates_nothing() {
        let applied = apply_to_cart(&cart_wise(500, 1000), &basic_cart());
        assert_eq!(line_discounts(&applied), vec![0, 0]);
        assert_eq!(applied.final_price, applied.total_price);
    }

    #[test]
    fn test_cart_wise_rounding_drift_is_not_reconciled() {
        // $2.00 cap over three $1.00 lines: 67 each, total stays 200
        let cart = Cart::new(vec![line(1, 1, 1), line(2, 1, 1), line(3, 1, 1)]);
        let coupon = cart_wise(0, 10_000).max_discount(Money::from_cents(200));
        let applied = apply_to_cart(&coupon, &cart);

        assert_eq!(line_discounts(&applied), vec![67, 67, 67]);
        assert_eq!(applied.total_discount.cents(), 200);
        assert_eq!(applied.final_price.cents(), 100);
    }

    #[test]
    fn test_empty_cart_has_zero_totals() {
        let applied = apply_to_cart(&cart_wise(0, 1000), &Cart::default());
        assert!(applied.items.is_empty());
        assert!(applied.total_price.is_zero());
        assert!(applied.total_discount.is_zero());
        assert!(applied.final_price.is_zero());
    }

    #[test]
    fn test_product_wise_allocation_scenario() {
        let applied = apply_to_cart(&product_wise(1, 2000), &basic_cart());

        assert_eq!(line_discounts(&applied), vec![2000, 0]);
        assert_eq!(applied.total_discount, dollars(20));
        assert_eq!(applied.final_price, dollars(110));
    }

    #[test]
    fn test_product_wise_splits_across_duplicate_lines() {
        let cart = Cart::new(vec![line(1, 1, 60), line(2, 1, 30), line(1, 1, 40)]);
        let applied = apply_to_cart(&product_wise(1, 1000).max_discount(dollars(5)), &cart);

        // capped $5 split 60:40
        assert_eq!(line_discounts(&applied), vec![300, 0, 200]);
        assert_eq!(applied.total_discount, dollars(5));
    }

    #[test]
    fn test_product_wise_absent_product() {
        let applied = apply_to_cart(&product_wise(9, 2000), &basic_cart());
        assert_eq!(line_discounts(&applied), vec![0, 0]);
        assert!(applied.total_discount.is_zero());
    }

    #[test]
    fn test_bxgy_allocation_scenario() {
        let cart = Cart::new(vec![line(1, 6, 50), line(2, 3, 30), line(3, 2, 25)]);
        let applied = apply_to_cart(&bxgy(&[(1, 3), (2, 3)], &[(3, 1)], 2), &cart);

        assert_eq!(line_discounts(&applied), vec![0, 0, 2500]);
        assert_eq!(applied.total_price, dollars(440));
        assert_eq!(applied.total_discount, dollars(25));
        assert_eq!(applied.final_price, dollars(415));
    }

    #[test]
    fn test_bxgy_lines_capped_independently() {
        // 2 reps → up to 2 free per line of product 3
        let cart = Cart::new(vec![line(1, 4, 10), line(3, 1, 25), line(3, 3, 20)]);
        let applied = apply_to_cart(&bxgy(&[(1, 2)], &[(3, 1)], 5), &cart);

        assert_eq!(line_discounts(&applied), vec![0, 2500, 4000]);
        assert_eq!(applied.total_discount, dollars(65));
    }

    #[test]
    fn test_bxgy_repeated_get_entries_stop_at_line_quantity() {
        // 2 reps, two (3, 1) entries: 4 free units, the line holds 3
        let cart = Cart::new(vec![line(1, 2, 10), line(3, 3, 25)]);
        let applied = apply_to_cart(&bxgy(&[(1, 1)], &[(3, 1), (3, 1)], 5), &cart);

        assert_eq!(line_discounts(&applied), vec![0, 7500]);
        assert_eq!(applied.final_price, dollars(20));
    }

    #[test]
    fn test_bxgy_without_repetitions_allocates_nothing() {
        let applied = apply_to_cart(&bxgy(&[(1, 5)], &[(2, 1)], 2), &basic_cart());
        assert_eq!(line_discounts(&applied), vec![0, 0]);
    }

    #[test]
    fn test_totals_invariant_holds_for_every_kind() {
        let cart = Cart::new(vec![line(1, 6, 50), line(2, 3, 30), line(3, 2, 25)]);
        let coupons = [
            cart_wise(100, 1550),
            product_wise(2, 3333),
            bxgy(&[(1, 2)], &[(2, 1), (3, 2)], 3),
        ];

        for coupon in &coupons {
            let applied = apply_to_cart(coupon, &cart);
            let expected: Money = cart.items.iter().map(CartLine::subtotal).sum();
            assert_eq!(applied.total_price, expected);
            assert_eq!(applied.final_price, applied.total_price - applied.total_discount);
            assert_eq!(applied.items.len(), cart.items.len());
        }
    }

    #[test]
    fn test_apply_coupon_runs_guard() {
        let expired = cart_wise(100, 1000).expires_at(now() - Duration::hours(1));
        let err = apply_coupon(&expired, &basic_cart(), now()).unwrap_err();
        assert!(matches!(err, CoreError::CouponExpired { coupon_id: 1, .. }));

        let inactive = product_wise(1, 2000).active(false);
        let err = apply_coupon(&inactive, &basic_cart(), now()).unwrap_err();
        assert!(matches!(err, CoreError::CouponInactive { coupon_id: 2 }));

        let applied = apply_coupon(&cart_wise(100, 1000), &basic_cart(), now()).unwrap();
        assert_eq!(applied.final_price, dollars(117));
    }

    #[test]
    fn test_apply_coupon_minimum_cart_value() {
        let coupon = product_wise(1, 2000).min_cart_value(dollars(200));
        let err = apply_coupon(&coupon, &basic_cart(), now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MinimumCartValueNotMet { required, .. } if required == dollars(200)
        ));
    }
}
