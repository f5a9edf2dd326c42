//! # Domain Types
//!
//! Core domain types used throughout the coupon engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────────┐                     │
//! │  │      Cart       │   │         Coupon          │                     │
//! │  │  ─────────────  │   │  ─────────────────────  │                     │
//! │  │  items: Vec<    │   │  id                     │                     │
//! │  │    CartLine>    │   │  rule: CouponRule ──────┼──┐                  │
//! │  └─────────────────┘   │  is_active, expires_at  │  │                  │
//! │                        │  usage_count, max_usage │  │                  │
//! │                        │  min_cart_value         │  │                  │
//! │                        │  max_discount           │  │                  │
//! │                        └─────────────────────────┘  │                  │
//! │                                                      ▼                  │
//! │                   CouponRule = CartWise | ProductWise | BuyXGetY       │
//! │                                                                         │
//! │  Outputs: ApplicableCoupon (list view), AppliedCart (per-line view)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stored Shape vs Typed Shape
//! Storage keeps a kind tag (`"cart-wise"`) next to a JSON details blob.
//! [`CouponRule::decode`] turns that pair into the closed sum type once, so
//! nothing downstream ever re-checks the shape of the details.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation;

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1550 bps = 15.5% off
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// 100% off.
    pub const FULL: DiscountRate = DiscountRate(10_000);

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Returns the rate limited to at most 100%.
    ///
    /// Validation rejects rates above 100% before they are stored; the engine
    /// still clamps so an unvalidated rule can never discount more than the
    /// amount it applies to.
    #[inline]
    pub const fn clamped(&self) -> Self {
        if self.0 > Self::FULL.0 {
            Self::FULL
        } else {
            *self
        }
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One line of a shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    /// Catalog product identifier.
    pub product_id: i64,
    /// Units of the product on this line (> 0 after validation).
    pub quantity: i64,
    /// Price of one unit.
    pub unit_price: Money,
}

impl CartLine {
    pub fn new(product_id: i64, quantity: i64, unit_price: Money) -> Self {
        CartLine {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Line subtotal (unit price × quantity).
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// An ordered cart snapshot.
///
/// ## Invariants
/// - Line order is preserved in every output
/// - The same `product_id` may appear on several lines; each line is kept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn new(items: Vec<CartLine>) -> Self {
        Cart { items }
    }

    /// Sum of every line subtotal, before any discount.
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartLine::subtotal).sum()
    }

    /// Lines carrying the given product, in cart order.
    pub fn lines_for(&self, product_id: i64) -> impl Iterator<Item = &CartLine> {
        self.items
            .iter()
            .filter(move |line| line.product_id == product_id)
    }

    /// Total units of a product across all of its lines.
    pub fn quantity_of(&self, product_id: i64) -> i64 {
        self.lines_for(product_id).map(|line| line.quantity).sum()
    }

    /// Combined subtotal of a product across all of its lines.
    pub fn subtotal_of(&self, product_id: i64) -> Money {
        self.lines_for(product_id).map(CartLine::subtotal).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Coupon Kind
// =============================================================================

/// The tag identifying which rule shape a coupon uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum CouponKind {
    /// Percentage off the whole cart above a threshold.
    CartWise,
    /// Percentage off one product's lines.
    ProductWise,
    /// Buy some products, get others free.
    Bxgy,
}

impl CouponKind {
    /// Every supported kind.
    pub const ALL: [CouponKind; 3] = [CouponKind::CartWise, CouponKind::ProductWise, CouponKind::Bxgy];

    /// The stored tag for this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CouponKind::CartWise => "cart-wise",
            CouponKind::ProductWise => "product-wise",
            CouponKind::Bxgy => "bxgy",
        }
    }

    /// Looks up a kind by its stored tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for CouponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Coupon Rules
// =============================================================================

/// `CartWise` details: `discount` off the whole cart once it reaches `threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartWiseRule {
    pub threshold: Money,
    pub discount_bps: DiscountRate,
}

/// `ProductWise` details: `discount` off the lines of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductWiseRule {
    pub product_id: i64,
    pub discount_bps: DiscountRate,
}

/// A `(product, quantity)` pair on either side of a buy-x-get-y offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BuyGetEntry {
    pub product_id: i64,
    pub quantity: i64,
}

impl BuyGetEntry {
    pub const fn new(product_id: i64, quantity: i64) -> Self {
        BuyGetEntry {
            product_id,
            quantity,
        }
    }
}

/// How buy-side quantities are matched against the cart.
///
/// ## Example
/// Buy `[(A, 3), (B, 3)]`, cart has 6×A and 0×B:
/// ```text
/// Pooled      : (6 + 0) / (3 + 3) = 1 repetition
/// PerProduct  : min(6 / 3, 0 / 3) = 0 repetitions
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BuyMatching {
    /// Quantities of every buy product are summed and compared with the
    /// summed requirement. Any mix of buy products qualifies.
    #[default]
    Pooled,
    /// Every buy product must meet its own quantity on each repetition.
    PerProduct,
}

/// `BuyXGetY` details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BxGyRule {
    pub buy_products: Vec<BuyGetEntry>,
    pub get_products: Vec<BuyGetEntry>,
    /// Maximum number of free bundles granted per application.
    pub repetition_limit: i64,
    #[serde(default)]
    pub matching: BuyMatching,
}

/// A coupon's discount rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "details")]
pub enum CouponRule {
    #[serde(rename = "cart-wise")]
    CartWise(CartWiseRule),
    #[serde(rename = "product-wise")]
    ProductWise(ProductWiseRule),
    #[serde(rename = "bxgy")]
    BuyXGetY(BxGyRule),
}

impl CouponRule {
    /// Returns the kind tag of this rule.
    pub const fn kind(&self) -> CouponKind {
        match self {
            CouponRule::CartWise(_) => CouponKind::CartWise,
            CouponRule::ProductWise(_) => CouponKind::ProductWise,
            CouponRule::BuyXGetY(_) => CouponKind::Bxgy,
        }
    }

    /// Decodes a stored `(kind tag, details)` pair into a validated rule.
    ///
    /// ## Errors
    /// - `UnsupportedRuleKind` - tag is not a known kind
    /// - `InvalidRuleDetails` - details do not match the kind's shape
    /// - `Validation` - details are well-formed but out of range
    ///
    /// ## Example
    /// ```rust
    /// use coupon_core::types::{CouponKind, CouponRule};
    ///
    /// let details = serde_json::json!({ "threshold": 10000, "discount_bps": 1000 });
    /// let rule = CouponRule::decode("cart-wise", details).unwrap();
    /// assert_eq!(rule.kind(), CouponKind::CartWise);
    /// ```
    pub fn decode(tag: &str, details: serde_json::Value) -> CoreResult<Self> {
        let kind = CouponKind::from_tag(tag)
            .ok_or_else(|| CoreError::UnsupportedRuleKind(tag.to_string()))?;

        let rule = match kind {
            CouponKind::CartWise => serde_json::from_value(details).map(CouponRule::CartWise),
            CouponKind::ProductWise => {
                serde_json::from_value(details).map(CouponRule::ProductWise)
            }
            CouponKind::Bxgy => serde_json::from_value(details).map(CouponRule::BuyXGetY),
        }
        .map_err(|e| CoreError::InvalidRuleDetails {
            kind: kind.to_string(),
            reason: e.to_string(),
        })?;

        validation::validate_rule(&rule)?;
        Ok(rule)
    }

    /// Serializes only the details half, the shape stored next to the tag.
    pub fn details_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            CouponRule::CartWise(rule) => serde_json::to_value(rule),
            CouponRule::ProductWise(rule) => serde_json::to_value(rule),
            CouponRule::BuyXGetY(rule) => serde_json::to_value(rule),
        }
    }
}

// =============================================================================
// Coupon
// =============================================================================

/// A coupon: one rule plus eligibility and display metadata.
///
/// `usage_count` is read here but only ever written by the storage layer,
/// after a successful application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coupon {
    pub id: i64,
    pub rule: CouponRule,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
    pub max_usage: Option<i64>,
    pub min_cart_value: Option<Money>,
    /// Ceiling for CartWise and ProductWise discounts. Ignored by BxGy.
    pub max_discount: Option<Money>,
    pub description: Option<String>,
    pub code: Option<String>,
}

impl Coupon {
    /// Creates an active coupon with no limits.
    pub fn new(id: i64, rule: CouponRule) -> Self {
        Coupon {
            id,
            rule,
            is_active: true,
            expires_at: None,
            usage_count: 0,
            max_usage: None,
            min_cart_value: None,
            max_discount: None,
            description: None,
            code: None,
        }
    }

    pub fn kind(&self) -> CouponKind {
        self.rule.kind()
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn usage(mut self, usage_count: i64, max_usage: Option<i64>) -> Self {
        self.usage_count = usage_count;
        self.max_usage = max_usage;
        self
    }

    pub fn min_cart_value(mut self, value: Money) -> Self {
        self.min_cart_value = Some(value);
        self
    }

    pub fn max_discount(mut self, cap: Money) -> Self {
        self.max_discount = Some(cap);
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// =============================================================================
// Engine Outputs
// =============================================================================

/// One entry of the "applicable coupons" report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ApplicableCoupon {
    pub coupon_id: i64,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    pub discount: Money,
    pub description: Option<String>,
    pub code: Option<String>,
}

/// A cart line annotated with the discount allocated to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_discount: Money,
}

impl AppliedLine {
    pub fn from_line(line: &CartLine, total_discount: Money) -> Self {
        AppliedLine {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_discount,
        }
    }
}

/// The cart after one coupon has been applied.
///
/// ## Invariants
/// - `total_price` is the undiscounted cart subtotal
/// - `final_price == total_price - total_discount`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedCart {
    pub items: Vec<AppliedLine>,
    pub total_price: Money,
    pub total_discount: Money,
    pub final_price: Money,
}

impl AppliedCart {
    /// Builds the aggregate totals around already-allocated lines.
    pub fn new(items: Vec<AppliedLine>, total_price: Money, total_discount: Money) -> Self {
        AppliedCart {
            items,
            total_price,
            total_discount,
            final_price: total_price - total_discount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_discount_rate_is_whole_bps_on_the_wire() {
        assert_eq!(serde_json::to_value(DiscountRate::from_bps(1550)).unwrap(), json!(1550));
        let rate: DiscountRate = serde_json::from_value(json!(825)).unwrap();
        assert_eq!(rate.bps(), 825);
        assert!(serde_json::from_value::<DiscountRate>(json!(8.25)).is_err());
    }

    #[test]
    fn test_discount_rate_clamped() {
        assert_eq!(DiscountRate::from_bps(12_000).clamped(), DiscountRate::FULL);
        assert_eq!(DiscountRate::from_bps(500).clamped().bps(), 500);
    }

    #[test]
    fn test_cart_aggregates_duplicate_products() {
        let cart = Cart::new(vec![
            CartLine::new(1, 2, Money::from_cents(5000)),
            CartLine::new(2, 1, Money::from_cents(3000)),
            CartLine::new(1, 1, Money::from_cents(4000)),
        ]);

        assert_eq!(cart.subtotal().cents(), 17000);
        assert_eq!(cart.quantity_of(1), 3);
        assert_eq!(cart.subtotal_of(1).cents(), 14000);
        assert_eq!(cart.quantity_of(9), 0);
        assert!(cart.subtotal_of(9).is_zero());
    }

    #[test]
    fn test_kind_tags() {
        for kind in CouponKind::ALL {
            assert_eq!(CouponKind::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(CouponKind::from_tag("CART_WISE"), None);
        assert_eq!(
            serde_json::to_value(CouponKind::ProductWise).unwrap(),
            json!("product-wise")
        );
    }

    #[test]
    fn test_decode_cart_wise() {
        let rule = CouponRule::decode(
            "cart-wise",
            json!({ "threshold": 10000, "discount_bps": 1000 }),
        )
        .unwrap();

        assert_eq!(
            rule,
            CouponRule::CartWise(CartWiseRule {
                threshold: Money::from_cents(10000),
                discount_bps: DiscountRate::from_bps(1000),
            })
        );
    }

    #[test]
    fn test_decode_bxgy_defaults_to_pooled() {
        let rule = CouponRule::decode(
            "bxgy",
            json!({
                "buy_products": [{ "product_id": 1, "quantity": 3 }],
                "get_products": [{ "product_id": 3, "quantity": 1 }],
                "repetition_limit": 2
            }),
        )
        .unwrap();

        match rule {
            CouponRule::BuyXGetY(bxgy) => assert_eq!(bxgy.matching, BuyMatching::Pooled),
            other => panic!("expected bxgy rule, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_unknown_kind() {
        let err = CouponRule::decode("free-shipping", json!({})).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedRuleKind(tag) if tag == "free-shipping"));
    }

    #[test]
    fn test_decode_malformed_details() {
        let err = CouponRule::decode("product-wise", json!({ "discount_bps": 500 })).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRuleDetails { .. }));

        // negative rates never deserialize into a bps value
        let err = CouponRule::decode(
            "cart-wise",
            json!({ "threshold": 0, "discount_bps": -10 }),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRuleDetails { .. }));
    }

    #[test]
    fn test_decode_rejects_out_of_range_rate() {
        let err = CouponRule::decode(
            "product-wise",
            json!({ "product_id": 4, "discount_bps": 10001 }),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_details_json_round_trips_through_decode() {
        let rule = CouponRule::ProductWise(ProductWiseRule {
            product_id: 7,
            discount_bps: DiscountRate::from_bps(2500),
        });
        let details = rule.details_json().unwrap();
        assert_eq!(details, json!({ "product_id": 7, "discount_bps": 2500 }));
        assert_eq!(CouponRule::decode(rule.kind().as_str(), details).unwrap(), rule);
    }

    #[test]
    fn test_applied_cart_final_price() {
        let applied = AppliedCart::new(vec![], Money::from_cents(13000), Money::from_cents(1300));
        assert_eq!(applied.final_price.cents(), 11700);
    }
}
