//! # Money
//!
//! Cart prices, thresholds, caps and discounts are all whole cents held in
//! an `i64`. Percentages are basis points ([`DiscountRate`]), so a coupon
//! evaluation never touches a float.
//!
//! ```text
//!   unit_price × quantity ──► line subtotal ──Σ──► cart subtotal
//!                                                      │
//!                          percentage(bps), capped_at  ▼
//!                                                coupon discount
//!                                                      │
//!                          share(line, cart)           ▼
//!                                                per-line discount
//! ```
//!
//! Rounding happens in exactly two places, [`Money::percentage`] and
//! [`Money::share`], and both round half up.
//!
//! ```rust
//! use coupon_core::money::Money;
//!
//! let shirt = Money::from_cents(2450);
//! assert_eq!(shirt.multiply_quantity(4).cents(), 9800);
//! assert_eq!(shirt.to_string(), "$24.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::DiscountRate;

/// An amount in cents. Serializes as a bare integer: `"unit_price": 2450`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Whole dollars, for tests and seed data: `from_major(100)` is $100.00.
    #[inline]
    pub const fn from_major(dollars: i64) -> Self {
        Money(dollars * 100)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Sum that stops at `i64::MAX` instead of wrapping.
    #[inline]
    pub const fn saturating_add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }

    /// Price of `qty` units at this unit price.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `rate` of this amount, rounded half up to the cent.
    ///
    /// ```rust
    /// use coupon_core::money::Money;
    /// use coupon_core::types::DiscountRate;
    ///
    /// // 15.5% of $130.00
    /// let off = Money::from_cents(13000).percentage(DiscountRate::from_bps(1550));
    /// assert_eq!(off.cents(), 2015);
    /// ```
    pub fn percentage(&self, rate: DiscountRate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// `self × part ÷ whole`, rounded half up; zero when `whole` is zero.
    ///
    /// Spreads a coupon-level discount over cart lines:
    ///
    /// ```rust
    /// use coupon_core::money::Money;
    ///
    /// let discount = Money::from_cents(1300);
    /// let line = discount.share(Money::from_cents(3000), Money::from_cents(13000));
    /// assert_eq!(line.cents(), 300);
    /// ```
    pub fn share(&self, part: Money, whole: Money) -> Money {
        if whole.0 == 0 {
            return Money::zero();
        }
        let scaled = 2 * self.0 as i128 * part.0 as i128;
        let whole = whole.0 as i128;
        Money::from_cents(((scaled + whole) / (2 * whole)) as i64)
    }

    /// The smaller of this amount and `cap`; unchanged without a cap.
    #[inline]
    pub fn capped_at(self, cap: Option<Money>) -> Money {
        cap.map_or(self, |cap| self.min(cap))
    }
}

/// `$24.50`, `-$0.75`. Plain dollars, for logs and terminal output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "${}.{:02}", abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_dollars_and_cents() {
        assert_eq!(Money::from_cents(2450).to_string(), "$24.50");
        assert_eq!(Money::from_cents(7).to_string(), "$0.07");
        assert_eq!(Money::from_cents(-75).to_string(), "-$0.75");
        assert_eq!(Money::from_major(130).to_string(), "$130.00");
    }

    #[test]
    fn test_line_arithmetic() {
        let mug = Money::from_cents(899);
        let lines = [mug * 2, Money::from_cents(1250)];
        let subtotal: Money = lines.iter().sum();

        assert_eq!(subtotal.cents(), 3048);
        assert_eq!((subtotal - mug).cents(), 2149);

        let mut running = Money::zero();
        running += mug;
        running -= Money::from_cents(99);
        assert_eq!(running.cents(), 800);
    }

    #[test]
    fn test_percentage_rounding() {
        // 15.5% of $130.00
        let cart = Money::from_major(130);
        assert_eq!(cart.percentage(DiscountRate::from_bps(1550)).cents(), 2015);

        // 12.5% of 4 cents is exactly half a cent; rounds up
        assert_eq!(Money::from_cents(4).percentage(DiscountRate::from_bps(1250)).cents(), 1);

        // 33.33% of $0.01 rounds down to nothing
        assert!(Money::from_cents(1).percentage(DiscountRate::from_bps(3333)).is_zero());
    }

    #[test]
    fn test_percentage_bounds() {
        let cart = Money::from_cents(6420);
        assert!(cart.percentage(DiscountRate::zero()).is_zero());
        assert_eq!(cart.percentage(DiscountRate::FULL), cart);
    }

    #[test]
    fn test_share_by_line_subtotal() {
        let discount = Money::from_cents(2000);
        let cart = Money::from_cents(8000);

        assert_eq!(discount.share(Money::from_cents(6000), cart).cents(), 1500);
        assert_eq!(discount.share(Money::from_cents(2000), cart).cents(), 500);
        assert!(discount.share(Money::from_cents(50), Money::zero()).is_zero());
    }

    /// Three equal lines sharing $2.00: each rounds up to 67 cents.
    #[test]
    fn test_share_does_not_reconcile_rounding() {
        let discount = Money::from_cents(200);
        let line = Money::from_cents(100);
        let cart = Money::from_cents(300);

        let allocated: Money = (0..3).map(|_| discount.share(line, cart)).sum();
        assert_eq!(allocated.cents(), 201);
    }

    #[test]
    fn test_saturating_add() {
        let near_max = Money::from_cents(i64::MAX - 10);
        assert_eq!(near_max.saturating_add(Money::from_cents(50)).cents(), i64::MAX);
        assert_eq!(Money::from_cents(40).saturating_add(Money::from_cents(2)).cents(), 42);
    }

    #[test]
    fn test_capped_at() {
        let raw = Money::from_cents(3900);
        assert_eq!(raw.capped_at(Some(Money::from_major(25))).cents(), 2500);
        assert_eq!(raw.capped_at(Some(Money::from_major(50))), raw);
        assert_eq!(raw.capped_at(None), raw);
    }
}
