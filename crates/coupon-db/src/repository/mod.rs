//! # Repositories
//!
//! SQL access for the `coupons` table. A repository returns
//! [`coupon::CouponRecord`] rows exactly as stored; turning a row into an
//! engine [`coupon_core::Coupon`] is a separate step that can fail when the
//! kind tag or details JSON is bad.
//!
//! ```text
//! CouponService ──► CouponRepository ──► coupons (SQLite)
//!                   create  update  delete  set_active
//!                   get  list  list_active  list_by_kind
//!                   increment_usage  count
//! ```

pub mod coupon;
