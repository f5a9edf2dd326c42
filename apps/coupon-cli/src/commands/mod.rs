//! CLI command implementations.

pub mod cart;
pub mod coupons;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use coupon_core::CouponKind;

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Only coupons of this kind (cart-wise, product-wise, bxgy).
    #[arg(short, long, value_parser = parse_kind)]
    pub kind: Option<CouponKind>,

    /// Only active coupons.
    #[arg(long)]
    pub active: bool,
}

/// Arguments for commands addressing one coupon.
#[derive(Args)]
pub struct IdArgs {
    /// Coupon ID.
    pub id: i64,
}

/// Arguments for the create command.
#[derive(Args)]
pub struct CreateArgs {
    /// Kind tag: cart-wise, product-wise or bxgy.
    #[arg(short = 't', long = "type")]
    pub kind: String,

    /// Rule details as JSON, e.g. '{"threshold":10000,"discount_bps":1000}'.
    #[arg(short, long)]
    pub details: String,

    /// Coupon code.
    #[arg(short, long)]
    pub code: Option<String>,

    /// Human-readable description.
    #[arg(long)]
    pub description: Option<String>,

    /// Expiry time (RFC 3339).
    #[arg(long)]
    pub expires_at: Option<DateTime<Utc>>,

    /// Maximum number of redemptions.
    #[arg(long)]
    pub max_usage: Option<i64>,

    /// Minimum cart subtotal, in cents.
    #[arg(long)]
    pub min_cart_value: Option<i64>,

    /// Discount cap for percentage coupons, in cents.
    #[arg(long)]
    pub max_discount: Option<i64>,

    /// Store the coupon switched off.
    #[arg(long)]
    pub inactive: bool,
}

/// Arguments for the update command. Replaces every field but the usage count.
#[derive(Args)]
pub struct UpdateArgs {
    /// Coupon ID.
    pub id: i64,

    #[command(flatten)]
    pub coupon: CreateArgs,
}

/// Arguments for the applicable command.
#[derive(Args)]
pub struct CartArgs {
    /// Cart JSON file: {"items":[{"product_id":1,"quantity":2,"unit_price":5000}]}.
    pub cart: PathBuf,
}

/// Arguments for the apply command.
#[derive(Args)]
pub struct ApplyArgs {
    /// Coupon ID.
    pub id: i64,

    /// Cart JSON file.
    pub cart: PathBuf,
}

fn parse_kind(tag: &str) -> Result<CouponKind, String> {
    CouponKind::from_tag(tag).ok_or_else(|| {
        let known: Vec<&str> = CouponKind::ALL.iter().map(CouponKind::as_str).collect();
        format!("unknown coupon kind '{tag}' (expected one of: {})", known.join(", "))
    })
}
