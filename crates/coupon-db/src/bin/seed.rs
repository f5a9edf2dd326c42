//! # Seed Data Generator
//!
//! Populates the database with a sample set of coupons for development.
//!
//! ## Usage
//! ```bash
//! # Use COUPON_DB_PATH (default ./coupons.db)
//! cargo run -p coupon-db --bin seed
//!
//! # Specify database path
//! cargo run -p coupon-db --bin seed -- --db ./data/coupons.db
//! ```
//!
//! ## Generated Coupons
//! - SAVE10 / SAVE15: cart-wise with thresholds and caps
//! - PROD1_20 / PROD2_25: product-wise
//! - B2G1 / B2G1_SIMPLE: buy-x-get-y
//! - EXPIRED: already past its expiry
//! - LIMITED: three of five uses spent

use std::env;

use chrono::{TimeZone, Utc};
use coupon_core::{
    BuyGetEntry, BuyMatching, BxGyRule, CartWiseRule, Coupon, CouponRule, DiscountRate, Money,
    ProductWiseRule,
};
use coupon_db::{Database, StoreConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn cart_wise(threshold_dollars: i64, pct: u32) -> CouponRule {
    CouponRule::CartWise(CartWiseRule {
        threshold: Money::from_major(threshold_dollars),
        discount_bps: DiscountRate::from_bps(pct * 100),
    })
}

fn product_wise(product_id: i64, pct: u32) -> CouponRule {
    CouponRule::ProductWise(ProductWiseRule {
        product_id,
        discount_bps: DiscountRate::from_bps(pct * 100),
    })
}

fn bxgy(buy: &[(i64, i64)], get: &[(i64, i64)], repetition_limit: i64) -> CouponRule {
    CouponRule::BuyXGetY(BxGyRule {
        buy_products: buy.iter().map(|&(p, q)| BuyGetEntry::new(p, q)).collect(),
        get_products: get.iter().map(|&(p, q)| BuyGetEntry::new(p, q)).collect(),
        repetition_limit,
        matching: BuyMatching::Pooled,
    })
}

/// The sample coupon set.
fn sample_coupons() -> Vec<Coupon> {
    let long_ago = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single();

    let mut expired = Coupon::new(0, cart_wise(50, 5))
        .code("EXPIRED")
        .description("5% off orders over $50 (expired)");
    expired.expires_at = long_ago;

    vec![
        Coupon::new(0, cart_wise(100, 10))
            .code("SAVE10")
            .description("10% off orders over $100")
            .max_discount(Money::from_major(50)),
        Coupon::new(0, cart_wise(200, 15))
            .code("SAVE15")
            .description("15% off orders over $200")
            .max_discount(Money::from_major(100)),
        Coupon::new(0, product_wise(1, 20))
            .code("PROD1_20")
            .description("20% off product 1"),
        Coupon::new(0, product_wise(2, 25))
            .code("PROD2_25")
            .description("25% off product 2"),
        Coupon::new(0, bxgy(&[(1, 3), (2, 3)], &[(3, 1)], 2))
            .code("B2G1")
            .description("Buy 3 of products 1/2, get product 3 free"),
        Coupon::new(0, bxgy(&[(1, 2)], &[(2, 1)], 3))
            .code("B2G1_SIMPLE")
            .description("Buy 2 of product 1, get 1 of product 2 free"),
        expired,
        Coupon::new(0, product_wise(3, 30))
            .code("LIMITED")
            .description("30% off product 3, limited uses")
            .usage(3, Some(5)),
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = StoreConfig::load()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    config = config.with_database_path(path.clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Coupon Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $COUPON_DB_PATH or ./coupons.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::open(config.db_config()).await?;
    info!(path = %config.database_path, "Connected to database");

    let existing = db.coupons().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has coupons, skipping seed");
        return Ok(());
    }

    let service = db.service();
    let mut created = 0;
    for coupon in sample_coupons() {
        match service.create_coupon(&coupon).await {
            Ok(stored) => {
                created += 1;
                info!(coupon_id = stored.id, code = ?stored.code, kind = %stored.kind(), "Seeded coupon");
            }
            Err(e) => warn!(code = ?coupon.code, error = %e, "Failed to seed coupon"),
        }
    }

    info!(created, "Seed complete");
    Ok(())
}
