//! Output formatting for the CLI.

use anyhow::Result;
use coupon_core::{AppliedCart, ApplicableCoupon, Coupon};
use serde::Serialize;

/// Output handler: human-readable text or JSON on stdout.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("✓ {msg}");
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("✗ {msg}");
    }

    /// Print any value as pretty JSON.
    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// One summary line per coupon.
    pub fn coupons(&self, coupons: &[Coupon]) -> Result<()> {
        if self.json {
            return self.json(&coupons);
        }
        if coupons.is_empty() {
            println!("No coupons.");
            return Ok(());
        }
        for coupon in coupons {
            println!("{}", coupon_line(coupon));
        }
        Ok(())
    }

    pub fn coupon(&self, coupon: &Coupon) -> Result<()> {
        if self.json {
            return self.json(coupon);
        }
        println!("{}", coupon_line(coupon));
        println!("  details:     {}", serde_json::to_string(&coupon.rule.details_json()?)?);
        if let Some(expires_at) = coupon.expires_at {
            println!("  expires at:  {expires_at}");
        }
        match coupon.max_usage {
            Some(max) => println!("  usage:       {}/{}", coupon.usage_count, max),
            None => println!("  usage:       {}", coupon.usage_count),
        }
        if let Some(min) = coupon.min_cart_value {
            println!("  min cart:    {min}");
        }
        if let Some(cap) = coupon.max_discount {
            println!("  max off:     {cap}");
        }
        if let Some(description) = &coupon.description {
            println!("  description: {description}");
        }
        Ok(())
    }

    pub fn applicable(&self, applicable: &[ApplicableCoupon]) -> Result<()> {
        if self.json {
            return self.json(&serde_json::json!({ "applicable_coupons": applicable }));
        }
        if applicable.is_empty() {
            println!("No applicable coupons.");
            return Ok(());
        }
        for coupon in applicable {
            println!(
                "#{:<4} {:<13} {:>10}  {}",
                coupon.coupon_id,
                coupon.kind.as_str(),
                coupon.discount.to_string(),
                coupon.code.as_deref().unwrap_or("-"),
            );
        }
        Ok(())
    }

    pub fn applied(&self, applied: &AppliedCart) -> Result<()> {
        if self.json {
            return self.json(&serde_json::json!({ "updated_cart": applied }));
        }
        for line in &applied.items {
            println!(
                "product {:<6} {:>4} × {:>10}  discount {:>10}",
                line.product_id,
                line.quantity,
                line.unit_price.to_string(),
                line.total_discount.to_string(),
            );
        }
        println!("total price:    {}", applied.total_price);
        println!("total discount: {}", applied.total_discount);
        println!("final price:    {}", applied.final_price);
        Ok(())
    }
}

fn coupon_line(coupon: &Coupon) -> String {
    format!(
        "#{:<4} {:<13} {:<16} {}",
        coupon.id,
        coupon.kind().as_str(),
        coupon.code.as_deref().unwrap_or("-"),
        if coupon.is_active { "active" } else { "inactive" },
    )
}
