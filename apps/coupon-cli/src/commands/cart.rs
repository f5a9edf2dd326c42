//! Cart evaluation commands.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use coupon_core::Cart;
use coupon_db::CouponService;

use super::{ApplyArgs, CartArgs};
use crate::output::Output;

/// Reads a cart JSON file.
pub fn read_cart(path: &Path) -> Result<Cart> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading cart file {}", path.display()))?;
    parse_cart(&content).with_context(|| format!("parsing cart file {}", path.display()))
}

/// Parses a cart from JSON, accepting either `{"items": [...]}` or `{"cart": {"items": [...]}}`.
pub fn parse_cart(content: &str) -> Result<Cart> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let cart_value = match value.get("cart") {
        Some(inner) => inner.clone(),
        None => value,
    };
    Ok(serde_json::from_value(cart_value)?)
}

/// Run the applicable command.
pub async fn applicable(args: CartArgs, service: &CouponService, output: &Output) -> Result<()> {
    let cart = read_cart(&args.cart)?;
    let applicable = service.applicable_coupons(&cart).await?;
    output.applicable(&applicable)
}

/// Run the apply command.
pub async fn apply(args: ApplyArgs, service: &CouponService, output: &Output) -> Result<()> {
    let cart = read_cart(&args.cart)?;
    let applied = service
        .apply_coupon(args.id, &cart)
        .await
        .with_context(|| format!("applying coupon #{}", args.id))?;
    output.applied(&applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cart_shapes() {
        let bare = r#"{"items":[{"product_id":1,"quantity":2,"unit_price":5000}]}"#;
        let wrapped = r#"{"cart":{"items":[{"product_id":1,"quantity":2,"unit_price":5000}]}}"#;

        let cart = parse_cart(bare).unwrap();
        assert_eq!(cart.subtotal().cents(), 10000);
        assert_eq!(parse_cart(wrapped).unwrap(), cart);
    }

    #[test]
    fn test_parse_cart_rejects_garbage() {
        assert!(parse_cart(r#"{"items":[{"product_id":"one"}]}"#).is_err());
        assert!(parse_cart("not json").is_err());
    }
}
