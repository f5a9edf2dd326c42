//! # Validation Module
//!
//! The validation boundary in front of the engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  ├── Shape of carts and rule details                                   │
//! │  └── Negative basis points can't even be represented                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Ranges: quantities, prices, rates, limits                         │
//! │  └── Formats: coupon codes, descriptions                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine                                                       │
//! │  └── Assumes valid input, but clamps rates and guards division        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use coupon_core::validation::{validate_coupon_code, validate_quantity};
//!
//! assert!(validate_coupon_code("SAVE10").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{BuyGetEntry, Cart, Coupon, CouponRule, DiscountRate};
use crate::{
    MAX_CART_ITEMS, MAX_CODE_LENGTH, MAX_DESCRIPTION_LENGTH, MAX_ITEM_QUANTITY,
    MAX_UNIT_PRICE_CENTS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates that a monetary amount is non-negative.
///
/// Zero is allowed: free items, "no threshold" cart-wise coupons.
///
/// ## Example
/// ```rust
/// use coupon_core::money::Money;
/// use coupon_core::validation::validate_amount;
///
/// assert!(validate_amount("unit_price", Money::from_cents(0)).is_ok());
/// assert!(validate_amount("unit_price", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a product identifier.
pub fn validate_product_id(field: &str, product_id: i64) -> ValidationResult<()> {
    if product_id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a discount rate.
///
/// ## Rules
/// - Must be between 0 and 10000 bps (0% to 100%)
pub fn validate_rate(rate: DiscountRate) -> ValidationResult<()> {
    if rate.bps() > DiscountRate::FULL.bps() {
        return Err(ValidationError::OutOfRange {
            field: "discount_bps".to_string(),
            min: 0,
            max: DiscountRate::FULL.bps() as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Cart Validators
// =============================================================================

/// Validates a unit price: 0 to MAX_UNIT_PRICE_CENTS.
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.cents() > MAX_UNIT_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a whole cart before it reaches the engine.
///
/// ## Rules
/// - At most MAX_CART_ITEMS (100) lines
/// - Every line: product id > 0, quantity 1..=999, unit price 0..=MAX_UNIT_PRICE_CENTS
///
/// An empty cart is valid; every coupon simply yields zero discount.
pub fn validate_cart(cart: &Cart) -> ValidationResult<()> {
    if cart.items.len() > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    for line in &cart.items {
        validate_product_id("product_id", line.product_id)?;
        validate_quantity(line.quantity)?;
        validate_unit_price(line.unit_price)?;
    }

    Ok(())
}

// =============================================================================
// Rule Validators
// =============================================================================

fn validate_entries(field: &str, entries: &[BuyGetEntry]) -> ValidationResult<()> {
    if entries.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    for entry in entries {
        validate_product_id(field, entry.product_id)?;
        if entry.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("{field} quantity"),
            });
        }
    }

    Ok(())
}

/// Validates the details of a coupon rule.
///
/// ## Rules
/// ```text
/// cart-wise     threshold >= 0, rate 0..=100%
/// product-wise  product id > 0, rate 0..=100%
/// bxgy          non-empty buy/get lists, ids > 0, quantities > 0,
///               repetition_limit > 0
/// ```
pub fn validate_rule(rule: &CouponRule) -> ValidationResult<()> {
    match rule {
        CouponRule::CartWise(rule) => {
            validate_amount("threshold", rule.threshold)?;
            validate_rate(rule.discount_bps)
        }
        CouponRule::ProductWise(rule) => {
            validate_product_id("product_id", rule.product_id)?;
            validate_rate(rule.discount_bps)
        }
        CouponRule::BuyXGetY(rule) => {
            validate_entries("buy_products", &rule.buy_products)?;
            validate_entries("get_products", &rule.get_products)?;
            if rule.repetition_limit <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "repetition_limit".to_string(),
                });
            }
            Ok(())
        }
    }
}

// =============================================================================
// Metadata Validators
// =============================================================================

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty
/// - At most MAX_CODE_LENGTH (50) characters
/// - Only letters, numbers, hyphens and underscores
///
/// ## Example
/// ```rust
/// use coupon_core::validation::validate_coupon_code;
///
/// assert!(validate_coupon_code("PROD1_20").is_ok());
/// assert!(validate_coupon_code("SAVE 10").is_err());
/// ```
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LENGTH,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a coupon description.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    if description.len() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LENGTH,
        });
    }

    Ok(())
}

/// Validates a full coupon: its rule plus every metadata field.
pub fn validate_coupon(coupon: &Coupon) -> ValidationResult<()> {
    validate_rule(&coupon.rule)?;

    if coupon.usage_count < 0 {
        return Err(ValidationError::OutOfRange {
            field: "usage_count".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if let Some(max_usage) = coupon.max_usage {
        if max_usage < 1 {
            return Err(ValidationError::MustBePositive {
                field: "max_usage".to_string(),
            });
        }
    }

    if let Some(min) = coupon.min_cart_value {
        validate_amount("min_cart_value", min)?;
    }

    if let Some(cap) = coupon.max_discount {
        validate_amount("max_discount", cap)?;
    }

    if let Some(code) = &coupon.code {
        validate_coupon_code(code)?;
    }

    if let Some(description) = &coupon.description {
        validate_description(description)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
