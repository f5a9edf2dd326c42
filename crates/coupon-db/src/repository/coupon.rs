//! # Coupon Repository
//!
//! Database operations for coupon records.
//!
//! ## Row Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  coupons                                                                │
//! │                                                                         │
//! │  id │ kind         │ details (JSON)                        │ ...        │
//! │  ───┼──────────────┼───────────────────────────────────────┼──────────  │
//! │   1 │ cart-wise    │ {"threshold":10000,"discount_bps":1000}│            │
//! │   3 │ bxgy         │ {"buy_products":[...],"get_products":…}│            │
//! │                                                                         │
//! │  CouponRecord::to_coupon() = CouponRule::decode(kind, details)         │
//! │                              + metadata columns                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use coupon_core::{CoreError, CoreResult, Coupon, CouponKind, CouponRule, Money};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, kind, details, is_active, expires_at, usage_count, max_usage,
        min_cart_value_cents, max_discount_cents, description, code,
        created_at, updated_at
    FROM coupons
"#;

// =============================================================================
// Record
// =============================================================================

/// A coupon row exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CouponRecord {
    pub id: i64,
    /// Kind tag, not necessarily one the engine knows.
    pub kind: String,
    /// Rule details as JSON text.
    pub details: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: i64,
    pub max_usage: Option<i64>,
    pub min_cart_value_cents: Option<i64>,
    pub max_discount_cents: Option<i64>,
    pub description: Option<String>,
    pub code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CouponRecord {
    /// Decodes the stored kind/details pair and attaches the metadata.
    ///
    /// ## Errors
    /// - `UnsupportedRuleKind` - unknown kind tag
    /// - `InvalidRuleDetails` - details are not valid JSON for the kind
    /// - `Validation` - rule values out of range
    pub fn to_coupon(&self) -> CoreResult<Coupon> {
        let details: serde_json::Value =
            serde_json::from_str(&self.details).map_err(|e| match CouponKind::from_tag(&self.kind) {
                Some(kind) => CoreError::InvalidRuleDetails {
                    kind: kind.to_string(),
                    reason: e.to_string(),
                },
                None => CoreError::UnsupportedRuleKind(self.kind.clone()),
            })?;

        let rule = CouponRule::decode(&self.kind, details)?;

        Ok(Coupon {
            id: self.id,
            rule,
            is_active: self.is_active,
            expires_at: self.expires_at,
            usage_count: self.usage_count,
            max_usage: self.max_usage,
            min_cart_value: self.min_cart_value_cents.map(Money::from_cents),
            max_discount: self.max_discount_cents.map(Money::from_cents),
            description: self.description.clone(),
            code: self.code.clone(),
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for coupon records.
///
/// ## Usage
/// ```rust,ignore
/// let repo = CouponRepository::new(pool);
/// let record = repo.create(&coupon).await?;
/// let active = repo.list_active().await?;
/// ```
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts a coupon. The coupon's `id` is ignored; the database assigns one.
    ///
    /// ## Returns
    /// * `Ok(CouponRecord)` - The stored row
    /// * `Err(DbError::UniqueViolation)` - Code already taken
    pub async fn create(&self, coupon: &Coupon) -> DbResult<CouponRecord> {
        debug!(kind = %coupon.kind(), code = ?coupon.code, "Inserting coupon");

        let details = serde_json::to_string(&coupon.rule.details_json()?)?;
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO coupons (
                kind, details, is_active, expires_at, usage_count, max_usage,
                min_cart_value_cents, max_discount_cents, description, code,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            RETURNING id
            "#,
        )
        .bind(coupon.kind())
        .bind(details)
        .bind(coupon.is_active)
        .bind(coupon.expires_at)
        .bind(coupon.usage_count)
        .bind(coupon.max_usage)
        .bind(coupon.min_cart_value.map(|m| m.cents()))
        .bind(coupon.max_discount.map(|m| m.cents()))
        .bind(&coupon.description)
        .bind(&coupon.code)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Coupon", id))
    }

    /// Lists every coupon, newest first.
    pub async fn list(&self) -> DbResult<Vec<CouponRecord>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC");
        let records = sqlx::query_as::<_, CouponRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Lists active coupons in id order (the order they are evaluated in).
    pub async fn list_active(&self) -> DbResult<Vec<CouponRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE is_active = 1 ORDER BY id");
        let records = sqlx::query_as::<_, CouponRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Lists coupons of one kind, newest first.
    pub async fn list_by_kind(&self, kind: CouponKind) -> DbResult<Vec<CouponRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE kind = ?1 ORDER BY created_at DESC, id DESC");
        let records = sqlx::query_as::<_, CouponRecord>(&sql)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Gets a coupon by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(CouponRecord))` - Coupon found
    /// * `Ok(None)` - Coupon not found
    pub async fn get(&self, id: i64) -> DbResult<Option<CouponRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let record = sqlx::query_as::<_, CouponRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Replaces a coupon's rule and metadata, keeping its usage count.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Coupon doesn't exist
    pub async fn update(&self, id: i64, coupon: &Coupon) -> DbResult<CouponRecord> {
        debug!(id, kind = %coupon.kind(), "Updating coupon");

        let details = serde_json::to_string(&coupon.rule.details_json()?)?;

        let result = sqlx::query(
            r#"
            UPDATE coupons SET
                kind = ?2,
                details = ?3,
                is_active = ?4,
                expires_at = ?5,
                max_usage = ?6,
                min_cart_value_cents = ?7,
                max_discount_cents = ?8,
                description = ?9,
                code = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(coupon.kind())
        .bind(details)
        .bind(coupon.is_active)
        .bind(coupon.expires_at)
        .bind(coupon.max_usage)
        .bind(coupon.min_cart_value.map(|m| m.cents()))
        .bind(coupon.max_discount.map(|m| m.cents()))
        .bind(&coupon.description)
        .bind(&coupon.code)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Coupon", id))
    }

    /// Deletes a coupon.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting coupon");

        let result = sqlx::query("DELETE FROM coupons WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }
        Ok(())
    }

    /// Switches a coupon on or off.
    pub async fn set_active(&self, id: i64, is_active: bool) -> DbResult<()> {
        debug!(id, is_active, "Setting coupon active flag");

        let result = sqlx::query("UPDATE coupons SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }
        Ok(())
    }

    /// Records one redemption.
    ///
    /// Delta update: concurrent redemptions each add one instead of
    /// overwriting each other's count.
    pub async fn increment_usage(&self, id: i64) -> DbResult<()> {
        debug!(id, "Incrementing coupon usage");

        let result = sqlx::query(
            "UPDATE coupons SET usage_count = usage_count + 1, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }
        Ok(())
    }

    /// Counts all stored coupons.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
