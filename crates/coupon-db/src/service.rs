//! # Coupon Service
//!
//! The caller layer around the engine: loads records, decodes them, runs the
//! pure engine and writes back the one piece of state the engine never
//! touches, the usage counter.
//!
//! ## Apply Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_coupon(id, cart)                                                 │
//! │       │                                                                 │
//! │       ├─ validate_cart            ──► Validation error                  │
//! │       ├─ repo.get(id)             ──► NotFound                          │
//! │       ├─ record.to_coupon()       ──► UnsupportedRuleKind / details     │
//! │       ├─ coupon_core::apply_coupon                                      │
//! │       │     guard: inactive → expired → usage → min cart value          │
//! │       │     allocate per line                                           │
//! │       └─ repo.increment_usage(id)  (only after success)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guard and the increment are separate statements; two concurrent
//! redemptions of the last allowed use can both succeed.

use chrono::{DateTime, Utc};
use coupon_core::validation::{validate_cart, validate_coupon};
use coupon_core::{AppliedCart, ApplicableCoupon, Cart, Coupon};
use tracing::{info, warn};

use crate::error::{DbError, ServiceResult};
use crate::repository::coupon::{CouponRecord, CouponRepository};

/// Coupon operations as exposed to the CLI / API layer.
#[derive(Debug, Clone)]
pub struct CouponService {
    coupons: CouponRepository,
}

impl CouponService {
    pub fn new(coupons: CouponRepository) -> Self {
        CouponService { coupons }
    }

    /// The underlying repository, for plain CRUD.
    pub fn repository(&self) -> &CouponRepository {
        &self.coupons
    }

    // =========================================================================
    // Authoring
    // =========================================================================

    /// Validates and stores a new coupon, returning it with its assigned id.
    pub async fn create_coupon(&self, coupon: &Coupon) -> ServiceResult<Coupon> {
        validate_coupon(coupon)?;
        let record = self.coupons.create(coupon).await?;
        info!(coupon_id = record.id, kind = %record.kind, "Coupon created");
        Ok(record.to_coupon()?)
    }

    /// Validates and replaces an existing coupon.
    pub async fn update_coupon(&self, id: i64, coupon: &Coupon) -> ServiceResult<Coupon> {
        validate_coupon(coupon)?;
        let record = self.coupons.update(id, coupon).await?;
        info!(coupon_id = id, kind = %record.kind, "Coupon updated");
        Ok(record.to_coupon()?)
    }

    /// Loads and decodes one coupon.
    pub async fn get_coupon(&self, id: i64) -> ServiceResult<Coupon> {
        Ok(self.load(id).await?.to_coupon()?)
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Applicable coupons for a cart, evaluated now.
    pub async fn applicable_coupons(&self, cart: &Cart) -> ServiceResult<Vec<ApplicableCoupon>> {
        self.applicable_coupons_at(cart, Utc::now()).await
    }

    /// Applicable coupons for a cart at a given time.
    ///
    /// Active records that fail to decode are logged and left out; one bad
    /// row never hides the others.
    pub async fn applicable_coupons_at(
        &self,
        cart: &Cart,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<ApplicableCoupon>> {
        validate_cart(cart)?;

        let coupons: Vec<Coupon> = self
            .coupons
            .list_active()
            .await?
            .iter()
            .filter_map(|record| match record.to_coupon() {
                Ok(coupon) => Some(coupon),
                Err(e) => {
                    warn!(coupon_id = record.id, kind = %record.kind, error = %e, "Skipping undecodable coupon");
                    None
                }
            })
            .collect();

        let applicable = coupon_core::filter_applicable(&coupons, cart, now);
        info!(
            evaluated = coupons.len(),
            applicable = applicable.len(),
            "Evaluated coupons for cart"
        );
        Ok(applicable)
    }

    /// Applies one coupon to a cart now, recording the redemption.
    pub async fn apply_coupon(&self, id: i64, cart: &Cart) -> ServiceResult<AppliedCart> {
        self.apply_coupon_at(id, cart, Utc::now()).await
    }

    /// Applies one coupon to a cart at a given time.
    ///
    /// `usage_count` is incremented only when the application succeeds.
    pub async fn apply_coupon_at(
        &self,
        id: i64,
        cart: &Cart,
        now: DateTime<Utc>,
    ) -> ServiceResult<AppliedCart> {
        validate_cart(cart)?;

        let coupon = self.load(id).await?.to_coupon()?;
        let applied = coupon_core::apply_coupon(&coupon, cart, now)?;

        self.coupons.increment_usage(id).await?;
        info!(
            coupon_id = id,
            kind = %coupon.kind(),
            total_discount = %applied.total_discount,
            final_price = %applied.final_price,
            "Coupon applied"
        );

        Ok(applied)
    }

    async fn load(&self, id: i64) -> Result<CouponRecord, DbError> {
        self.coupons
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Coupon", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use coupon_core::{
        BuyGetEntry, BuyMatching, BxGyRule, CartLine, CartWiseRule, CoreError, CouponKind,
        CouponRule, DiscountRate, Money, ProductWiseRule, ValidationError,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    async fn service() -> CouponService {
        Database::open(DbConfig::in_memory()).await.unwrap().service()
    }

    fn cart() -> Cart {
        Cart::new(vec![
            CartLine::new(1, 2, Money::from_major(50)),
            CartLine::new(2, 1, Money::from_major(30)),
        ])
    }

    fn cart_wise() -> Coupon {
        Coupon::new(
            0,
            CouponRule::CartWise(CartWiseRule {
                threshold: Money::from_major(100),
                discount_bps: DiscountRate::from_bps(1000),
            }),
        )
    }

    fn product_wise() -> Coupon {
        Coupon::new(
            0,
            CouponRule::ProductWise(ProductWiseRule {
                product_id: 1,
                discount_bps: DiscountRate::from_bps(2000),
            }),
        )
    }

    async fn insert_raw(service: &CouponService, kind: &str, details: &str) {
        sqlx::query(
            "INSERT INTO coupons (kind, details, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(kind)
        .bind(details)
        .bind(Utc::now())
        .execute(service.coupons.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_coupon() {
        let service = service().await;
        let coupon = cart_wise().code("has space");

        let err = service.create_coupon(&coupon).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));
        assert_eq!(service.repository().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_applicable_coupons_scenarios() {
        let service = service().await;
        let a = service.create_coupon(&cart_wise()).await.unwrap();
        let b = service.create_coupon(&product_wise()).await.unwrap();
        service
            .create_coupon(&cart_wise().expires_at(now() - Duration::days(1)))
            .await
            .unwrap();
        service
            .create_coupon(&product_wise().active(false))
            .await
            .unwrap();

        let applicable = service.applicable_coupons_at(&cart(), now()).await.unwrap();
        let summary: Vec<(i64, CouponKind, i64)> = applicable
            .iter()
            .map(|c| (c.coupon_id, c.kind, c.discount.cents()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (a.id, CouponKind::CartWise, 1300),
                (b.id, CouponKind::ProductWise, 2000),
            ]
        );
    }

    #[tokio::test]
    async fn test_undecodable_records_are_skipped() {
        let service = service().await;
        insert_raw(&service, "free-shipping", "{}").await;
        insert_raw(&service, "cart-wise", "{\"threshold\": -5}").await;
        let good = service.create_coupon(&product_wise()).await.unwrap();

        let applicable = service.applicable_coupons_at(&cart(), now()).await.unwrap();
        assert_eq!(applicable.len(), 1);
        assert_eq!(applicable[0].coupon_id, good.id);
    }

    #[tokio::test]
    async fn test_invalid_cart_is_rejected() {
        let service = service().await;
        let bad = Cart::new(vec![CartLine::new(1, 0, Money::from_major(5))]);

        let err = service.applicable_coupons_at(&bad, now()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
    }

    #[tokio::test]
    async fn test_apply_increments_usage() {
        let service = service().await;
        let coupon = service.create_coupon(&cart_wise()).await.unwrap();

        let applied = service.apply_coupon_at(coupon.id, &cart(), now()).await.unwrap();
        assert_eq!(applied.total_price.cents(), 13000);
        assert_eq!(applied.total_discount.cents(), 1300);
        assert_eq!(applied.final_price.cents(), 11700);

        let stored = service.get_coupon(coupon.id).await.unwrap();
        assert_eq!(stored.usage_count, 1);
    }

    #[tokio::test]
    async fn test_failed_apply_does_not_increment_usage() {
        let service = service().await;
        let coupon = service
            .create_coupon(&cart_wise().expires_at(now() - Duration::minutes(5)))
            .await
            .unwrap();

        let err = service.apply_coupon_at(coupon.id, &cart(), now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::CouponExpired { .. })));
        assert_eq!(service.get_coupon(coupon.id).await.unwrap().usage_count, 0);
    }

    #[tokio::test]
    async fn test_usage_limit_reached_after_applications() {
        let service = service().await;
        let coupon = service
            .create_coupon(&product_wise().usage(0, Some(2)))
            .await
            .unwrap();

        service.apply_coupon_at(coupon.id, &cart(), now()).await.unwrap();
        service.apply_coupon_at(coupon.id, &cart(), now()).await.unwrap();

        let err = service.apply_coupon_at(coupon.id, &cart(), now()).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::UsageLimitExceeded { max_usage: 2, .. })
        ));

        // exhausted coupons also drop out of the applicable list
        let applicable = service.applicable_coupons_at(&cart(), now()).await.unwrap();
        assert!(applicable.is_empty());
    }

    #[tokio::test]
    async fn test_apply_missing_and_unknown_kind() {
        let service = service().await;

        let err = service.apply_coupon_at(42, &cart(), now()).await.unwrap_err();
        assert!(err.is_not_found());

        insert_raw(&service, "free-shipping", "{}").await;
        let id = service.repository().list().await.unwrap()[0].id;
        let err = service.apply_coupon_at(id, &cart(), now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::UnsupportedRuleKind(_))));
    }

    #[tokio::test]
    async fn test_apply_bxgy_scenario() {
        let service = service().await;
        let coupon = service
            .create_coupon(&Coupon::new(
                0,
                CouponRule::BuyXGetY(BxGyRule {
                    buy_products: vec![BuyGetEntry::new(1, 3), BuyGetEntry::new(2, 3)],
                    get_products: vec![BuyGetEntry::new(3, 1)],
                    repetition_limit: 2,
                    matching: BuyMatching::Pooled,
                }),
            ))
            .await
            .unwrap();

        let cart = Cart::new(vec![
            CartLine::new(1, 6, Money::from_major(50)),
            CartLine::new(2, 3, Money::from_major(30)),
            CartLine::new(3, 2, Money::from_major(25)),
        ]);

        let applied = service.apply_coupon_at(coupon.id, &cart, now()).await.unwrap();
        assert_eq!(applied.total_price.cents(), 44000);
        assert_eq!(applied.final_price.cents(), 41500);
        assert_eq!(applied.items[2].total_discount.cents(), 2500);
    }

    #[tokio::test]
    async fn test_update_coupon() {
        let service = service().await;
        let coupon = service.create_coupon(&cart_wise()).await.unwrap();

        let updated = service
            .update_coupon(coupon.id, &cart_wise().max_discount(Money::from_major(5)))
            .await
            .unwrap();
        assert_eq!(updated.max_discount, Some(Money::from_major(5)));

        let applicable = service.applicable_coupons_at(&cart(), now()).await.unwrap();
        assert_eq!(applicable[0].discount.cents(), 500);
    }
}
