//! Coupon record management.

use anyhow::{Context as _, Result};
use coupon_core::{Coupon, CouponRule, Money};
use coupon_db::{CouponRecord, CouponService};
use tracing::warn;

use super::{CreateArgs, IdArgs, ListArgs, UpdateArgs};
use crate::output::Output;

/// Run the list command.
pub async fn list(args: ListArgs, service: &CouponService, output: &Output) -> Result<()> {
    let repo = service.repository();
    let records = match (args.kind, args.active) {
        (Some(kind), _) => repo.list_by_kind(kind).await?,
        (None, true) => repo.list_active().await?,
        (None, false) => repo.list().await?,
    };

    let coupons: Vec<Coupon> = records
        .iter()
        .filter(|record| !args.active || record.is_active)
        .filter_map(decode_or_warn)
        .collect();

    output.coupons(&coupons)
}

fn decode_or_warn(record: &CouponRecord) -> Option<Coupon> {
    match record.to_coupon() {
        Ok(coupon) => Some(coupon),
        Err(e) => {
            warn!(coupon_id = record.id, kind = %record.kind, error = %e, "Skipping undecodable coupon");
            None
        }
    }
}

/// Run the show command.
pub async fn show(args: IdArgs, service: &CouponService, output: &Output) -> Result<()> {
    let coupon = service.get_coupon(args.id).await?;
    output.coupon(&coupon)
}

/// Builds the coupon described by the create flags.
pub fn coupon_from_args(args: CreateArgs) -> Result<Coupon> {
    let details: serde_json::Value =
        serde_json::from_str(&args.details).context("--details is not valid JSON")?;
    let rule = CouponRule::decode(&args.kind, details)?;

    Ok(Coupon {
        id: 0,
        rule,
        is_active: !args.inactive,
        expires_at: args.expires_at,
        usage_count: 0,
        max_usage: args.max_usage,
        min_cart_value: args.min_cart_value.map(Money::from_cents),
        max_discount: args.max_discount.map(Money::from_cents),
        description: args.description,
        code: args.code,
    })
}

/// Run the create command.
pub async fn create(args: CreateArgs, service: &CouponService, output: &Output) -> Result<()> {
    let coupon = coupon_from_args(args)?;
    let stored = service.create_coupon(&coupon).await?;

    output.success(&format!("Created coupon #{}", stored.id));
    output.coupon(&stored)
}

/// Run the update command.
pub async fn update(args: UpdateArgs, service: &CouponService, output: &Output) -> Result<()> {
    let coupon = coupon_from_args(args.coupon)?;
    let stored = service.update_coupon(args.id, &coupon).await?;

    output.success(&format!("Updated coupon #{}", stored.id));
    output.coupon(&stored)
}

/// Run the delete command.
pub async fn delete(args: IdArgs, service: &CouponService, output: &Output) -> Result<()> {
    service.repository().delete(args.id).await?;
    output.success(&format!("Deleted coupon #{}", args.id));
    Ok(())
}

/// Run the activate / deactivate commands.
pub async fn set_active(
    args: IdArgs,
    is_active: bool,
    service: &CouponService,
    output: &Output,
) -> Result<()> {
    service.repository().set_active(args.id, is_active).await?;
    let state = if is_active { "Activated" } else { "Deactivated" };
    output.success(&format!("{state} coupon #{}", args.id));
    Ok(())
}
