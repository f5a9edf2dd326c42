//! # coupon-db: Storage and Service Layer
//!
//! Stores coupon records in SQLite and drives the pure engine in
//! `coupon-core` on their behalf.
//!
//! ## Request Path
//! ```text
//! coupons apply 3 cart.json
//!   └─► CouponService::apply_coupon
//!         ├─ validate cart                 coupon-core::validation
//!         ├─ CouponRepository::get(3)      SELECT ... FROM coupons
//!         ├─ CouponRecord::to_coupon       kind tag + details JSON
//!         ├─ apply_coupon(coupon, cart)    coupon-core::applier
//!         └─ increment_usage(3)            UPDATE coupons
//! ```
//!
//! ## Modules
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment-driven store configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage and service error types
//! - [`repository`] - Coupon record CRUD
//! - [`service`] - Applicable-coupon listing and coupon application
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coupon_db::{Database, StoreConfig};
//!
//! let config = StoreConfig::load()?;
//! let db = Database::open(config.db_config()).await?;
//!
//! let applicable = db.service().applicable_coupons(&cart).await?;
//! let applied = db.service().apply_coupon(applicable[0].coupon_id, &cart).await?;
//! ```

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig};
pub use repository::coupon::{CouponRecord, CouponRepository};
pub use service::CouponService;
