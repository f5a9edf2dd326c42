//! Coupons CLI - manage coupon records and evaluate them against carts.
//!
//! Commands:
//! - `coupons list` - List stored coupons
//! - `coupons show <id>` - Show one coupon
//! - `coupons create` - Create a coupon from a kind tag and JSON details
//! - `coupons update <id>` - Replace a coupon, keeping its usage count
//! - `coupons delete <id>` - Delete a coupon
//! - `coupons activate <id>` / `deactivate <id>` - Toggle a coupon
//! - `coupons applicable <cart.json>` - List coupons applicable to a cart
//! - `coupons apply <id> <cart.json>` - Apply one coupon to a cart

mod commands;
mod output;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use coupon_db::{Database, StoreConfig};
use tracing_subscriber::EnvFilter;

use commands::{ApplyArgs, CartArgs, CreateArgs, IdArgs, ListArgs, UpdateArgs};
use output::Output;

/// Coupons CLI - manage and evaluate discount coupons
#[derive(Parser)]
#[command(name = "coupons")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Database file path (overrides COUPON_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored coupons
    List(ListArgs),

    /// Show one coupon
    Show(IdArgs),

    /// Create a coupon
    Create(CreateArgs),

    /// Replace a coupon's rule and settings
    Update(UpdateArgs),

    /// Delete a coupon
    Delete(IdArgs),

    /// Switch a coupon on
    Activate(IdArgs),

    /// Switch a coupon off
    Deactivate(IdArgs),

    /// List coupons applicable to a cart
    Applicable(CartArgs),

    /// Apply one coupon to a cart
    Apply(ApplyArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = Output::new(cli.json);

    let mut config = StoreConfig::load().context("loading store configuration")?;
    if let Some(path) = cli.db {
        config = config.with_database_path(path);
    }

    let db = Database::open(config.db_config())
        .await
        .with_context(|| format!("opening database {}", config.database_path))?;
    let service = db.service();

    let result = match cli.command {
        Commands::List(args) => commands::coupons::list(args, &service, &output).await,
        Commands::Show(args) => commands::coupons::show(args, &service, &output).await,
        Commands::Create(args) => commands::coupons::create(args, &service, &output).await,
        Commands::Update(args) => commands::coupons::update(args, &service, &output).await,
        Commands::Delete(args) => commands::coupons::delete(args, &service, &output).await,
        Commands::Activate(args) => commands::coupons::set_active(args, true, &service, &output).await,
        Commands::Deactivate(args) => commands::coupons::set_active(args, false, &service, &output).await,
        Commands::Applicable(args) => commands::cart::applicable(args, &service, &output).await,
        Commands::Apply(args) => commands::cart::apply(args, &service, &output).await,
    };

    db.close().await;

    if let Err(e) = result {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
