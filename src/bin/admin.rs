//! CLI administration tool for shurl.
//!
//! Provides commands for idempotency ledger maintenance, statistics, and
//! database diagnostics without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Delete expired idempotency keys
//! cargo run --bin admin -- idempotency purge
//!
//! # Inspect one idempotency key
//! cargo run --bin admin -- idempotency show 0191e2b4-7c3a-7b1e-9f4d-2a6c8e0b13f7
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Reads the same database settings as the server: `DATABASE_URL`, or the
//! `DB_*` components, plus the `DB_*` pool tuning variables.

use shurl::config::Config;
use shurl::infrastructure::persistence::PgIdempotencyLedger;
use shurl::server::connect_pool;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// CLI tool for managing shurl.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Maintain the idempotency ledger
    Idempotency {
        #[command(subcommand)]
        action: IdempotencyAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Idempotency ledger subcommands.
#[derive(Subcommand)]
enum IdempotencyAction {
    /// Delete expired idempotency keys
    Purge {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show the ledger row for a key
    Show {
        /// The X-Idempotency-Key value
        key: Uuid,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let pool = connect_pool(&config).await?;

    match cli.command {
        Commands::Idempotency { action } => handle_idempotency_action(action, pool).await?,
        Commands::Stats => handle_stats(pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

async fn handle_idempotency_action(action: IdempotencyAction, pool: PgPool) -> Result<()> {
    let ledger = PgIdempotencyLedger::new(Arc::new(pool));

    match action {
        IdempotencyAction::Purge { yes } => purge_expired(&ledger, yes).await,
        IdempotencyAction::Show { key } => show_key(&ledger, key).await,
    }
}

/// Deletes expired ledger rows after showing how many there are.
///
/// Live rows are never touched, so purging while the server runs is safe.
async fn purge_expired(ledger: &PgIdempotencyLedger, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Purge expired idempotency keys".bright_blue().bold());
    println!();

    let stats = ledger
        .stats()
        .await
        .context("Failed to read ledger statistics")?;

    println!("  Live:    {}", stats.live.to_string().green());
    println!("  Expired: {}", stats.expired.to_string().yellow());
    println!();

    if stats.expired == 0 {
        println!("{}", "  Nothing to purge".bright_black());
        return Ok(());
    }

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} expired keys?", stats.expired))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let removed = ledger
        .purge_expired()
        .await
        .context("Failed to purge expired keys")?;

    println!();
    println!(
        "{} {}",
        "✅ Removed".green().bold(),
        removed.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn show_key(ledger: &PgIdempotencyLedger, key: Uuid) -> Result<()> {
    let record = ledger
        .find(key)
        .await
        .context("Database error")?
        .context("Idempotency key not found")?;

    let status = if record.is_expired_at(Utc::now()) {
        "EXPIRED".red()
    } else {
        "LIVE".green()
    };

    println!("{}", "🔑 Idempotency key".bright_blue().bold());
    println!();
    println!("  Key:          {}", record.token.to_string().cyan());
    println!("  Reference:    {}", record.reference_id.to_string().bright_white());
    println!("  Request hash: {}", record.request_hash.bright_black());
    println!(
        "  Created:      {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S").to_string().bright_black()
    );
    println!(
        "  Expires:      {}",
        record.expires_at.format("%Y-%m-%d %H:%M:%S").to_string().bright_black()
    );
    println!("  Status:       {}", status);
    println!();

    Ok(())
}

/// Displays system statistics.
///
/// Shows:
/// - Total number of short URLs
/// - Total number of users
/// - Live and expired idempotency keys
async fn handle_stats(pool: PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let short_urls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_urls")
        .fetch_one(&pool)
        .await?;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await?;

    let ledger = PgIdempotencyLedger::new(Arc::new(pool)).stats().await?;

    println!(
        "  Short URLs:        {}",
        short_urls.to_string().bright_green().bold()
    );
    println!(
        "  Users:             {}",
        users.to_string().bright_green().bold()
    );
    println!(
        "  Live keys:         {}",
        ledger.live.to_string().bright_green().bold()
    );
    println!(
        "  Expired keys:      {}",
        ledger.expired.to_string().yellow().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
                    .fetch_one(pool)
                    .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
