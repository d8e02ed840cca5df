//! CLI administration tool for account-shortener.
//!
//! Inspects and removes accounts and checks the database without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show an account
//! cargo run --bin admin -- user show alice@example.com
//!
//! # Delete an account and all of its URLs
//! cargo run --bin admin -- user delete alice@example.com
//!
//! # List an account's URLs
//! cargo run --bin admin -- url list alice@example.com --limit 20
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `REDIS_URL` (optional): when set, deleting an account also removes the
//!   cached entries of its short codes

use account_shortener::config::mask_connection_string;
use account_shortener::domain::entities::User;
use account_shortener::domain::repositories::{UrlRepository, UserRepository};
use account_shortener::infrastructure::cache::{CacheBatch, CacheService, RedisCache, keys};
use account_shortener::infrastructure::persistence::{PgUrlRepository, PgUserRepository};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing account-shortener.
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
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Inspect short URLs
    Url {
        #[command(subcommand)]
        action: UrlAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Show an account
    Show { email: String },

    /// Delete an account and all of its URLs
    Delete {
        email: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UrlAction {
    /// List an account's URLs, most recently updated first
    List {
        email: String,

        #[arg(long, default_value_t = 0)]
        offset: i64,

        #[arg(long, default_value_t = 100)]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

struct Repositories {
    users: PgUserRepository,
    urls: PgUrlRepository,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let shared = Arc::new(pool.clone());
    let repos = Repositories {
        users: PgUserRepository::new(shared.clone()),
        urls: PgUrlRepository::new(shared),
    };

    match cli.command {
        Commands::User { action } => match action {
            UserAction::Show { email } => show_user(&repos, &email).await?,
            UserAction::Delete { email, yes } => delete_user(&repos, &email, yes).await?,
        },
        Commands::Url { action } => match action {
            UrlAction::List {
                email,
                offset,
                limit,
            } => list_urls(&repos, &email, offset, limit).await?,
        },
        Commands::Db { action } => match action {
            DbAction::Check => check_db(&pool, &database_url).await?,
        },
    }

    Ok(())
}

async fn find_user(repos: &Repositories, email: &str) -> Result<User> {
    repos
        .users
        .find_by_email(&email.to_lowercase())
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .with_context(|| format!("No account for {}", email))
}

async fn show_user(repos: &Repositories, email: &str) -> Result<()> {
    let user = find_user(repos, email).await?;
    let (total, _) = repos
        .urls
        .list_by_owner(user.user_id, 0, 1)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    println!("{}", "Account".bright_blue().bold());
    println!();
    println!("  ID:      {}", user.user_id.to_string().bright_black());
    println!("  Email:   {}", user.email.cyan());
    println!("  Type:    {}", user.account_type.to_string().bright_white());
    println!(
        "  Updated: {}",
        user.updated_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
    );
    println!("  URLs:    {}", total.to_string().bright_white().bold());
    println!();

    Ok(())
}

/// Deletes an account after confirmation (default: No).
///
/// URLs go first so their codes can be evicted from Redis before the
/// account row disappears.
async fn delete_user(repos: &Repositories, email: &str, skip_confirm: bool) -> Result<()> {
    let user = find_user(repos, email).await?;

    println!("{}", "Delete Account".bright_blue().bold());
    println!();
    println!("  Email: {}", user.email.cyan());
    println!("  ID:    {}", user.user_id.to_string().bright_black());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this account and all of its URLs?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    let codes = repos
        .urls
        .delete_by_owner(user.user_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete URLs: {}", e))?;

    match std::env::var("REDIS_URL") {
        Ok(redis_url) if !codes.is_empty() => {
            let cache = RedisCache::connect(&redis_url)
                .await
                .context("Failed to connect to Redis")?;
            let batch = codes.iter().fold(CacheBatch::new(), |batch, code| {
                batch
                    .delete(keys::resolved_url(code))
                    .delete(keys::resolution_count(code))
            });
            cache
                .exec(batch)
                .await
                .context("Failed to invalidate cached URLs")?;
        }
        Ok(_) => {}
        Err(_) => {
            println!(
                "{}",
                "REDIS_URL not set, cached redirects expire on their own TTL".yellow()
            );
        }
    }

    repos
        .users
        .delete_user(user.user_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete account: {}", e))?;

    println!();
    println!(
        "{} ({} URLs removed)",
        "Account deleted".green().bold(),
        codes.len()
    );
    println!();

    Ok(())
}

async fn list_urls(repos: &Repositories, email: &str, offset: i64, limit: i64) -> Result<()> {
    let user = find_user(repos, email).await?;
    let (total, records) = repos
        .urls
        .list_by_owner(user.user_id, offset.max(0), limit.clamp(1, 1000))
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    println!("{} {}", "URLs of".bright_blue().bold(), user.email.cyan());
    println!();

    if records.is_empty() {
        println!("{}", "  No URLs found".yellow());
        return Ok(());
    }

    println!(
        "  {:<14} {:<10} {:<18} {}",
        "Code".bright_white().bold(),
        "Count".bright_white().bold(),
        "Updated".bright_white().bold(),
        "Origin".bright_white().bold()
    );
    println!("  {}", "-".repeat(75).bright_black());

    for record in &records {
        println!(
            "  {:<14} {:<10} {:<18} {}",
            record.short_code.cyan(),
            record.resolution_count,
            record
                .updated_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            record.origin_url
        );
    }

    println!();
    println!(
        "  Showing {} of {}",
        records.len().to_string().bright_white().bold(),
        total.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn check_db(pool: &PgPool, database_url: &str) -> Result<()> {
    println!("{}", "Database Check".bright_blue().bold());
    println!();
    println!("  URL: {}", mask_connection_string(database_url).bright_black());

    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(pool)
        .await
        .context("Query failed")?;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Schema check failed, have migrations run?")?;
    let urls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM urls")
        .fetch_one(pool)
        .await
        .context("Schema check failed, have migrations run?")?;

    println!("  {}", "Connected".green().bold());
    println!("  Server: {}", version.bright_black());
    println!("  Users:  {}", users.to_string().bright_white());
    println!("  URLs:   {}", urls.to_string().bright_white());
    println!();

    Ok(())
}
