use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shopfront_core::{load_app_config, load_product_catalog, AppConfig};
use shopfront_db::{health_check, reset_and_seed, run_migrations, Database, PoolConfig};

#[derive(Debug, Parser)]
#[command(name = "shopfront-cli")]
#[command(about = "Shopfront database operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or update the database schema.
    Migrate,
    /// Reset the products table and load the seed catalog.
    Seed {
        /// Catalog file to load instead of the configured default.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Verify that the database is reachable.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_app_config().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    let db = Database::new(config.database.clone(), PoolConfig::from_app_config(&config));

    let outcome = run(&cli.command, &db, &config).await;
    db.release().await;
    outcome
}

async fn run(command: &Commands, db: &Database, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Migrate => {
            let pool = db.acquire().await?;
            let applied = run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            println!("applied {applied} migration(s)");
        }
        Commands::Seed { file } => {
            let path = file.clone().unwrap_or_else(|| config.seed_path.clone());
            tracing::info!(path = %path.display(), "loading seed catalog");
            let catalog = load_product_catalog(&path)
                .with_context(|| format!("failed to load catalog from {}", path.display()))?;
            let created = reset_and_seed(db, &catalog.products)
                .await
                .context("failed to seed the database")?;
            println!("seeded {} product(s)", created.len());
        }
        Commands::Health => {
            let pool = db.acquire().await?;
            health_check(&pool)
                .await
                .context("database health check failed")?;
            println!("database reachable");
        }
    }
    Ok(())
}
