use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use podshelf::config::Config;
use podshelf::feed::FeedClient;
use podshelf::storage::{Database, DatabaseError};
use podshelf::web::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "podshelf", about = "Register podcast feeds and browse their latest episodes")]
struct Args {
    /// TOML config file (optional; defaults apply when absent)
    #[arg(long, value_name = "FILE", default_value = "podshelf.toml")]
    config: PathBuf,

    /// SQLite database path, overrides `database_path`
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    /// Listen address, overrides `bind_address`
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("podshelf=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }

    tracing::info!(path = %config.database_path, "Starting DB");
    let db = match Database::open(&config.database_path).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: {}", DatabaseError::InstanceLocked);
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to open database"),
    };

    let feeds = FeedClient::new(config.fetch.clone()).context("Failed to build HTTP client")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;

    web::serve(listener, AppState::new(db, feeds))
        .await
        .context("Server error")?;

    Ok(())
}
