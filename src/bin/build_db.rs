//! Clean rebuild of the on-disk database from the CSV exports.

use anyhow::{bail, Context, Result};
use hexband::{aggregate, config::Config, duck::Store, init};
use std::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // 1. Configuration
    let config = Config::from_env()?;
    let db_path = config.local_db_path.clone();
    info!("building {}", db_path.display());

    // 2. If an old DB exists, remove it so we start fresh
    if db_path.exists() {
        info!("removing existing database file");
        fs::remove_file(&db_path)?;
    }
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    // 3. Load, aggregate, verify
    {
        let store = Store::open(&db_path)?;
        let outcome = init::prepare_store(&store, &config.source_files())
            .context("building database")?;
        aggregate::check_invariants(&store.connect()?)?;
        info!(records = outcome.records, hexes = outcome.hexes, "built");
    }

    // 4. Verify the file was written
    if !db_path.exists() {
        bail!("database file {} was not created", db_path.display());
    }
    let size = fs::metadata(&db_path)?.len();
    println!(
        "Database built successfully: {:.2} MB",
        size as f64 / 1024.0 / 1024.0
    );
    Ok(())
}
