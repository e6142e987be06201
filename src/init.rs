// src/init.rs
use crate::{
    aggregate,
    config::Config,
    duck::Store,
    error::{HexError, Result},
    fetch, load,
    schema::{RAW_TABLE, SUMMARY_TABLE},
};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::info;

/// What [`prepare_store`] found or built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOutcome {
    /// True when both tables were already present and nothing was built.
    pub prebuilt: bool,
    pub records: i64,
    pub hexes: i64,
}

/// Resolve, open and (if needed) build the database described by `config`.
///
/// A remote `DB_PATH` is downloaded once to `local_db_path`; an existing local
/// copy is reused. Any failure here is fatal to startup.
pub async fn init_database(config: &Config, client: &Client) -> Result<(Store, BuildOutcome)> {
    info!("initializing duckdb");
    let db_path = resolve_db_path(config, client).await?;
    let sources = config.source_files();

    tokio::task::spawn_blocking(move || -> Result<(Store, BuildOutcome)> {
        let store = Store::open(&db_path)?;
        let outcome = prepare_store(&store, &sources)?;
        Ok((store, outcome))
    })
    .await
    .map_err(|e| HexError::StorageUnavailable(format!("build task failed: {e}")))?
}

async fn resolve_db_path(config: &Config, client: &Client) -> Result<PathBuf> {
    if !fetch::is_remote(&config.db_path) {
        let path = PathBuf::from(&config.db_path);
        ensure_parent(&path)?;
        return Ok(path);
    }

    let local = config.local_db_path.clone();
    if local.is_file() {
        info!(path = %local.display(), "using cached database download");
        return Ok(local);
    }
    info!("downloading database from {}", config.db_path);
    fetch::download_file(client, &config.db_path, &local).await
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Make sure `store` holds both the raw and the summary table.
///
/// A store that already has its summary is used as-is. An empty store is
/// loaded from `sources` first. The raw table only exists once a load has
/// committed every file, so a store holding just the raw table stopped between
/// load and aggregation and only needs its summary rebuilt.
pub fn prepare_store<P: AsRef<Path>>(store: &Store, sources: &[P]) -> Result<BuildOutcome> {
    let has_raw = store.table_exists(RAW_TABLE)?;
    let has_summary = store.table_exists(SUMMARY_TABLE)?;

    if has_raw && has_summary {
        let records = store.count_rows(RAW_TABLE)?;
        let hexes = store.count_rows(SUMMARY_TABLE)?;
        info!(records, hexes, "using pre-built database");
        return Ok(BuildOutcome {
            prebuilt: true,
            records,
            hexes,
        });
    }

    let conn = store.connect()?;
    if !has_raw {
        info!("building database from CSV files");
        load::load_sources(&conn, sources)?;
    } else {
        info!("raw table present without summary; rebuilding summary");
    }
    let hexes = aggregate::build_summary(&conn)?;
    let records = store.count_rows(RAW_TABLE)?;
    info!(records, hexes, "duckdb initialized");

    Ok(BuildOutcome {
        prebuilt: false,
        records,
        hexes,
    })
}
