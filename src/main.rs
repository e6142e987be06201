use anyhow::{Context, Result};
use hexband::{api, config::Config, init, query::HexService};
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) config + logging ─────────────────────────────────────────
    let config = Config::from_env().context("reading configuration")?;
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(config.log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();
    info!("startup");

    // ─── 2) fetch/open/build the database; any failure aborts ───────
    let client = Client::new();
    let (store, outcome) = init::init_database(&config, &client)
        .await
        .context("initializing database")?;
    info!(
        records = outcome.records,
        hexes = outcome.hexes,
        prebuilt = outcome.prebuilt,
        "database ready"
    );

    // ─── 3) serve ────────────────────────────────────────────────────
    let service = Arc::new(HexService::new(store).context("opening hex service")?);
    let routes = api::routes(service, config.static_dir.clone());

    info!("Server starting on port {}", config.port);
    info!("Hex list: http://localhost:{}/api/maryland/hexes", config.port);
    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;

    Ok(())
}
