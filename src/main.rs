//! FLIPSCOUT — Grand Exchange flip recommendation service
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the price feed (live or fixture) through the TTL cache, and
//! serves the HTTP API — or, with the server disabled, runs a single
//! scan and logs the top candidates.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flipscout::config::AppConfig;
use flipscout::engine::FlipEngine;
use flipscout::feed::{CacheTtl, CachedSource, SnapshotSource, StaticSource, WikiClient};
use flipscout::server::{self, ApiState};
use flipscout::types::FlipRequest;

const BANNER: &str = r#"
  _____ _     ___ ____  ____   ____ ___  _   _ _____
 |  ___| |   |_ _|  _ \/ ___| / ___/ _ \| | | |_   _|
 | |_  | |    | || |_) \___ \| |  | | | | | | | | |
 |  _| | |___ | ||  __/ ___) | |__| |_| | |_| | | |
 |_|   |_____|___|_|   |____/ \____\___/ \___/  |_|

  Grand Exchange flip finder
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_or_default("config.toml")?;

    init_logging();
    println!("{BANNER}");

    // Fixture mode serves the built-in sample items instead of hitting
    // the live feed.
    let mock_mode = std::env::var("FLIPSCOUT_MOCK_DATA")
        .map(|v| v == "1")
        .unwrap_or(false);

    let source: Arc<dyn SnapshotSource> = if mock_mode {
        info!("FLIPSCOUT_MOCK_DATA=1 — serving fixture data");
        Arc::new(StaticSource::sample(Utc::now().timestamp()))
    } else {
        let wiki = WikiClient::new(&cfg.feed)?;
        Arc::new(CachedSource::new(wiki, CacheTtl::from(&cfg.feed)))
    };

    info!(
        source = source.name(),
        server_enabled = cfg.server.enabled,
        port = cfg.server.port,
        "FLIPSCOUT starting up"
    );

    if cfg.server.enabled {
        let state = Arc::new(ApiState::new(source));
        server::serve(state, cfg.server.port).await
    } else {
        // One-shot mode: scan once with the defaults and log the results.
        let engine = FlipEngine::new(source);
        let flips = engine.find_best_flips(&FlipRequest::default()).await?;
        if flips.is_empty() {
            info!("No qualifying flips right now");
        }
        for candidate in &flips {
            info!("{candidate}");
        }
        Ok(())
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
