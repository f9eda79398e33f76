use anyhow::Result;
use cineview::config::REQUIRED_ENV;
use cineview::{CatalogApi, Config, MovieCatalog, TmdbClient};
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn check_env() -> Result<()> {
    for key in REQUIRED_ENV {
        if env::var(key).is_err() {
            anyhow::bail!("Missing required environment variable: {}", key);
        }
    }
    info!("All required environment variables are set");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    match loaded {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    check_env()?;

    let config = Config::from_env()?;
    info!(
        language = %config.language,
        stale_policy = ?config.stale_policy,
        "Starting catalog"
    );
    let tmdb: Arc<dyn CatalogApi> = Arc::new(TmdbClient::from_config(&config)?);
    let catalog = MovieCatalog::from_config(tmdb, &config);
    cineview::app::run_server(catalog, config.bind).await
}
