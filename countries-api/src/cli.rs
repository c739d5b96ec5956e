use anyhow::Context;
use clap::Parser;
use countries_core::{Config, FavoritePolicy, Overrides, RequestAggregator};
use std::path::PathBuf;

use crate::routes;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "countries-api", version, about = "Country, weather and favourites HTTP service")]
pub struct Cli {
    /// Path to a TOML config file; defaults to the platform config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. "0.0.0.0:5000".
    #[arg(long)]
    pub bind: Option<String>,

    /// API key for the weather provider.
    #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
    pub weather_api_key: Option<String>,

    /// API key for the favourites document store.
    #[arg(long, env = "DB_API_KEY", hide_env_values = true)]
    pub db_api_key: Option<String>,

    /// How adding an already stored favourite is handled: "append" or "upsert".
    #[arg(long, value_parser = parse_policy)]
    pub favorites_policy: Option<FavoritePolicy>,
}

fn parse_policy(value: &str) -> anyhow::Result<FavoritePolicy> {
    FavoritePolicy::try_from(value)
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        Ok(config.with_overrides(Overrides {
            bind: self.bind.clone(),
            weather_api_key: self.weather_api_key.clone(),
            db_api_key: self.db_api_key.clone(),
            favorite_policy: self.favorites_policy,
        }))
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;
        let aggregator = RequestAggregator::from_config(&config)?;

        tracing::info!(
            policy = %config.favorites.policy,
            concurrency = config.hottest.concurrency,
            timeout_secs = config.http.timeout_secs,
            "aggregator ready"
        );

        let listener = tokio::net::TcpListener::bind(&config.server.bind)
            .await
            .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

        tracing::info!(addr = %config.server.bind, "listening");

        axum::serve(listener, routes::create_router(aggregator))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}
