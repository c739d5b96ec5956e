//! Binary crate for the `countries-api` HTTP service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and merging them into the core config
//! - Logging bootstrap
//! - Routing, request validation and error translation

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod error;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
