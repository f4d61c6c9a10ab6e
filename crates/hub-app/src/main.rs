mod cli;
mod commands;
mod render;

use clap::Parser;
use hub_client::{ClientConfig, Hub};

use crate::cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hub_app=info,hub_client=debug,hub_views=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = ClientConfig::from_env()?;
    let hub = Hub::connect(&config).await?;

    commands::run(&hub, &config, args.command).await
}
