use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use moisture_exporter::Config;
use moisture_exporter::HttpFetcher;
use moisture_exporter::Metrics;
use moisture_exporter::api;
use moisture_exporter::config::LoggingConfig;

/// Republish moisture monitor readings as Prometheus metrics
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device address (`host` or `host:port`), overrides the config file
    #[arg(short, long)]
    device: Option<String>,

    /// Port to serve /metrics on, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(device) = cli.device {
        config.device.address = device;
    }
    if let Some(port) = cli.port {
        config.api.port = port;
    }

    init_logging(&config.logging);

    tracing::info!("moisture_exporter starting");
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from: {}", path.display());
    }

    let fetcher = HttpFetcher::new(&config.device).context("Failed to create HTTP client")?;
    tracing::info!("Pulling resources from {}", fetcher.url());

    let metrics = Arc::new(Metrics::new().context("Failed to create metrics registry")?);
    let state = api::AppState::new(Arc::new(fetcher), metrics);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received shutdown signal"),
            Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
        }
        shutdown_tx.send(()).ok();
    });

    api::serve(&config.api, state, shutdown_rx)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("HTTP server failed")?;

    tracing::info!("moisture_exporter shutdown complete");

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = Targets::new()
        .with_default(LevelFilter::from(logging.level))
        .with_targets(
            logging
                .overrides
                .iter()
                .map(|(target, level)| (target.clone(), LevelFilter::from(*level))),
        );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
