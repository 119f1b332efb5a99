mod adapters;
mod application;
mod config;
mod domain;
mod ports;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{HttpSourceConfig, HttpStatusSource, TerminalSurface};
use application::Poller;
use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging; stdout belongs to the panel
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("gaugewatch={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting GaugeWatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    let source = HttpStatusSource::new(
        HttpSourceConfig::new(config.base_url.clone())
            .with_timeout(config.request_timeout)
            .with_cookie(config.cookie.clone()),
    )?;
    info!("Polling {}", source.url());

    let poller = Arc::new(Poller::new(
        Arc::new(source),
        Arc::new(TerminalSurface::stdout()),
        config.refresh_interval,
    ));
    poller.start();

    tokio::signal::ctrl_c().await?;
    poller.stop();
    println!();

    Ok(())
}
