//! provider-router - provider health and budget monitor
//!
//! Loads the routing configuration, probes every configured provider once,
//! then keeps probing in the background until interrupted.

#![allow(missing_docs)]

use anyhow::Context;
use clap::Parser;
use provider_router::utils::logging::init_logging;
use provider_router::{Config, HealthMonitor, ProviderRouter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "provider-router", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "PROVIDER_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level override (e.g. info, debug, provider_router=trace)
    #[arg(long)]
    log_level: Option<String>,
}

async fn load_config(args: &Args) -> anyhow::Result<Config> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::from_env().context("loading configuration from environment")?,
    };
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(&args).await?;
    if let Some(level) = args.log_level {
        config.gateway.logging.level = level;
    }
    init_logging(config.logging())?;

    let router = Arc::new(ProviderRouter::new(&config.gateway));
    let monitor = Arc::new(HealthMonitor::new(router.clone())?);

    let results = monitor.probe_once().await;
    for (provider_id, result) in &results {
        info!(
            "Provider {} initial probe: {} in {}ms",
            provider_id,
            if result.success { "ok" } else { "failed" },
            result.response_time_ms
        );
    }
    for provider_id in router.provider_ids() {
        if let Some(snapshot) = router.provider_snapshot(&provider_id) {
            debug!("Provider snapshot: {}", serde_json::to_string(&snapshot)?);
        }
    }
    let health = router.system_health();
    info!(
        "{} providers: {} healthy, {} degraded, {} unhealthy",
        health.total, health.healthy, health.degraded, health.unhealthy
    );

    monitor.start();
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    info!("Shutdown signal received");
    monitor.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Pick up PROVIDER_ROUTER_* overrides from a local .env file
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
