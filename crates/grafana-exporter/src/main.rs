mod app;
mod config;

use anyhow::{Context, Result};
use grafana_client::{GrafanaApi, HttpClient};
use grafana_collectors::{AdminStatsCollector, Collector, MetricsCollector};
use prometheus::Registry;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::{build_http_app, AppState};
use crate::config::ExporterConfig;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  grafana-exporter [config.toml]    Start the exporter");
    eprintln!();
    eprintln!("Every setting can also be supplied via GRAFANA_EXPORTER_* environment");
    eprintln!("variables (GRAFANA_URI, GRAFANA_USERNAME, GRAFANA_PASSWORD,");
    eprintln!("GRAFANA_SKIP_SSL_VERIFY, WEB_LISTEN_ADDRESS, WEB_TELEMETRY_PATH).");
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install default CryptoProvider: {e:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("grafana_exporter=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        path => run_server(path).await,
    }
}

async fn run_server(config_path: Option<&str>) -> Result<()> {
    let config = ExporterConfig::load(config_path)?;

    let client: Arc<dyn GrafanaApi> = Arc::new(HttpClient::new(
        &config.grafana_uri,
        &config.grafana_username,
        &config.grafana_password,
        config.grafana_skip_tls_verify,
    )?);

    let registry = Registry::new();
    let collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(AdminStatsCollector::new(client.clone())?),
        Arc::new(MetricsCollector::new(client)?),
    ];
    for collector in &collectors {
        collector.register(&registry)?;
    }

    let state = AppState {
        registry,
        collectors: Arc::new(collectors),
        telemetry_path: config.telemetry_path.clone(),
    };
    let app = build_http_app(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("Failed to bind '{}'", config.listen_address))?;
    info!(
        "Listening on {}, scraping {}",
        config.listen_address, config.grafana_uri
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutdown signal received, stopping");
}
