//! Main entry point for the health probe server binary

use anyhow::Result;
use axum::{routing::get, Router};
use rx_core::{create_app, run_server, AppConfig, FnCheck, HealthCheck, HealthService};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());

    let addr: SocketAddr = config.bind_address().parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let service = build_health_service(&config)?;
    let app = create_app(service, application());

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn application() -> Router {
    Router::new().route("/", get(|| async { "rx health probe server" }))
}

fn build_health_service(config: &AppConfig) -> Result<HealthService> {
    let filesystem: Arc<dyn HealthCheck> = Arc::new(FnCheck::new("filesystem", || async {
        let probe = std::env::temp_dir().join(format!(".rx_health_{}", std::process::id()));
        tokio::fs::write(&probe, b"ok").await?;
        tokio::fs::remove_file(&probe).await?;
        Ok::<_, anyhow::Error>(true)
    }));

    let service = HealthService::builder()
        .health_config(config.health.clone())
        .cache_config(config.cache.clone())
        .liveness_and_readiness(filesystem)
        .deep_critical(FnCheck::new("blocking_pool", || async {
            tokio::task::spawn_blocking(|| ()).await?;
            Ok::<_, anyhow::Error>(true)
        }))
        .deep_secondary(FnCheck::new("upstream", || async {
            let addr = std::env::var("RX_UPSTREAM_ADDR")
                .map_err(|_| anyhow::anyhow!("RX_UPSTREAM_ADDR is not set"))?;
            tokio::net::TcpStream::connect(&addr).await?;
            Ok::<_, anyhow::Error>(true)
        }))
        .build()?;

    info!("Health service ready: {:?}", service);
    Ok(service)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let default_level = if cfg!(debug_assertions) {
                "debug"
            } else {
                "info"
            };

            format!(
                "{}={},rx_core={},tower_http=info",
                env!("CARGO_CRATE_NAME").replace('-', "_"),
                default_level,
                default_level
            ).into()
        });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
