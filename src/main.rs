use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::info;
use vpatient::api::{self, app_state::AppState};
use vpatient::config::loader::ConfigLoader;
use vpatient::observability::{AppMetrics, HealthCheckResult, ObservabilityState, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("failed to load configuration")?;
    ConfigLoader::validate(&config).context("invalid configuration")?;

    let _log_guard = init_tracing(&config.logging);
    info!(
        "Starting {} ({}) v{}",
        config.app_name,
        config.environment,
        env!("CARGO_PKG_VERSION")
    );

    let metrics = Arc::new(AppMetrics::default());
    let app_state = AppState::from_config(config.clone(), metrics.clone())
        .context("failed to initialize services")?;
    info!(
        "Services initialized (completion backend: {}, embedding backend: {})",
        config.completion.backend, config.embedding.backend
    );

    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION"),
        metrics,
    ));

    let started = Instant::now();
    let catalog = app_state.persona_service.list().await;
    observability_state
        .add_health_check(HealthCheckResult {
            name: "persona_catalog".into(),
            healthy: catalog.as_ref().is_ok_and(|p| !p.is_empty()),
            message: match &catalog {
                Ok(personas) => format!("{} personas loaded", personas.len()),
                Err(e) => e.to_string(),
            },
            latency_ms: started.elapsed().as_millis() as u64,
        })
        .await;

    let started = Instant::now();
    let knowledge = app_state.knowledge.count().await;
    observability_state
        .add_health_check(HealthCheckResult {
            name: "knowledge_base".into(),
            healthy: knowledge.is_ok(),
            message: match &knowledge {
                Ok(count) => format!("{} entries", count),
                Err(e) => e.to_string(),
            },
            latency_ms: started.elapsed().as_millis() as u64,
        })
        .await;

    let router = api::create_app(app_state, observability_state);
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
