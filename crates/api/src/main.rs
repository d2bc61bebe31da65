use std::sync::Arc;

use anyhow::Context;

use rentwatch_api::app::{build_app, AppServices};
use rentwatch_infra::{config::AppConfig, jobs::Scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rentwatch_observability::init();

    let config = AppConfig::from_env()?;
    let services = Arc::new(AppServices::from_config(&config)?);

    let scheduler = Scheduler::new(
        services.registry.clone(),
        config.notify_at,
        config.schedule_timezone,
    );
    tracing::info!(next_run = %scheduler.next_fire(), "reminder schedule armed");
    let scheduler = scheduler.spawn();

    let app = build_app(services);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
