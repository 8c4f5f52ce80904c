//! geomirror gateway entry point.

use anyhow::Context;
use geomirror_gateway::app::{build_router, build_state};
use geomirror_gateway::config::GatewayConfig;
use geomirror_gateway::observability;
use std::future::Future;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_logging();
    let config = GatewayConfig::from_env_or_file().context("load gateway config")?;
    config.validate()?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: GatewayConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = build_state(&config)?;
    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(
        %addr,
        upstream = %config.upstream.base_url,
        database = %config.database_path.display(),
        "gateway listening"
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("gateway stopped");
    Ok(())
}
