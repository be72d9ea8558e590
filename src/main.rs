use std::{net::SocketAddr, sync::Arc};

use car_price_gateway::{config::GatewayConfig, gateway::Gateway, server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = GatewayConfig::from_env()?;

    // Under the eager policy a missing or corrupt artifact stops us here.
    let gateway = Gateway::from_config(&cfg)?;
    tracing::info!(
        "model state {:?}; columns: {:?}",
        gateway.state(),
        gateway.strategy().column_names()
    );

    let app = server::router(Arc::new(gateway));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
