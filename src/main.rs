use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;

use post_pulse::{ config::logging::init_logging, initialize_app, Config };

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    let addr: SocketAddr = config.server.addr
        .parse()
        .with_context(|| format!("Invalid SERVER_ADDR '{}'", config.server.addr))?;
    let environment = config.server.environment.clone();

    let app = initialize_app(config).context("Failed to initialize application")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://{} ({})", addr, environment);

    axum::serve(listener, app).await?;

    Ok(())
}
