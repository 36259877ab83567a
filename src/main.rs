use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use village_one_api::{app, config::AppConfig, state::AppState};

#[derive(Parser)]
#[command(name = "village-one-api")]
#[command(about = "Village-One API server")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides VILLAGE_API_PORT / PORT)")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, AUTH_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("village_one_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::info!("Starting Village-One API in {:?} mode", config.environment);

    let port = config.server.port;
    let state = AppState::from_config(config).await?;
    let app = app::router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Village-One API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
