mod clock;
mod config;
mod error;
mod gateway;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod routes;
mod state;
mod upstream;

#[cfg(test)]
mod test_support;

use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::clock::SystemClock;
use crate::config::Args;
use crate::gateway::CompletionGateway;
use crate::rate_limit::{AdmissionController, MemoryWindowStore};
use crate::state::AppState;
use crate::upstream::OpenAiClient;

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG and OPENAI_API_KEY are visible
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();

    let backend = OpenAiClient::new(&args.upstream_url, args.upstream_timeout())?;
    let upstream_url = backend.base_url().to_string();

    let gateway = CompletionGateway::new(
        Arc::new(backend),
        args.api_key.clone(),
        args.generation_settings(),
    );
    if !gateway.is_configured() {
        warn!("OPENAI_API_KEY not set, every generate request will fail with 500");
    }

    let admission = AdmissionController::new(
        Arc::new(MemoryWindowStore::default()),
        Arc::new(SystemClock),
        args.rate_limit,
        args.rate_window(),
    );

    info!(
        "Rate limit: {} requests per {} seconds",
        admission.max_requests(),
        admission.window().as_secs()
    );
    info!(
        "Model: {} (caller overrides {})",
        gateway.settings().model,
        if gateway.settings().allow_overrides { "allowed" } else { "ignored" }
    );

    // creating shared state
    let state = Arc::new(AppState { admission, gateway });
    let app = routes::router(state, !args.disable_cors);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Gateway running on http://localhost:{}", args.port);
    info!("Forwarding to {}", upstream_url);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
