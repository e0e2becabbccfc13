//! vllm-gateway binary: wires config, client, and router together.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use vllm_gateway::client::vllm::VllmClient;
use vllm_gateway::config::{Cli, Config};
use vllm_gateway::server::api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "vllm_gateway=debug,tower_http=debug"
    } else {
        "vllm_gateway=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("vllm-gateway v{}", env!("CARGO_PKG_VERSION"));

    // Resolve configuration once; handlers never touch the environment.
    let config = Arc::new(Config::from_env());

    info!(
        endpoint = config.llm_endpoint,
        model = config.model_id,
        "Configuration loaded"
    );

    // Build the backend client and application state.
    let client = Arc::new(VllmClient::new(&config));
    let state = Arc::new(AppState {
        client,
        config,
        start_time: Instant::now(),
    });

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = cli.listen;
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
