//! promfuse gateway binary.
//!
//! Loads the YAML config, builds the shared scrape client and router, and
//! serves the aggregation endpoint. Each inbound `/metrics` request runs
//! one full collect -> sort -> render pipeline over the configured targets.

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use promfuse_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "promfuse.yaml".to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .expect("gateway.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg).expect("state init failed");
    let app = router::build_router(state);

    tracing::info!(%listen, "promfuse-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
