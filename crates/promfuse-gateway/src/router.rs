//! Axum router wiring.
//!
//! Exposes the aggregated `/metrics` document and a `/healthz` liveness
//! route.

use axum::{routing::get, Router};

use crate::{app_state::AppState, handler};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(handler::merged_metrics))
        .route("/healthz", get(handler::healthz))
        .with_state(state)
}
