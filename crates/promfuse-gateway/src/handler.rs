//! HTTP handlers for the aggregation endpoints.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, info};

use promfuse_core::error::{ClientCode, PromFuseError};

use crate::app_state::AppState;
use crate::collect::CollectionRun;

/// Content type of the text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// One inbound scrape: collect every configured target, merge, and serve
/// the aggregated document. Errors are surfaced, never retried here.
pub async fn merged_metrics(State(state): State<AppState>) -> Response {
    let mut run = CollectionRun::new(
        state.targets().to_vec(),
        state.client(),
        state.run_options().clone(),
    );

    if let Err(err) = run.collect_targets().await {
        error!(error = %err, "failed to collect targets");
        return error_response(&err);
    }
    let body = run.render().await;

    info!(
        records = run.records.len(),
        collect_ms = run.timings.collect.as_millis() as u64,
        sort_ms = run.timings.sort.as_millis() as u64,
        render_prepare_ms = run.timings.render_prepare.as_millis() as u64,
        render_assemble_ms = run.timings.render_assemble.as_millis() as u64,
        "request processed"
    );

    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

/// Liveness probe.
pub async fn healthz() -> &'static str {
    "ok"
}

fn error_response(err: &PromFuseError) -> Response {
    let code = err.client_code();
    let status = match code {
        ClientCode::UpstreamFetchFailed | ClientCode::RunAborted => StatusCode::BAD_GATEWAY,
        ClientCode::BadConfig | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        axum::Json(json!({ "error": code.as_str(), "detail": err.to_string() })),
    )
        .into_response()
}
