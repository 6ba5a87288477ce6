//! Parallel phase of the render stage.
//!
//! Sample lines are order-independent, so records are split into disjoint
//! chunks rendered by concurrent tasks (bounded by the render pool size) and
//! rejoined in original order. The sequential metadata-grouping walk lives
//! in `promfuse_core::exposition::render::assemble`.

use futures_util::future::join_all;
use tracing::error;

use promfuse_core::exposition::render::render_line;
use promfuse_core::exposition::MetricRecord;

/// Render every record's sample line, writing `rendered` exactly once per
/// record. Chunked so no two tasks ever touch the same record; rejoining in
/// chunk order preserves the input order.
pub async fn render_parallel(records: Vec<MetricRecord>, pool_size: usize) -> Vec<MetricRecord> {
    if records.is_empty() {
        return records;
    }

    let chunk_size = records.len().div_ceil(pool_size.max(1));
    let mut handles = Vec::new();
    let mut rest = records;
    while !rest.is_empty() {
        let tail = rest.split_off(chunk_size.min(rest.len()));
        let mut chunk = rest;
        rest = tail;
        handles.push(tokio::spawn(async move {
            for record in &mut chunk {
                record.rendered = render_line(record);
            }
            chunk
        }));
    }

    let mut out = Vec::new();
    for joined in join_all(handles).await {
        match joined {
            Ok(mut chunk) => out.append(&mut chunk),
            // Only reachable if a render task panics; the affected chunk is
            // lost but the document is still produced.
            Err(err) => error!(error = %err, "render task failed"),
        }
    }
    out
}
