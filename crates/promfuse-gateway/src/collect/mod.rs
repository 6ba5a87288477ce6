//! Collection pipeline: bounded fan-out, single-writer merge, stable sort.
//!
//! One [`CollectionRun`] covers one inbound request. Fetch tasks are gated
//! by a counting semaphore (the sole bound on concurrent outbound
//! connections); each successful body is parsed by an unbounded short-lived
//! task; all parsed batches flow into a merge task that is the only writer
//! to the accumulated record vector. End-of-input propagates by channel
//! closure and the merge task acknowledges drain completion over a oneshot
//! before the run returns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error};

use promfuse_core::error::{PromFuseError, Result};
use promfuse_core::exposition::parse::{parse_body, ParseOptions};
use promfuse_core::exposition::{self, MetricRecord};

use crate::config::CollectSection;
use crate::fetch::{FetchBody, ScrapeClient, Target};
use crate::render;

/// Per-run behavior switches, derived from the `collect` config section.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub abort_on_failure: bool,
    pub parallel: bool,
    pub sort: bool,
    pub omit_metadata: bool,
    pub suppress_fetch_errors: bool,
    pub fetch_pool_size: usize,
    pub render_pool_size: usize,
}

impl RunOptions {
    pub fn from_config(cfg: &CollectSection) -> Self {
        Self {
            abort_on_failure: cfg.abort_on_failure,
            parallel: cfg.parallel,
            sort: cfg.sort,
            omit_metadata: cfg.omit_metadata,
            suppress_fetch_errors: cfg.suppress_fetch_errors,
            fetch_pool_size: cfg.fetch_pool_size,
            render_pool_size: cfg.render_pool_size,
        }
    }

    /// Sequential mode degrades the fetch pool to a single slot.
    pub fn effective_fetch_pool(&self) -> usize {
        if self.parallel {
            self.fetch_pool_size
        } else {
            1
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&CollectSection::default())
    }
}

/// Per-stage wall-clock durations of one run, logged by the front-end.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTimings {
    pub collect: Duration,
    pub sort: Duration,
    pub render_prepare: Duration,
    pub render_assemble: Duration,
}

/// One end-to-end collection run. Owns every record it produces and is
/// discarded after the rendered document is consumed; nothing is shared
/// across runs.
pub struct CollectionRun {
    targets: Vec<Target>,
    client: Arc<dyn ScrapeClient>,
    opts: RunOptions,
    pub records: Vec<MetricRecord>,
    pub timings: RunTimings,
}

impl CollectionRun {
    pub fn new(targets: Vec<Target>, client: Arc<dyn ScrapeClient>, opts: RunOptions) -> Self {
        Self {
            targets,
            client,
            opts,
            records: Vec::new(),
            timings: RunTimings::default(),
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.opts
    }

    /// Fetch every target, parse successful bodies, merge all records, and
    /// sort when enabled.
    ///
    /// Under abort-on-failure the first target failure empties the run and
    /// surfaces as `RunAborted`; otherwise failed targets contribute zero
    /// records and the rest are kept.
    pub async fn collect_targets(&mut self) -> Result<()> {
        let started = Instant::now();
        let records = collect_merged(&self.targets, Arc::clone(&self.client), &self.opts).await?;
        self.records = records;
        self.timings.collect = started.elapsed();
        debug!(
            records = self.records.len(),
            duration_ms = self.timings.collect.as_millis() as u64,
            "collection complete"
        );

        if self.opts.sort {
            if self.opts.omit_metadata {
                debug!("metadata collection is disabled; grouping carries no HELP/TYPE blocks");
            }
            let started = Instant::now();
            exposition::sort_records(&mut self.records);
            self.timings.sort = started.elapsed();
            debug!(
                duration_ms = self.timings.sort.as_millis() as u64,
                "records sorted"
            );
        }
        Ok(())
    }

    /// Render the accumulated records into the final exposition document.
    ///
    /// Re-rendering without another collect produces byte-identical output.
    pub async fn render(&mut self) -> String {
        let started = Instant::now();
        let records = std::mem::take(&mut self.records);
        self.records = render::render_parallel(records, self.opts.render_pool_size).await;
        self.timings.render_prepare = started.elapsed();

        let started = Instant::now();
        let doc = exposition::render::assemble(&self.records);
        self.timings.render_assemble = started.elapsed();
        doc
    }
}

/// Fan out fetches, funnel parsed batches into the single-writer merge
/// task, and hand the merged vector back once everything has drained.
async fn collect_merged(
    targets: &[Target],
    client: Arc<dyn ScrapeClient>,
    opts: &RunOptions,
) -> Result<Vec<MetricRecord>> {
    let semaphore = Arc::new(Semaphore::new(opts.effective_fetch_pool()));
    let (body_tx, mut body_rx) = mpsc::channel::<Result<FetchBody>>(targets.len().max(1));

    // One detached fetch task per target. There is no cooperative
    // cancellation: after an early abort, in-flight fetches run to
    // completion and their sends fail against the closed channel.
    for target in targets.iter().cloned() {
        let semaphore = Arc::clone(&semaphore);
        let client = Arc::clone(&client);
        let tx = body_tx.clone();
        tokio::spawn(async move {
            // The slot gates the outbound request, not the caller.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            debug!(url = %target.url, name = target.name.as_deref().unwrap_or(""), "fetching target");
            let outcome = client.get_body(&target.url).await.map(|body| FetchBody {
                body,
                extra_labels: target.extra_labels,
            });
            let _ = tx.send(outcome).await;
        });
    }
    // End-of-input is the drop of the last sender.
    drop(body_tx);

    // Merge stage: sole owner and sole writer of the accumulated records.
    // Producers only send; on input closure it acknowledges with the vector.
    let (batch_tx, mut batch_rx) = mpsc::channel::<Vec<MetricRecord>>(16);
    let (ack_tx, ack_rx) = oneshot::channel::<Vec<MetricRecord>>();
    tokio::spawn(async move {
        let mut records: Vec<MetricRecord> = Vec::new();
        while let Some(mut batch) = batch_rx.recv().await {
            records.append(&mut batch);
        }
        debug!(records = records.len(), "merge stage drained");
        let _ = ack_tx.send(records);
    });

    let parse_opts = ParseOptions {
        omit_metadata: opts.omit_metadata,
        with_sort_key: opts.sort,
    };

    // Parse fan-out is deliberately unbounded: parsing is short and local,
    // unlike fetching it is not rate-limited against an external resource.
    let mut parsers: JoinSet<()> = JoinSet::new();
    while let Some(outcome) = body_rx.recv().await {
        match outcome {
            Ok(fetched) => {
                let tx = batch_tx.clone();
                parsers.spawn(async move {
                    let body = String::from_utf8_lossy(&fetched.body);
                    let batch = parse_body(&body, &fetched.extra_labels, parse_opts);
                    let _ = tx.send(batch).await;
                });
            }
            Err(err) if opts.abort_on_failure => {
                // First failure wins: stop consuming and discard everything
                // accumulated so far. Dropping the join set cancels pending
                // parse tasks.
                error!(error = %err, "aborting collection run");
                return Err(err.into_aborted());
            }
            Err(err) => {
                if !opts.suppress_fetch_errors {
                    error!(error = %err, "skipping failed target");
                }
            }
        }
    }

    // All fetches have reported; wait for the parse fan-out to drain, then
    // close the merge input and wait for its acknowledgement.
    while parsers.join_next().await.is_some() {}
    drop(batch_tx);
    ack_rx
        .await
        .map_err(|_| PromFuseError::Internal("merge stage terminated before acknowledgement".into()))
}
