//! End-to-end pipeline tests over a stub scrape client (no sockets).
//!
//! The stub resolves URLs from an in-memory table; unknown URLs behave as
//! unreachable targets. This exercises the coordinator, merge, sort, and
//! render stages deterministically.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use promfuse_core::error::{PromFuseError, Result};
use promfuse_gateway::collect::{CollectionRun, RunOptions};
use promfuse_gateway::fetch::{ScrapeClient, Target};

struct StubClient {
    bodies: HashMap<String, String>,
}

impl StubClient {
    fn new(bodies: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            bodies: bodies
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
        })
    }
}

#[async_trait]
impl ScrapeClient for StubClient {
    async fn get_body(&self, url: &str) -> Result<Bytes> {
        match self.bodies.get(url) {
            Some(body) => Ok(Bytes::from(body.clone())),
            None => Err(PromFuseError::FetchFailed {
                url: url.to_string(),
                reason: "connection refused".into(),
            }),
        }
    }
}

fn target(url: &str, labels: &[(&str, &str)]) -> Target {
    Target {
        name: None,
        url: url.to_string(),
        extra_labels: labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

const T1_BODY: &str = "\
# HELP go_threads Number of OS threads created.
# TYPE go_threads gauge
go_threads 5
";

#[tokio::test]
async fn single_target_roundtrip() {
    let client = StubClient::new(&[("http://t1/metrics", T1_BODY)]);
    let targets = vec![target("http://t1/metrics", &[("app", "api")])];

    let mut run = CollectionRun::new(targets, client, RunOptions::default());
    run.collect_targets().await.expect("collection must succeed");
    let doc = run.render().await;

    assert_eq!(
        doc,
        "# HELP go_threads Number of OS threads created.\n\
         # TYPE go_threads gauge\n\
         go_threads{app=\"api\"} 5\n"
    );
}

#[tokio::test]
async fn extra_labels_precede_parsed_labels() {
    let client = StubClient::new(&[("http://t1/metrics", "go_threads{foo=\"bar\"} 3\n")]);
    let targets = vec![target(
        "http://t1/metrics",
        &[("app", "api"), ("source", "internet")],
    )];

    let mut run = CollectionRun::new(targets, client, RunOptions::default());
    run.collect_targets().await.unwrap();
    let doc = run.render().await;

    assert_eq!(
        doc,
        "go_threads{app=\"api\",source=\"internet\",foo=\"bar\"} 3\n"
    );
}

#[tokio::test]
async fn partial_failure_keeps_surviving_targets() {
    let client = StubClient::new(&[("http://t1/metrics", T1_BODY)]);
    let targets = vec![
        target("http://t1/metrics", &[]),
        target("http://t2/metrics", &[]),
    ];
    let opts = RunOptions {
        suppress_fetch_errors: true,
        ..RunOptions::default()
    };

    let mut run = CollectionRun::new(targets, client, opts);
    run.collect_targets().await.expect("partial failure is not an error");
    assert_eq!(run.records.len(), 1);

    let doc = run.render().await;
    assert!(doc.contains("go_threads 5\n"));
}

#[tokio::test]
async fn abort_on_failure_empties_the_run() {
    let client = StubClient::new(&[("http://t1/metrics", T1_BODY)]);
    let targets = vec![
        target("http://t1/metrics", &[]),
        target("http://t2/metrics", &[]),
    ];
    let opts = RunOptions {
        abort_on_failure: true,
        ..RunOptions::default()
    };

    let mut run = CollectionRun::new(targets, client, opts);
    let err = run.collect_targets().await.expect_err("must abort");
    assert!(matches!(err, PromFuseError::RunAborted { .. }));
    assert_eq!(err.client_code().as_str(), "RUN_ABORTED");

    assert!(run.records.is_empty());
    let doc = run.render().await;
    assert!(doc.is_empty());
}

#[tokio::test]
async fn every_line_merges_exactly_once() {
    let mut bodies = Vec::new();
    for i in 0..4 {
        bodies.push((
            format!("http://t{i}/metrics"),
            format!("metric_a_{i} 1\nmetric_b_{i} 2\nmetric_c_{i} 3\n"),
        ));
    }
    let body_refs: Vec<(&str, &str)> = bodies
        .iter()
        .map(|(u, b)| (u.as_str(), b.as_str()))
        .collect();
    let client = StubClient::new(&body_refs);
    let targets: Vec<Target> = bodies.iter().map(|(u, _)| target(u, &[])).collect();

    let mut run = CollectionRun::new(targets, client, RunOptions::default());
    run.collect_targets().await.unwrap();
    assert_eq!(run.records.len(), 12);

    let doc = run.render().await;
    for i in 0..4 {
        for (name, value) in [("a", 1), ("b", 2), ("c", 3)] {
            let line = format!("metric_{name}_{i} {value}\n");
            assert_eq!(doc.matches(&line).count(), 1, "missing or duplicated: {line}");
        }
    }
}

#[tokio::test]
async fn sorted_output_is_deterministic_across_runs() {
    let mut bodies = Vec::new();
    for i in 0..8 {
        bodies.push((
            format!("http://t{i}/metrics"),
            format!("sample_{i} {i}\nshared_total{{idx=\"{i}\"}} 1\n"),
        ));
    }
    let body_refs: Vec<(&str, &str)> = bodies
        .iter()
        .map(|(u, b)| (u.as_str(), b.as_str()))
        .collect();
    let targets: Vec<Target> = bodies.iter().map(|(u, _)| target(u, &[])).collect();

    let mut docs = Vec::new();
    for _ in 0..2 {
        let client = StubClient::new(&body_refs);
        let mut run = CollectionRun::new(targets.clone(), client, RunOptions::default());
        run.collect_targets().await.unwrap();
        docs.push(run.render().await);
    }
    // Arrival order differs between runs; the sort restores a total order.
    assert_eq!(docs[0], docs[1]);
}

#[tokio::test]
async fn render_twice_is_byte_identical() {
    let client = StubClient::new(&[("http://t1/metrics", T1_BODY)]);
    let targets = vec![target("http://t1/metrics", &[("app", "api")])];

    let mut run = CollectionRun::new(targets, client, RunOptions::default());
    run.collect_targets().await.unwrap();
    let first = run.render().await;
    let second = run.render().await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn shared_metric_name_groups_metadata_once() {
    let body_a = "\
# TYPE shared_total counter
shared_total 1
";
    let body_b = "\
# TYPE shared_total counter
shared_total 2
";
    let client = StubClient::new(&[
        ("http://a/metrics", body_a),
        ("http://b/metrics", body_b),
    ]);
    let targets = vec![
        target("http://a/metrics", &[("app", "a")]),
        target("http://b/metrics", &[("app", "b")]),
    ];

    let mut run = CollectionRun::new(targets, client, RunOptions::default());
    run.collect_targets().await.unwrap();
    let doc = run.render().await;

    assert_eq!(
        doc,
        "# TYPE shared_total counter\n\
         shared_total{app=\"a\"} 1\n\
         shared_total{app=\"b\"} 2\n"
    );
}

#[tokio::test]
async fn malformed_lines_dropped_from_output() {
    let body = "\
good_metric 1
not a metric at all
also_good 2
";
    let client = StubClient::new(&[("http://t1/metrics", body)]);
    let targets = vec![target("http://t1/metrics", &[])];

    let mut run = CollectionRun::new(targets, client, RunOptions::default());
    run.collect_targets().await.unwrap();
    let doc = run.render().await;

    assert_eq!(doc, "also_good 2\ngood_metric 1\n");
}

#[tokio::test]
async fn unsorted_run_skips_sort_keys() {
    let client = StubClient::new(&[("http://t1/metrics", T1_BODY)]);
    let targets = vec![target("http://t1/metrics", &[])];
    let opts = RunOptions {
        sort: false,
        ..RunOptions::default()
    };

    let mut run = CollectionRun::new(targets, client, opts);
    run.collect_targets().await.unwrap();
    assert!(run.records[0].sort_key.is_empty());

    let doc = run.render().await;
    assert!(doc.contains("go_threads 5\n"));
}

#[tokio::test]
async fn omit_metadata_strips_comment_lines() {
    let client = StubClient::new(&[("http://t1/metrics", T1_BODY)]);
    let targets = vec![target("http://t1/metrics", &[])];
    let opts = RunOptions {
        omit_metadata: true,
        ..RunOptions::default()
    };

    let mut run = CollectionRun::new(targets, client, opts);
    run.collect_targets().await.unwrap();
    let doc = run.render().await;
    assert_eq!(doc, "go_threads 5\n");
}

#[tokio::test]
async fn sequential_mode_collects_everything() {
    let client = StubClient::new(&[
        ("http://t1/metrics", "first_metric 1\n"),
        ("http://t2/metrics", "second_metric 2\n"),
    ]);
    let targets = vec![
        target("http://t1/metrics", &[]),
        target("http://t2/metrics", &[]),
    ];
    let opts = RunOptions {
        parallel: false,
        ..RunOptions::default()
    };
    assert_eq!(opts.effective_fetch_pool(), 1);

    let mut run = CollectionRun::new(targets, client, opts);
    run.collect_targets().await.unwrap();
    let doc = run.render().await;
    assert_eq!(doc, "first_metric 1\nsecond_metric 2\n");
}
