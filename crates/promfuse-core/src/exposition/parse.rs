//! Exposition text parsing (panic-free).
//!
//! Processing is strictly line-oriented:
//! - `# HELP <name> ...` / `# TYPE <name> ...` lines populate response-local
//!   metadata tables keyed by metric name, storing the full line text.
//! - Any other non-blank line is matched against the sample grammar
//!   `name{label="value",...} value`. A line that does not match is logged
//!   and skipped; it never aborts the rest of the response.
//! - After the scan, each record's metadata back-fills from the tables by
//!   exact name match. Tables are response-local: metadata is never shared
//!   or reconciled across targets.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{PromFuseError, Result};
use crate::exposition::MetricRecord;

/// Sample line grammar: `name`, optional `{...}` label block, float value.
pub const SAMPLE_RE_STR: &str = r#"^(\w+)(?:\{(.+?)\})? ([0-9.eE+-]+)"#;
/// One `key="value"` pair inside a label block.
pub const LABEL_RE_STR: &str = r#"^(\w+)="(.*)"$"#;
/// `# HELP <name> <text>` metadata line.
pub const HELP_RE_STR: &str = r#"^# HELP (\w+) .+"#;
/// `# TYPE <name> <text>` metadata line.
pub const TYPE_RE_STR: &str = r#"^# TYPE (\w+) .+"#;

// Pattern literals are fixed at compile time; construction cannot fail.
#[allow(clippy::expect_used)]
static SAMPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SAMPLE_RE_STR).expect("static sample pattern"));
#[allow(clippy::expect_used)]
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(LABEL_RE_STR).expect("static label pattern"));
#[allow(clippy::expect_used)]
static HELP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HELP_RE_STR).expect("static help pattern"));
#[allow(clippy::expect_used)]
static TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TYPE_RE_STR).expect("static type pattern"));

/// Per-response parse options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Skip `#` lines outright without populating the metadata tables.
    pub omit_metadata: bool,
    /// Populate `sort_key` on each record (only needed when the run sorts).
    pub with_sort_key: bool,
}

/// Parse one raw response body into ordered records.
///
/// `extra_labels` are prepended to every record's label list before the
/// labels parsed from the line, in the order given.
pub fn parse_body(
    body: &str,
    extra_labels: &[(String, String)],
    opts: ParseOptions,
) -> Vec<MetricRecord> {
    let mut help: HashMap<String, String> = HashMap::new();
    let mut types: HashMap<String, String> = HashMap::new();
    let mut records = Vec::new();

    for line in body.lines() {
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') {
            if opts.omit_metadata {
                continue;
            }
            if let Some(caps) = HELP_RE.captures(line) {
                if let Some(name) = caps.get(1) {
                    help.insert(name.as_str().to_string(), line.to_string());
                }
            } else if let Some(caps) = TYPE_RE.captures(line) {
                if let Some(name) = caps.get(1) {
                    types.insert(name.as_str().to_string(), line.to_string());
                }
            }
            // Other comment lines carry no metadata and are dropped.
            continue;
        }
        match parse_sample(line, extra_labels, opts.with_sort_key) {
            Ok(record) => records.push(record),
            Err(err) => warn!(error = %err, "skipping unparsable line"),
        }
    }

    if !opts.omit_metadata {
        for record in &mut records {
            if let Some(h) = help.get(&record.name) {
                record.help.clone_from(h);
            }
            if let Some(t) = types.get(&record.name) {
                record.type_meta.clone_from(t);
            }
        }
    }

    records
}

/// Parse one sample line. Fails only for this line; the caller skips it.
fn parse_sample(
    line: &str,
    extra_labels: &[(String, String)],
    with_sort_key: bool,
) -> Result<MetricRecord> {
    let caps = SAMPLE_RE
        .captures(line)
        .ok_or_else(|| PromFuseError::ParseLine(line.to_string()))?;
    let (Some(name), Some(value_text)) = (caps.get(1), caps.get(3)) else {
        return Err(PromFuseError::ParseLine(line.to_string()));
    };

    let mut labels: Vec<(String, String)> = extra_labels.to_vec();
    if let Some(block) = caps.get(2) {
        for pair in block.as_str().split(',') {
            match LABEL_RE.captures(pair) {
                Some(caps) => {
                    if let (Some(k), Some(v)) = (caps.get(1), caps.get(2)) {
                        labels.push((k.as_str().to_string(), v.as_str().to_string()));
                    }
                }
                None => debug!(%pair, %line, "label pair did not match grammar"),
            }
        }
    }

    let value: f64 = value_text.as_str().parse().map_err(|e| {
        PromFuseError::ParseLine(format!("bad value in `{line}`: {e}"))
    })?;

    let mut record = MetricRecord {
        name: name.as_str().to_string(),
        labels,
        value,
        ..MetricRecord::default()
    };
    if with_sort_key {
        record.sort_key = record.build_sort_key();
    }
    Ok(record)
}
