//! Exposition format modules (record model, parsing, rendering).
//!
//! The text exposition format is both consumed and produced here:
//! - `parse`: one scraped response body -> ordered `MetricRecord`s.
//! - `render`: records -> sample lines and the final assembled document.
//!
//! All parsers are panic-free: malformed input is reported as
//! `PromFuseError` and skipped line-by-line, keeping a single bad endpoint
//! from poisoning a whole collection run.

pub mod parse;
pub mod render;

/// One parsed sample line of one target's response.
///
/// `labels` is an ordered list, not a map: the target's extra labels come
/// first, then the labels parsed from the line in source order. Duplicate
/// keys are preserved as encountered since order and multiplicity are
/// significant for output fidelity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricRecord {
    /// Metric name.
    pub name: String,
    /// Ordered label pairs (extra labels first, then parsed labels).
    pub labels: Vec<(String, String)>,
    /// Sample value.
    pub value: f64,
    /// Full `# HELP` line from the same response, or empty.
    pub help: String,
    /// Full `# TYPE` line from the same response, or empty.
    pub type_meta: String,
    /// Derived ordering key (name + ordered label block). Only populated
    /// when the run sorts its output.
    pub sort_key: String,
    /// Rendered sample line, populated by the render stage.
    pub rendered: String,
}

impl MetricRecord {
    /// Build the ordering key from the name and the ordered label block.
    pub fn build_sort_key(&self) -> String {
        let mut key = String::with_capacity(self.name.len() + 16);
        key.push_str(&self.name);
        key.push_str(&render::label_block(&self.labels));
        key
    }
}

/// Stable ascending sort by the precomputed `sort_key`.
///
/// This is what makes output byte-deterministic despite concurrent,
/// unordered retrieval. It is also a required precondition for metadata
/// grouping during assembly: grouping relies on identical metric names
/// being contiguous. With sorting disabled, final ordering and grouping
/// are retrieval-order artifacts.
pub fn sort_records(records: &mut [MetricRecord]) {
    records.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
}
