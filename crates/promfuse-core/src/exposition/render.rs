//! Exposition text rendering.
//!
//! Rendering is split the same way collection is: per-record sample lines
//! can be produced in any order (the gateway parallelizes them), while the
//! final document walk is a single sequential pass that emits each metric's
//! metadata block exactly once, immediately before its first sample.

use std::fmt::Write;

use crate::exposition::MetricRecord;

/// Render the `{k="v",...}` label block in list order.
///
/// Labels are joined exactly as stored: no re-sorting, no deduplication.
/// Returns an empty string for a record without labels.
pub fn label_block(labels: &[(String, String)]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(labels.len() * 16);
    out.push('{');
    for (i, (key, value)) in labels.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{key}=\"{value}\"");
    }
    out.push('}');
    out
}

/// Render one sample line: `name{k="v",...} value\n`.
pub fn render_line(record: &MetricRecord) -> String {
    format!(
        "{}{} {}\n",
        record.name,
        label_block(&record.labels),
        record.value
    )
}

/// Sequential assembly pass over records in final order.
///
/// Precondition: for correct metadata grouping the records must be sorted
/// (identical names contiguous) and every `rendered` field populated.
/// Whenever the name changes and the record carries metadata, the stored
/// `# HELP` / `# TYPE` lines are emitted as-is before the sample line.
pub fn assemble(records: &[MetricRecord]) -> String {
    let mut out = String::new();
    let mut prev_name = "";
    for record in records {
        if prev_name != record.name && (!record.help.is_empty() || !record.type_meta.is_empty())
        {
            if !record.help.is_empty() {
                out.push_str(&record.help);
                out.push('\n');
            }
            if !record.type_meta.is_empty() {
                out.push_str(&record.type_meta);
                out.push('\n');
            }
        }
        out.push_str(&record.rendered);
        prev_name = &record.name;
    }
    out
}
