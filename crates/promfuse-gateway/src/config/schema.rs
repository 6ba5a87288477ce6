use serde::Deserialize;

use promfuse_core::error::{PromFuseError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub scrape: ScrapeSection,

    #[serde(default)]
    pub collect: CollectSection,

    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PromFuseError::BadConfig(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        if self.targets.is_empty() {
            return Err(PromFuseError::BadConfig("targets must not be empty".into()));
        }

        self.gateway.validate()?;
        self.scrape.validate()?;
        self.collect.validate()?;
        for target in &self.targets {
            target.validate()?;
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.is_empty() {
            return Err(PromFuseError::BadConfig(
                "gateway.listen must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:9393".into()
}

/// Tuning for the shared outbound HTTP client. The client is process-scoped:
/// built once at startup and reused by every collection run.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrapeSection {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: usize,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_disable_compression")]
    pub disable_compression: bool,
}

impl Default for ScrapeSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_idle_connections: default_max_idle_connections(),
            idle_timeout_ms: default_idle_timeout_ms(),
            disable_compression: default_disable_compression(),
        }
    }
}

impl ScrapeSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=300_000).contains(&self.timeout_ms) {
            return Err(PromFuseError::BadConfig(
                "scrape.timeout_ms must be between 100 and 300000".into(),
            ));
        }
        if self.max_idle_connections == 0 {
            return Err(PromFuseError::BadConfig(
                "scrape.max_idle_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}
fn default_max_idle_connections() -> usize {
    100
}
fn default_idle_timeout_ms() -> u64 {
    30_000
}
fn default_disable_compression() -> bool {
    true
}

/// Per-run collection behavior.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectSection {
    /// Fail the whole run on the first target failure instead of serving
    /// partial results.
    #[serde(default)]
    pub abort_on_failure: bool,

    /// Fetch targets concurrently. When false the worker pool degrades to a
    /// single slot and targets are fetched one at a time.
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Sort merged records for byte-deterministic output. Required for
    /// correct metadata grouping.
    #[serde(default = "default_true")]
    pub sort: bool,

    /// Drop `# HELP` / `# TYPE` lines instead of carrying them through.
    #[serde(default)]
    pub omit_metadata: bool,

    /// Do not log individual target fetch failures.
    #[serde(default)]
    pub suppress_fetch_errors: bool,

    #[serde(default = "default_fetch_pool_size")]
    pub fetch_pool_size: usize,

    #[serde(default = "default_render_pool_size")]
    pub render_pool_size: usize,
}

impl Default for CollectSection {
    fn default() -> Self {
        Self {
            abort_on_failure: false,
            parallel: true,
            sort: true,
            omit_metadata: false,
            suppress_fetch_errors: false,
            fetch_pool_size: default_fetch_pool_size(),
            render_pool_size: default_render_pool_size(),
        }
    }
}

impl CollectSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10_000).contains(&self.fetch_pool_size) {
            return Err(PromFuseError::BadConfig(
                "collect.fetch_pool_size must be between 1 and 10000".into(),
            ));
        }
        if !(1..=10_000).contains(&self.render_pool_size) {
            return Err(PromFuseError::BadConfig(
                "collect.render_pool_size must be between 1 and 10000".into(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
fn default_fetch_pool_size() -> usize {
    100
}
fn default_render_pool_size() -> usize {
    900
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Optional display name, used only in logs.
    #[serde(default)]
    pub name: Option<String>,

    pub url: String,

    /// Static labels attached to every metric from this target, as
    /// `key=value` strings (quotes around the value are stripped). Order is
    /// preserved and significant.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl TargetConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(PromFuseError::BadConfig(format!(
                "target url must be http(s): {}",
                self.url
            )));
        }
        for label in &self.labels {
            if split_label(label).is_none() {
                return Err(PromFuseError::BadConfig(format!(
                    "target label must be key=value: {label}"
                )));
            }
        }
        Ok(())
    }

    /// Configured labels as ordered pairs, quotes stripped from values.
    pub fn extra_labels(&self) -> Vec<(String, String)> {
        self.labels
            .iter()
            .filter_map(|label| split_label(label))
            .collect()
    }
}

fn split_label(label: &str) -> Option<(String, String)> {
    let (key, value) = label.split_once('=')?;
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim_matches('"').to_string()))
}
