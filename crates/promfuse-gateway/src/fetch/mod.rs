//! Target fetching through a shared, pre-configured HTTP client.
//!
//! The client is built once per process with explicit connection-pool limits
//! and injected behind the [`ScrapeClient`] trait so tests can substitute a
//! deterministic stub. Admission control for outbound connections lives in
//! the coordinator (a counting semaphore), not here: this module performs
//! exactly one GET per call and always drains or drops the response body.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use promfuse_core::error::{PromFuseError, Result};

use crate::config::{ScrapeSection, TargetConfig};

/// One configured scrape target.
#[derive(Debug, Clone)]
pub struct Target {
    /// Optional display name, used only in logs.
    pub name: Option<String>,
    pub url: String,
    /// Static labels prepended to every metric parsed from this target.
    pub extra_labels: Vec<(String, String)>,
}

impl Target {
    pub fn from_config(cfg: &TargetConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            url: cfg.url.clone(),
            extra_labels: cfg.extra_labels(),
        }
    }
}

/// Successful fetch: the raw body plus the target's extra labels, ready for
/// the parse stage.
#[derive(Debug)]
pub struct FetchBody {
    pub body: Bytes,
    pub extra_labels: Vec<(String, String)>,
}

/// Substitutable HTTP GET surface.
///
/// Production uses [`HttpScrapeClient`]; tests drive the pipeline through
/// stub implementations without opening sockets.
#[async_trait]
pub trait ScrapeClient: Send + Sync {
    /// Fetch the full response body for one target URL.
    async fn get_body(&self, url: &str) -> Result<Bytes>;
}

/// reqwest-backed client. Safe for concurrent use; connection reuse and
/// timeouts are fixed at construction.
pub struct HttpScrapeClient {
    client: reqwest::Client,
}

impl HttpScrapeClient {
    pub fn from_config(cfg: &ScrapeSection) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .pool_max_idle_per_host(cfg.max_idle_connections)
            .pool_idle_timeout(Duration::from_millis(cfg.idle_timeout_ms));
        if cfg.disable_compression {
            builder = builder.no_gzip();
        }
        let client = builder
            .build()
            .map_err(|e| PromFuseError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ScrapeClient for HttpScrapeClient {
    async fn get_body(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await.map_err(|e| {
            PromFuseError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(PromFuseError::FetchFailed {
                url: url.to_string(),
                reason: format!("unexpected status {status}"),
            });
        }

        response.bytes().await.map_err(|e| PromFuseError::FetchFailed {
            url: url.to_string(),
            reason: format!("reading body: {e}"),
        })
    }
}
