//! Shared application state for the promfuse gateway.
//!
//! Holds the parsed config, the converted target list, the per-run options,
//! and the process-scoped scrape client. The client sits behind the
//! `ScrapeClient` trait so tests can build state around a stub.

use std::sync::Arc;

use promfuse_core::error::Result;

use crate::collect::RunOptions;
use crate::config::GatewayConfig;
use crate::fetch::{HttpScrapeClient, ScrapeClient, Target};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    targets: Vec<Target>,
    run_options: RunOptions,
    client: Arc<dyn ScrapeClient>,
}

impl AppState {
    /// Build application state with the production HTTP client.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let client = Arc::new(HttpScrapeClient::from_config(&cfg.scrape)?);
        Self::with_client(cfg, client)
    }

    /// Build application state around an injected scrape client.
    pub fn with_client(cfg: GatewayConfig, client: Arc<dyn ScrapeClient>) -> Result<Self> {
        let targets = cfg.targets.iter().map(Target::from_config).collect();
        let run_options = RunOptions::from_config(&cfg.collect);
        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                targets,
                run_options,
                client,
            }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn targets(&self) -> &[Target] {
        &self.inner.targets
    }

    pub fn run_options(&self) -> &RunOptions {
        &self.inner.run_options
    }

    pub fn client(&self) -> Arc<dyn ScrapeClient> {
        Arc::clone(&self.inner.client)
    }
}
