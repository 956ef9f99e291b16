use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::orchestrator::PowerFlowOrchestrator;
use crate::results::{HeaderNormalizer, TableReshaper};
use crate::runner::{ComputationRunner, HttpRunner};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PowerFlowOrchestrator>,
    pub default_rid: Arc<str>,
}

impl AppState {
    /// Wire the HTTP runner from configuration
    pub fn new(cfg: &Config) -> Result<Self> {
        let runner = HttpRunner::new(
            &cfg.runner.base_url,
            &cfg.runner.token,
            Duration::from_secs(cfg.runner.http_timeout_secs),
        )?;
        info!(base_url = %cfg.runner.base_url, "runner client ready");
        Ok(Self::with_runner(cfg, Arc::new(runner)))
    }

    pub fn with_runner(cfg: &Config, runner: Arc<dyn ComputationRunner>) -> Self {
        let aliases = cfg.headers.header_aliases();
        info!(aliases = aliases.len(), "header aliases loaded");
        let reshaper = TableReshaper::new(HeaderNormalizer::new(aliases));
        let orchestrator =
            PowerFlowOrchestrator::new(runner, reshaper, cfg.polling.settings());
        Self {
            orchestrator: Arc::new(orchestrator),
            default_rid: Arc::from(cfg.models.default_rid.as_str()),
        }
    }
}
