//! Submit a power flow job to the runner, wait for it and reshape its tables.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::{PowerFlowError, PowerFlowResult};
use crate::results::{LogLine, ResultTable, TableKind, TableReshaper};
use crate::runner::{ComputationRunner, JobHandle, RunState, RunnerError};

/// Polling cadence and the overall bound on one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(300),
            timeout: Duration::from_secs(180),
        }
    }
}

/// Completed power flow: both tables plus the runner's log lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerFlowOutcome {
    pub rid: String,
    pub buses: ResultTable,
    pub branches: ResultTable,
    pub logs: Vec<LogLine>,
}

/// Rids look like `model/<owner>/<key>`.
pub fn validate_rid(rid: &str) -> PowerFlowResult<()> {
    let segments: Vec<&str> = rid.split('/').collect();
    let well_formed = segments.len() == 3
        && segments
            .iter()
            .all(|s| !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c.is_control()));
    if well_formed {
        Ok(())
    } else {
        Err(PowerFlowError::Configuration(format!(
            "malformed model identifier '{rid}', expected <kind>/<owner>/<key>"
        )))
    }
}

fn computation(err: RunnerError) -> PowerFlowError {
    PowerFlowError::Computation(err.to_string())
}

pub struct PowerFlowOrchestrator {
    runner: Arc<dyn ComputationRunner>,
    reshaper: TableReshaper,
    poll: PollSettings,
}

impl PowerFlowOrchestrator {
    pub fn new(
        runner: Arc<dyn ComputationRunner>,
        reshaper: TableReshaper,
        poll: PollSettings,
    ) -> Self {
        Self {
            runner,
            reshaper,
            poll,
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        self.poll
    }

    /// Run one power flow for `rid`.
    ///
    /// Either both tables are returned or an error is; dropping the future stops
    /// polling but leaves the remote job running.
    pub async fn run_power_flow(&self, rid: &str) -> PowerFlowResult<PowerFlowOutcome> {
        validate_rid(rid)?;

        let invocation = Uuid::new_v4();
        let span = info_span!("power_flow", %invocation, rid);
        let started = Instant::now();

        let result = tokio::time::timeout(self.poll.timeout, self.execute(rid))
            .instrument(span.clone())
            .await;

        span.in_scope(|| match result {
            Ok(Ok(outcome)) => {
                info!(
                    buses = outcome.buses.row_count(),
                    branches = outcome.branches.row_count(),
                    logs = outcome.logs.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "power flow completed"
                );
                Ok(outcome)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "power flow failed");
                Err(e)
            }
            Err(_) => {
                warn!(timeout_secs = self.poll.timeout.as_secs(), "power flow timed out");
                Err(PowerFlowError::Timeout {
                    waited: self.poll.timeout,
                })
            }
        })
    }

    async fn execute(&self, rid: &str) -> PowerFlowResult<PowerFlowOutcome> {
        let model = self.runner.fetch_model(rid).await.map_err(computation)?;
        let config = model.default_config().map_err(computation)?;
        let job = model.default_job().map_err(computation)?;

        let handle = self
            .runner
            .submit(&model, config, job)
            .await
            .map_err(computation)?;
        info!(job = %handle, profile = %job.name, "power flow job submitted");

        let logs = self.wait_for_completion(&handle).await?;

        let (buses, branches) = tokio::try_join!(
            self.fetch_table(&handle, TableKind::Buses),
            self.fetch_table(&handle, TableKind::Branches),
        )?;

        Ok(PowerFlowOutcome {
            rid: rid.to_string(),
            buses,
            branches,
            logs,
        })
    }

    /// Poll until a terminal state, collecting new log lines after each status read.
    async fn wait_for_completion(&self, handle: &JobHandle) -> PowerFlowResult<Vec<LogLine>> {
        let mut logs: Vec<LogLine> = Vec::new();
        let mut cursor = 0;
        let mut ticker = tokio::time::interval(self.poll.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let status = self.runner.status(handle).await.map_err(computation)?;
            let page = self.runner.logs(handle, cursor).await.map_err(computation)?;
            cursor = page.next_since.max(cursor);
            logs.extend(page.lines);
            debug!(
                job = %handle,
                state = %status.state,
                logs = logs.len(),
                cursor,
                "polled job status"
            );

            if !status.state.is_terminal() {
                continue;
            }
            if status.state == RunState::Succeeded {
                return Ok(logs);
            }
            let reason = status.message.or_else(|| {
                logs.iter()
                    .rev()
                    .find(|l| l.level == "error")
                    .map(|l| l.content.clone())
            });
            return Err(PowerFlowError::Computation(match reason {
                Some(reason) => format!("power flow job {} {}: {reason}", handle, status.state),
                None => "power flow job failed".to_string(),
            }));
        }
    }

    async fn fetch_table(
        &self,
        handle: &JobHandle,
        kind: TableKind,
    ) -> PowerFlowResult<ResultTable> {
        let raw = self
            .runner
            .result_table(handle, kind)
            .await
            .map_err(computation)?;
        match raw {
            Some(raw) => {
                raw.validate()?;
                Ok(self.reshaper.reshape(&raw))
            }
            None => Ok(ResultTable::empty()),
        }
    }
}
