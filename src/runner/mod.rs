//! Seam to the remote computation runner that actually solves the power flow.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::results::{LogLine, RawColumnTable, TableKind};

pub use http::HttpRunner;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("model '{0}' not found")]
    ModelNotFound(String),

    #[error("runner rejected the request: {0}")]
    Rejected(String),

    #[error("runner credentials were refused")]
    Unauthorized,

    #[error("runner unreachable: {0}")]
    Transport(String),

    #[error("unexpected runner response: {0}")]
    Decode(String),
}

/// Job profile attached to a model (the first one is the power flow job)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
    #[serde(default)]
    pub args: Value,
}

/// Model as described by the runner, with its configurations and job profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub rid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub configs: Vec<Value>,
    #[serde(default)]
    pub jobs: Vec<JobProfile>,
}

impl ModelDescriptor {
    pub fn default_config(&self) -> Result<&Value, RunnerError> {
        self.configs.first().ok_or_else(|| {
            RunnerError::Rejected(format!("model '{}' has no configuration", self.rid))
        })
    }

    pub fn default_job(&self) -> Result<&JobProfile, RunnerError> {
        self.jobs.first().ok_or_else(|| {
            RunnerError::Rejected(format!("model '{}' has no job profile", self.rid))
        })
    }
}

/// Opaque id of a submitted run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(pub String);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Error,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed | RunState::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunStatus {
    pub fn new(state: RunState) -> Self {
        Self {
            state,
            message: None,
        }
    }
}

/// Log lines from one read plus the cursor for the next one.
///
/// `next_since` counts every raw entry the runner returned, including the ones that
/// were not log lines, so it can run ahead of `lines.len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogPage {
    pub lines: Vec<LogLine>,
    pub next_since: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComputationRunner: Send + Sync {
    async fn fetch_model(&self, rid: &str) -> Result<ModelDescriptor, RunnerError>;

    async fn submit(
        &self,
        model: &ModelDescriptor,
        config: &Value,
        job: &JobProfile,
    ) -> Result<JobHandle, RunnerError>;

    async fn status(&self, job: &JobHandle) -> Result<RunStatus, RunnerError>;

    /// Log entries emitted after the first `since` raw entries
    async fn logs(&self, job: &JobHandle, since: usize) -> Result<LogPage, RunnerError>;

    /// `None` when the runner produced no table of that kind
    async fn result_table(
        &self,
        job: &JobHandle,
        kind: TableKind,
    ) -> Result<Option<RawColumnTable>, RunnerError>;
}
