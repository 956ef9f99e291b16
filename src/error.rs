use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a power flow invocation
#[derive(Debug, Error)]
pub enum PowerFlowError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("computation failed: {0}")]
    Computation(String),

    #[error("power flow job did not finish within {}s", waited.as_secs())]
    Timeout { waited: Duration },

    #[error("invalid request: {0}")]
    Validation(String),
}

impl PowerFlowError {
    /// Taxonomy name reported to API callers
    pub fn kind(&self) -> &'static str {
        match self {
            PowerFlowError::Configuration(_) => "ConfigurationError",
            PowerFlowError::Computation(_) => "ComputationError",
            PowerFlowError::Timeout { .. } => "TimeoutError",
            PowerFlowError::Validation(_) => "ValidationError",
        }
    }
}

pub type PowerFlowResult<T> = Result<T, PowerFlowError>;
