//! Power flow bridge: runs a power flow on a remote simulation platform and serves
//! its bus and branch tables as row-oriented records or CSV downloads.

pub mod api;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod results;
pub mod runner;
pub mod state;
pub mod telemetry;

pub use error::{PowerFlowError, PowerFlowResult};
pub use orchestrator::{PollSettings, PowerFlowOrchestrator, PowerFlowOutcome};
