//! Result tables produced by the remote power flow runner and the row-oriented
//! shapes served to callers.

pub mod checks;
pub mod export;
pub mod headers;
pub mod reshape;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{PowerFlowError, PowerFlowResult};

pub use checks::{branch_checks, BranchCheck};
pub use export::{csv_filename, to_csv};
pub use headers::{strip_markup, HeaderAliases, HeaderNormalizer};
pub use reshape::TableReshaper;

/// A single cell value as reported by the runner (number, string, bool or null)
pub type Scalar = serde_json::Value;

/// One display row keyed by clean header, in header order
pub type RowRecord = serde_json::Map<String, Scalar>;

/// One column of a runner result table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawColumn {
    /// Machine label, possibly decorated with inline markup
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Vec<Scalar>,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, data: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            data,
        }
    }
}

/// Column-major table as produced by the runner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawColumnTable {
    pub columns: Vec<RawColumn>,
}

impl RawColumnTable {
    pub fn new(columns: Vec<RawColumn>) -> Self {
        Self { columns }
    }

    /// Row count, taken from the first column
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    /// All columns must carry one value per row index.
    pub fn validate(&self) -> PowerFlowResult<()> {
        let expected = self.row_count();
        match self.columns.iter().find(|c| c.data.len() != expected) {
            Some(col) => Err(PowerFlowError::Computation(format!(
                "data-integrity error in result table: column '{}' has {} values, expected {}",
                col.name,
                col.data.len(),
                expected
            ))),
            None => Ok(()),
        }
    }
}

/// Row-oriented table with a shared ordered header list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub headers: Vec<String>,
    pub rows: Vec<RowRecord>,
}

impl ResultTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Log line surfaced verbatim from the runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub level: String,
    pub content: String,
}

impl LogLine {
    pub fn new(level: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            content: content.into(),
        }
    }
}

/// The two tables a power flow run yields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Buses,
    Branches,
}
