//! Error types for loading and filtering trip data.
//!
//! Empty results and missing optional columns are not errors; they are
//! recorded in the [`SummaryReport`](crate::stats::report::SummaryReport).

use std::path::PathBuf;
use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no data source for city '{city}' at {path}")]
    DataSourceNotFound { city: String, path: PathBuf },

    #[error("invalid {field} selection '{value}'")]
    InvalidFilterSelection { field: &'static str, value: String },

    #[error("malformed data source {origin}: {reason}")]
    MalformedSource { origin: String, reason: String },

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value '{value}' for {key}")]
    InvalidConfig { key: &'static str, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidFilterSelection {
            field,
            value: value.into(),
        }
    }

    /// Whether the caller can recover by choosing different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DataSourceNotFound { .. } | Self::InvalidFilterSelection { .. }
        )
    }
}
