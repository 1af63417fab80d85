use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Fatal failures of a reconciliation run. None of them are retried.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode products response (status {status}): {source}\nbody: {body}")]
    Decode {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("reference data not found: {}", path.display())]
    ResourceNotFound { path: PathBuf },

    #[error("reference data format error: {0}")]
    Format(String),

    #[error("cannot pick the most expensive product from an empty list")]
    EmptyInput,
}

impl From<wreq::Error> for ReconcileError {
    fn from(value: wreq::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<PolarsError> for ReconcileError {
    fn from(value: PolarsError) -> Self {
        Self::Format(value.to_string())
    }
}
