//! Error taxonomy for the planner.
//!
//! Only [`PlannerError`] ever reaches a caller. Provider and cache failures
//! are recovered where they happen and show up as fallback tags instead.

use thiserror::Error;

/// Structural problems with caller input. Fatal to one cluster.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    #[error("cluster has no locations")]
    EmptyCluster,
    #[error("invalid coordinate at index {index}: ({lon}, {lat})")]
    InvalidCoordinate { index: usize, lon: f64, lat: f64 },
    #[error("matrix is not square: row {row} has {len} entries, expected {expected}")]
    NonSquareMatrix { row: usize, len: usize, expected: usize },
    #[error("matrix entry ({row}, {col}) is not a finite non-negative value: {value}")]
    InvalidMatrixValue { row: usize, col: usize, value: f64 },
    #[error("duration matrix is {durations}x{durations}, distance matrix is {distances}x{distances}")]
    MismatchedMatrices { distances: usize, durations: usize },
    #[error("route index {index} is out of range for {len} locations")]
    RouteIndexOutOfRange { index: usize, len: usize },
}

/// Failures talking to a remote routing provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned status {status}")]
    Status { status: u16 },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ProviderError::Status {
                status: status.as_u16(),
            },
            None if err.is_decode() => ProviderError::Malformed(err.to_string()),
            None => ProviderError::Transport(err.to_string()),
        }
    }
}

/// Disk or codec failures inside the segment cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] serde_json::Error),
}
