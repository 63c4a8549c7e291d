use std::path::PathBuf;

use thiserror::Error;

/// Why a set of filter criteria was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriteriaError {
    #[error("class '{0}' does not occur in the dataset")]
    UnknownClass(String),
    #[error("max price must be a finite non-negative number, got {0}")]
    InvalidMaxPrice(f64),
}

#[derive(Debug, Error)]
pub enum DashError {
    /// The dataset could not be read or parsed. Fatal at startup.
    #[error("flight data unavailable at {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },
    /// Criteria rejected; the previous view stays in place.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(#[from] CriteriaError),
}

pub type Result<T> = std::result::Result<T, DashError>;
