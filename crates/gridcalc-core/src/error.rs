//! Error types for gridcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gridcalc-core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Position is not in A1 form (letters followed by digits)
    #[error("Invalid cell position: {0}")]
    InvalidPosition(String),

    /// Column letters or row number do not fit the coordinate types
    #[error("Cell position out of range: {0}")]
    PositionOutOfRange(String),

    /// Range corners that cannot be expanded back into the keys they were written as
    #[error("Invalid range {range}: {reason}")]
    InvalidRange {
        range: String,
        reason: &'static str,
    },
}
