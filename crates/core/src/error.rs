//! Core error type.

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by model mutations and configuration parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A date string that is not `YYYY-MM-DD`
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Window size outside the accepted range
    #[error("Window size {value} out of range [{min}, {max}]")]
    WindowOutOfRange {
        /// Rejected value
        value: u32,
        /// Lower bound (inclusive)
        min: u32,
        /// Upper bound (inclusive)
        max: u32,
    },

    /// Status label not recognised
    #[error("Unknown status '{0}'")]
    UnknownStatus(String),

    /// Chart mode not recognised
    #[error("Unknown chart mode '{0}', expected cumulative or incremental")]
    UnknownChartMode(String),

    /// Reading minus offset does not fit in an `i64`
    #[error("Reading {reading} with offset {offset} is out of range")]
    ValueOverflow {
        /// Registered reading
        reading: i64,
        /// Offset subtracted from it
        offset: i64,
    },

    /// Sub-task lookup failed
    #[error("Sub-task '{0}' not found")]
    SubTaskNotFound(String),
}
