//! Orchestration errors.

use thiserror::Error;

/// Failures of the orchestrator itself.
///
/// Stage-level failures never show up here; they are recorded as statuses
/// in the statistics record.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The process-wide orchestrator was requested before a driver was
    /// supplied.
    #[error("accessing an uninitialized orchestrator: no driver was ever supplied")]
    Configuration,

    /// A filter pattern did not compile. The previous filter is kept.
    #[error("invalid test filter `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The driver could not produce its list of tests.
    #[error("could not enumerate tests: {reason}")]
    Introspection { reason: String },
}
