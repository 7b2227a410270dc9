//! Error types for the state-machine runtime

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the runtime primitives.
///
/// Clone-able on purpose: orchestrators store the rendered message in their
/// context when transitioning to an error state, and snapshots of that
/// context must remain cheap to take.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    /// A deadline-bounded poll ran out of wall-clock time.
    #[error("polling operation `{operation}` timed out after {timeout:?}")]
    PollTimeout {
        /// Name of the polling operation that timed out
        operation: &'static str,
        /// Deadline that was exceeded
        timeout: Duration,
    },

    /// An attempt-bounded poll used up its retry budget.
    #[error("polling operation `{operation}` exhausted {attempts} attempts")]
    RetriesExhausted {
        /// Name of the polling operation that gave up
        operation: &'static str,
        /// Number of attempts that were made
        attempts: u32,
    },

    /// A task failed with an already-normalized message.
    #[error("{0}")]
    Task(String),
}

impl MachineError {
    /// Normalize an arbitrary error into a stored task failure.
    pub fn task(err: impl std::fmt::Display) -> Self {
        MachineError::Task(err.to_string())
    }
}
