//! Engine-wide error type
//!
//! Raw errors never cross an actor boundary: at every state boundary a
//! failure is either recovered (user rejection) or rendered through
//! [`EngineError::message`] into a plain string stored in the actor's
//! context.

use thiserror::Error;

use crate::clients::ClientError;
use machine::MachineError;

/// Failures surfaced by orchestrator invoked tasks.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Collaborator failure, already classified
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Runtime polling failure (timeout or exhausted retries)
    #[error(transparent)]
    Machine(#[from] MachineError),

    /// No wallet account is connected
    #[error("no wallet account connected")]
    NoAccount,

    /// The project has no minter attached
    #[error("project has no minter configured")]
    NoMinter,

    /// The indexer reported a minter family this engine does not drive
    #[error("minter type `{0}` is not supported")]
    UnsupportedMinter(String),

    /// Minter dispatch was invoked without the eligibility data it needs
    #[error("eligibility data is missing for the selected minter")]
    IncompleteEligibility,

    /// A confirmed purchase receipt carried no mint event
    #[error("mint event missing from purchase receipt")]
    MissingMintEvent,

    /// A confirmed bid receipt carried no bid event
    #[error("bid event missing from transaction receipt")]
    MissingBidEvent,
}

impl EngineError {
    /// Normalized short message for context storage and notifications.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether this failure is the user declining a wallet prompt.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, EngineError::Client(ClientError::UserRejected))
    }
}
