//! Messages and state of the purchase trackers

use actix::prelude::*;
use ethers_core::types::H256;
use serde::{Deserialize, Serialize};

use crate::types::{ProjectRef, TokenId};

/// Ask the tracking manager to follow a freshly submitted purchase.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct TrackPurchase {
    /// Project the purchase was made on
    pub project: ProjectRef,
    /// The purchase transaction
    pub tx_hash: H256,
}

/// Terminal report from a tracker to its manager.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct TrackingFinished {
    /// The tracked transaction
    pub tx_hash: H256,
    /// How the tracking ended
    pub outcome: TrackingOutcome,
}

/// How a tracked purchase resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackingOutcome {
    /// The minted token is visible in the index
    TokenReady(TokenId),
    /// The tracking failed, with a normalized message
    Failed(String),
}

/// Query a tracker's snapshot.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "TrackingSnapshot")]
pub struct GetTrackingSnapshot;

/// Query the manager's set of tracked transactions.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "ActiveTracking")]
pub struct GetActiveTracking;

/// Currently tracked transaction hashes.
#[derive(Debug, Clone, MessageResponse)]
pub struct ActiveTracking(pub Vec<H256>);

/// Tracker states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "camelCase")]
pub enum TrackingState {
    /// Waiting for the purchase transaction to confirm
    AwaitingConfirmation,
    /// Confirmed; waiting for the index to reflect the token
    AwaitingTokenSync,
    /// Terminal: the token record exists
    TokenReady,
    /// Terminal: revert, missing mint event, or indexing gave out
    Error,
}

/// Serializable snapshot of one tracker.
#[derive(Debug, Clone, Serialize, Deserialize, MessageResponse)]
pub struct TrackingSnapshot {
    /// Current state
    pub state: TrackingState,
    /// Tracked transaction
    pub tx_hash: H256,
    /// Token derived from the mint event, once confirmed
    pub token: Option<TokenId>,
    /// Index sync attempts consumed so far
    pub sync_attempts: u32,
    /// Failure message, when in the error state
    pub error: Option<String>,
}
