//! Messages and state of the settlement actors

use actix::prelude::*;
use ethers_core::types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::types::ProjectRef;

/// Re-fetch the bidder's receipts and reconcile the child set.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct RefreshReceipts {
    /// Project whose auction settled
    pub project: ProjectRef,
    /// Bidder whose receipts to reconcile
    pub bidder: Address,
}

/// Ask the manager to start the claim for one receipt.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct ClaimReceipt {
    /// Registry key of the receipt to claim
    pub key: String,
}

/// Start the claim on a claim orchestrator.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct ClaimExcess;

/// Child-to-manager signal bracketing an in-flight claim transaction.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct ClaimBusy {
    /// Registry key of the claiming child
    pub key: String,
    /// Whether a claim transaction is currently in flight
    pub busy: bool,
}

/// Terminal claim report from a child to its manager.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct ClaimFinished {
    /// Registry key of the finished child
    pub key: String,
    /// Claim transaction, when the claim confirmed
    pub tx_hash: Option<H256>,
}

/// Query a claim orchestrator's snapshot.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "ClaimSnapshot")]
pub struct GetClaimSnapshot;

/// Query the manager's registry keys.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "ActiveClaims")]
pub struct GetActiveClaims;

/// Registry keys of the currently spawned claim orchestrators.
#[derive(Debug, Clone, MessageResponse)]
pub struct ActiveClaims(pub Vec<String>);

/// Claim orchestrator states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "camelCase")]
pub enum ClaimState {
    /// Waiting for the caller to start the claim
    Idle,
    /// Claim transaction in flight
    Claiming,
    /// Terminal: the claim confirmed
    Claimed,
    /// Terminal-ish: the claim failed
    Error,
}

/// Serializable snapshot of one claim orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, MessageResponse)]
pub struct ClaimSnapshot {
    /// Current state
    pub state: ClaimState,
    /// Claim transaction, once submitted
    pub tx_hash: Option<H256>,
    /// Failure message, when in the error state
    pub error: Option<String>,
}
