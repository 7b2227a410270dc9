//! Messages and state of the purchase orchestrator

use actix::prelude::*;
use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::actors::purchase::eligibility::EligibilityData;
use crate::actors::tracking::TrackingManagerActor;

/// Start a purchase attempt toward `to` (defaults to the wallet account).
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct InitiatePurchase {
    /// Recipient of the minted token, when not the wallet itself
    pub to: Option<Address>,
}

/// Approve the minter to spend `amount` of the ERC-20 sale currency.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct ApproveSpend {
    /// Approval amount; must cover the intended spend
    pub amount: U256,
}

/// Clear attempt-scoped context and restart from the eligibility check.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct ResetPurchase;

/// Point the orchestrator at the (possibly absent) tracking manager.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct TrackingAvailability {
    /// Tracking manager to forward initiated purchases to
    pub tracking: Option<Addr<TrackingManagerActor>>,
}

/// Query the orchestrator's serializable snapshot.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "PurchaseSnapshot")]
pub struct GetPurchaseSnapshot;

/// Purchase orchestrator states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "camelCase")]
pub enum PurchaseState {
    /// Running the minter-specific eligibility check
    GettingEligibility,
    /// Terminal-ish: the caller cannot purchase; reset to re-check
    UserIneligible,
    /// Local guard loop until the sale window opens
    WaitingForStart,
    /// Interactive: waiting for the caller to initiate
    ReadyForPurchase,
    /// Interactive: waiting for an ERC-20 approval amount
    AwaitingErc20ApprovalAmount,
    /// Approval transaction in flight
    ApprovingErc20,
    /// Purchase transaction in flight
    InitiatingPurchase,
    /// Purchase submitted; tracking handed off
    PurchaseInitiated,
    /// Terminal-ish: hard failure; reset to retry
    Error,
}

/// Attempt-scoped context, cleared wholesale by `ResetPurchase`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptContext {
    /// Chosen token recipient
    pub recipient: Option<Address>,
    /// Minter-specific eligibility data
    pub eligibility: Option<EligibilityData>,
    /// Why the caller is ineligible, when they are
    pub ineligibility_reason: Option<String>,
    /// ERC-20 approval amount chosen by the caller
    pub approval_amount: Option<U256>,
    /// Submitted purchase transaction
    pub tx_hash: Option<H256>,
    /// Normalized failure message, when in the error state
    pub error: Option<String>,
}

/// Serializable snapshot of the purchase orchestrator. Client handles are
/// excluded; re-inject them through the actor constructor on hydration.
#[derive(Debug, Clone, Serialize, Deserialize, MessageResponse)]
pub struct PurchaseSnapshot {
    /// Current state
    pub state: PurchaseState,
    /// Attempt-scoped context
    pub attempt: AttemptContext,
}
