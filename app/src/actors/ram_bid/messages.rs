//! Messages and state of the ranked-auction bid orchestrator

use actix::prelude::*;
use ethers_core::types::{H256, U256};
use serde::{Deserialize, Serialize};

use crate::clients::BidEvent;
use crate::types::{Bid, BidId};

/// Which action the caller chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidAction {
    /// Place a fresh bid
    NewBid,
    /// Raise an existing bid to a higher slot
    TopUp,
}

/// Choose between placing a new bid and topping one up.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct ChooseBidAction {
    /// The chosen action
    pub action: BidAction,
}

/// Choose which of the caller's bids to top up.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct ChooseTopUpBid {
    /// Bid being raised
    pub bid_id: BidId,
}

/// Submit the bid at `slot_index`. Rejected by guard when the slot is
/// below the auction minimum or does not raise the topped-up bid.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct SubmitBid {
    /// Slot the bid should land on
    pub slot_index: u16,
}

/// Clear bid-attempt context (keeping the user's bid list) and refetch.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct ResetBid;

/// Query the orchestrator's serializable snapshot.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "RamBidSnapshot")]
pub struct GetRamBidSnapshot;

/// Ranked-auction orchestrator states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "camelCase")]
pub enum RamBidState {
    /// Loading the caller's existing bids from the index
    FetchingUserBids,
    /// Terminal: the auction sold out and is no longer live
    SaleComplete,
    /// Interactive: new bid or top-up?
    AwaitingBidActionChoice,
    /// Interactive: which bid to top up?
    AwaitingTopUpBidChoice,
    /// Interactive: which slot to bid at?
    AwaitingBidAmount,
    /// Bid transaction being submitted
    InitiatingBidTx,
    /// Waiting for the bid transaction to confirm
    ConfirmingBidTx,
    /// Waiting for the index to reflect the confirmed bid
    AwaitingSync,
    /// The bid is confirmed and indexed
    BidSuccess,
    /// Terminal-ish: hard failure; reset to retry
    Error,
}

/// Bid-attempt context, cleared by `ResetBid`. The user's bid list lives
/// outside this struct and survives resets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidAttempt {
    /// Chosen action
    pub action: Option<BidAction>,
    /// Bid being topped up, for the top-up path
    pub top_up_of: Option<BidId>,
    /// Chosen slot
    pub slot_index: Option<u16>,
    /// Value of the chosen slot
    pub value: Option<U256>,
    /// Submitted bid transaction
    pub tx_hash: Option<H256>,
    /// Authoritative bid event from the confirmed transaction
    pub confirmed: Option<BidEvent>,
    /// Index sync attempts consumed so far
    pub sync_attempts: u32,
    /// Normalized failure message, when in the error state
    pub error: Option<String>,
}

/// Serializable snapshot of the bid orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, MessageResponse)]
pub struct RamBidSnapshot {
    /// Current state
    pub state: RamBidState,
    /// The caller's bids as last fetched
    pub user_bids: Vec<Bid>,
    /// Bid-attempt context
    pub attempt: BidAttempt,
}
