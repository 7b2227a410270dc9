//! Lifecycle notifications emitted to embedding applications
//!
//! This tagged union is the only state the engine pushes synchronously to
//! the outside; everything else is pulled through snapshot queries.

use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

use crate::types::{BidId, TokenId};

/// One lifecycle notification from an orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SaleEvent {
    /// The caller cannot purchase, with a human-readable reason
    Ineligible {
        /// Why the caller is ineligible
        reason: String,
    },
    /// A purchase transaction was accepted by the wallet and broadcast
    PurchaseInitiated {
        /// Transaction hash of the purchase
        tx_hash: H256,
        /// Chain the transaction was sent on
        chain_id: u64,
    },
    /// Waiting for the purchase transaction to confirm
    AwaitingPurchaseConfirmations {
        /// Transaction being confirmed
        tx_hash: H256,
    },
    /// Purchase confirmed; waiting for the index to reflect the token
    AwaitingTokenSync {
        /// Confirmed purchase transaction
        tx_hash: H256,
    },
    /// The minted token is visible in the index
    TokenReady {
        /// The minted token
        token: TokenId,
    },
    /// A bid transaction was accepted by the wallet and broadcast
    BidSubmitted {
        /// Transaction hash of the bid
        tx_hash: H256,
    },
    /// The bid transaction confirmed on-chain
    BidConfirmed {
        /// Authoritative bid identity from the on-chain event
        bid_id: BidId,
        /// Slot the bid landed on
        slot_index: u16,
    },
    /// The off-chain index reflects the confirmed bid
    BidSynced {
        /// The synced bid
        bid_id: BidId,
    },
    /// Excess settlement funds were reclaimed
    SettlementClaimed {
        /// Minter the funds were held by
        minter: Address,
        /// Bidder the funds were returned to
        bidder: Address,
        /// Amount reclaimed
        excess: U256,
    },
    /// An orchestrator reached its error state
    Error {
        /// Normalized failure message
        message: String,
    },
}
