//! Ranked-auction bids

use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// On-chain identity of a bid, taken from the bid event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BidId(pub U256);

impl std::fmt::Display for BidId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A user's bid as reflected by the off-chain index.
///
/// Created once the bid transaction confirms and syncs; mutated only by a
/// top-up (new slot, increased value) or removal; immutable once settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    /// Authoritative bid identity
    pub id: BidId,
    /// Address that placed the bid
    pub bidder: Address,
    /// Rung on the bid-value ladder
    pub slot_index: u16,
    /// Bid value in the auction currency's smallest unit
    pub value: U256,
    /// Rank among live bids, when the index reports one
    pub rank: Option<u32>,
    /// Unix seconds the bid was placed
    pub time_of_bid: u64,
    /// The bid was outbid and removed
    pub removed: bool,
    /// The bid has been settled (minted or refunded)
    pub settled: bool,
}

impl Bid {
    /// Whether the bid can still be topped up.
    pub fn is_active(&self) -> bool {
        !self.removed && !self.settled
    }
}
