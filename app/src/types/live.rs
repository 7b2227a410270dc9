//! Volatile, timer-refreshed sale state

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// Auction-window fields read from a ranked-auction minter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RamAuctionDetails {
    /// Unix seconds at which bidding opens
    pub auction_start: u64,
    /// Unix seconds at which bidding closes (may extend)
    pub auction_end: u64,
    /// Price of slot zero
    pub base_price: U256,
    /// Number of bids currently placed
    pub num_bids: u64,
    /// Every available invocation is covered by a bid
    pub sold_out: bool,
    /// Whether late bids extend the auction window
    pub allow_extra_time: bool,
    /// Post-auction settlement has run
    pub settled: bool,
}

/// Composite ranked-auction live state, merged by the live-data poller
/// from the auction details, the minimum-next-bid read, and the minter's
/// invocation cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RamLiveData {
    /// Auction window and bid-count fields
    pub details: RamAuctionDetails,
    /// Lowest slot a new bid is currently accepted at
    pub min_next_bid_slot: u16,
    /// Value of that slot
    pub min_next_bid_value: U256,
    /// Invocation cap enforced by the minter
    pub max_invocations: u64,
}

impl RamLiveData {
    /// Whether the auction accepts bids at `now`.
    pub fn is_live(&self, now: u64) -> bool {
        now >= self.details.auction_start && now <= self.details.auction_end
    }
}

/// Frequently refreshed on-chain sale state.
///
/// Owned by the live-data poller; everyone else reads it through the
/// parent's watch channel rather than keeping a private copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSaleData {
    /// Current price per token
    pub token_price: U256,
    /// The minter has a price configured for this project
    pub price_is_configured: bool,
    /// Display symbol of the sale currency
    pub currency_symbol: String,
    /// Tokens minted so far
    pub invocations: u64,
    /// Maximum mintable tokens
    pub max_invocations: u64,
    /// Sale is active on-chain
    pub active: bool,
    /// Sale is paused by the artist
    pub paused: bool,
    /// Sale has completed
    pub complete: bool,
    /// Ranked-auction state when the minter is auction-style
    pub ram: Option<RamLiveData>,
}
