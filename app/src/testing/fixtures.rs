//! Shared fixtures for orchestrator tests

use std::sync::Arc;

use ethers_core::types::{Address, U256};

use crate::clients::ClientHandles;
use crate::testing::mocks::{
    MockAllowlistStore, MockChainClient, MockIndexerClient, MockWalletClient,
};
use crate::types::{
    now_secs, Bid, BidId, LiveSaleData, MinterConfig, MinterSpec, ProjectRef, ProjectSaleData,
    RamAuctionDetails, RamLiveData, TokenId,
};

/// Deterministic address fixture.
pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

/// `n` ether in wei.
pub fn eth(n: u64) -> U256 {
    U256::exp10(18) * U256::from(n)
}

/// The project every test sells.
pub fn project_ref() -> ProjectRef {
    ProjectRef { core_address: addr(0xC0), project_id: 42 }
}

/// The artist of the fixture project.
pub fn artist() -> Address {
    addr(0xA1)
}

/// The collector driving the fixture flows.
pub fn collector() -> Address {
    addr(0xB2)
}

/// A project that opened an hour ago on the given minter family.
pub fn project_with(spec: MinterSpec) -> ProjectSaleData {
    ProjectSaleData {
        project: project_ref(),
        artist_address: artist(),
        start_time: now_secs() - 3_600,
        end_time: None,
        currency_symbol: "ETH".into(),
        currency_address: None,
        base_price: eth(1),
        paused: false,
        complete: false,
        minter: Some(MinterConfig { address: addr(0xD3), spec }),
    }
}

/// Live data for a healthy, unpaused, incomplete sale.
pub fn live_data() -> LiveSaleData {
    LiveSaleData {
        token_price: eth(1),
        price_is_configured: true,
        currency_symbol: "ETH".into(),
        invocations: 10,
        max_invocations: 100,
        active: true,
        paused: false,
        complete: false,
        ram: None,
    }
}

/// Ranked-auction live data: live window, floor at slot 8.
pub fn ram_live() -> RamLiveData {
    RamLiveData {
        details: RamAuctionDetails {
            auction_start: now_secs() - 600,
            auction_end: now_secs() + 3_600,
            base_price: eth(1) / U256::from(4),
            num_bids: 12,
            sold_out: false,
            allow_extra_time: true,
            settled: false,
        },
        min_next_bid_slot: 8,
        min_next_bid_value: U256::zero(),
        max_invocations: 100,
    }
}

/// A bid of the fixture collector at `slot`.
pub fn bid(id: u64, slot: u16, value: U256) -> Bid {
    Bid {
        id: BidId(U256::from(id)),
        bidder: collector(),
        slot_index: slot,
        value,
        rank: Some(1),
        time_of_bid: now_secs() - 60,
        removed: false,
        settled: false,
    }
}

/// A token of the fixture project.
pub fn token(n: u64) -> TokenId {
    TokenId { contract: project_ref().core_address, token_number: U256::from(n) }
}

/// The full mock collaborator world behind a `ClientHandles` bundle.
pub struct MockWorld {
    /// Chain mock
    pub chain: Arc<MockChainClient>,
    /// Indexer mock
    pub indexer: Arc<MockIndexerClient>,
    /// Wallet mock
    pub wallet: Arc<MockWalletClient>,
    /// Allowlist mock
    pub allowlists: Arc<MockAllowlistStore>,
}

impl MockWorld {
    /// A healthy world with the collector's wallet connected.
    pub fn new() -> Self {
        Self {
            chain: Arc::new(MockChainClient::new()),
            indexer: Arc::new(MockIndexerClient::new()),
            wallet: Arc::new(MockWalletClient::connected(collector())),
            allowlists: Arc::new(MockAllowlistStore::new()),
        }
    }

    /// Bundle the mocks as collaborator handles.
    pub fn handles(&self) -> ClientHandles {
        ClientHandles {
            chain: self.chain.clone(),
            indexer: self.indexer.clone(),
            wallet: self.wallet.clone(),
            allowlists: self.allowlists.clone(),
            marketplace: None,
        }
    }
}

impl Default for MockWorld {
    fn default() -> Self {
        Self::new()
    }
}
