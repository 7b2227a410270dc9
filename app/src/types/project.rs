//! Project and minter configuration snapshots

use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// Identity of a sellable project on a core contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Core token contract the project lives on
    pub core_address: Address,
    /// Project number within the core contract
    pub project_id: u64,
}

impl std::fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}-{}", self.core_address, self.project_id)
    }
}

/// Ranked-auction tunables carried in the minter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamConfig {
    /// Total number of bid slots on the value ladder
    pub num_slots: u16,
    /// Slots per doubling of the bid value
    pub slots_per_price_double: u16,
}

impl Default for RamConfig {
    fn default() -> Self {
        Self { num_slots: 512, slots_per_price_double: 64 }
    }
}

/// Closed union of the minter families this engine can drive.
///
/// Adding a family means adding a variant here and handling it in the
/// eligibility and submission dispatch; the compiler walks every call
/// site for you.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinterSpec {
    /// Fixed-price sale
    SetPrice,
    /// Linearly descending dutch auction
    DutchAuctionLinear,
    /// Exponentially descending dutch auction
    DutchAuctionExponential,
    /// Allowlist-gated fixed price sale
    Merkle {
        /// Root the minter verifies proofs against
        merkle_root: H256,
        /// Where the raw address list is fetched from
        allowlist_uri: String,
    },
    /// Sale gated on holding a token from an allowed collection
    Holder {
        /// Collections whose holders may purchase
        allowed_collections: Vec<Address>,
    },
    /// Sale priced in an ERC-20 token rather than native currency
    Erc20 {
        /// The payment token
        token: Address,
    },
    /// Ranked-auction (bid ladder) sale
    RankedAuction {
        /// Slot ladder parameters
        config: RamConfig,
    },
    /// A minter family reported by the indexer that this engine
    /// does not drive
    Unsupported {
        /// Raw type tag from the indexer
        type_name: String,
    },
}

impl MinterSpec {
    /// Short stable name, used for logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            MinterSpec::SetPrice => "set_price",
            MinterSpec::DutchAuctionLinear => "dutch_auction_linear",
            MinterSpec::DutchAuctionExponential => "dutch_auction_exponential",
            MinterSpec::Merkle { .. } => "merkle",
            MinterSpec::Holder { .. } => "holder",
            MinterSpec::Erc20 { .. } => "erc20",
            MinterSpec::RankedAuction { .. } => "ranked_auction",
            MinterSpec::Unsupported { .. } => "unsupported",
        }
    }

    /// Whether the engine knows how to drive this family at all.
    pub fn is_supported(&self) -> bool {
        !matches!(self, MinterSpec::Unsupported { .. })
    }

    /// Whether this family sells through the ranked-auction bid flow.
    pub fn is_ranked_auction(&self) -> bool {
        matches!(self, MinterSpec::RankedAuction { .. })
    }

    /// Whether this family sells through the direct purchase flow.
    pub fn uses_purchase_flow(&self) -> bool {
        self.is_supported() && !self.is_ranked_auction()
    }
}

/// The minter currently attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterConfig {
    /// Minter contract address
    pub address: Address,
    /// Which sale family the minter implements, with its extra data
    pub spec: MinterSpec,
}

/// Read-mostly snapshot of a sellable project.
///
/// Refreshed wholesale from the indexer; never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSaleData {
    /// Project identity
    pub project: ProjectRef,
    /// Artist address; the artist may purchase while the sale is paused
    pub artist_address: Address,
    /// Unix seconds at which the sale opens
    pub start_time: u64,
    /// Unix seconds at which the sale closes, if bounded
    pub end_time: Option<u64>,
    /// Display symbol of the sale currency
    pub currency_symbol: String,
    /// ERC-20 currency address; `None` for the native currency
    pub currency_address: Option<Address>,
    /// Base price per token in the sale currency's smallest unit
    pub base_price: U256,
    /// Whether minting is currently paused by the artist
    pub paused: bool,
    /// Whether the sale has permanently completed
    pub complete: bool,
    /// Attached minter, if any is configured
    pub minter: Option<MinterConfig>,
}

impl ProjectSaleData {
    /// The sale window has opened as of `now`.
    pub fn sale_started(&self, now: u64) -> bool {
        now >= self.start_time
    }
}
