//! Collaborator interfaces consumed by the orchestrators
//!
//! Wallets, chain RPC, the indexer, allowlist storage and marketplace
//! lookups are external collaborators. The engine talks to them through the
//! narrow traits in this module and never learns their wire formats:
//! contract ABIs live behind [`ChainClient`] and [`WalletClient`], GraphQL
//! documents behind [`IndexerClient`], Merkle math behind
//! [`AllowlistStore`]. Everything is consumed as `Arc<dyn …>` handles
//! bundled in [`ClientHandles`] and treated as immutable per snapshot: a
//! client "update" replaces the bundle, it never mutates one in place.

use std::sync::Arc;

use async_trait::async_trait;
use ethers_core::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    Bid, MintedToken, ProjectRef, ProjectSaleData, RamAuctionDetails, SettlementReceipt, TokenId,
};

/// Failure taxonomy at the collaborator boundary.
///
/// The orchestrators branch on exactly these three classes: a user
/// declining a wallet prompt recovers locally, a revert is surfaced
/// immediately without retry, and everything else is a read/transport
/// failure that may be retried by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The user declined the signature request in their wallet
    #[error("user rejected the request")]
    UserRejected,

    /// The transaction (or its simulation) reverted
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// Transport, RPC or query failure, already rendered to a short message
    #[error("{0}")]
    Rpc(String),
}

impl ClientError {
    /// Normalize an arbitrary transport error into [`ClientError::Rpc`].
    pub fn rpc(err: impl std::fmt::Display) -> Self {
        ClientError::Rpc(err.to_string())
    }
}

/// Price read for one project on its minter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    /// Current price per token
    pub price_per_token: U256,
    /// The minter has a price configured for this project
    pub is_configured: bool,
    /// Display symbol of the sale currency
    pub currency_symbol: String,
    /// ERC-20 currency address; `None` for the native currency
    pub currency_address: Option<Address>,
}

/// Core-contract state read for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreProjectState {
    /// Tokens minted so far
    pub invocations: u64,
    /// Maximum mintable tokens
    pub max_invocations: u64,
    /// Sale is active
    pub active: bool,
    /// Sale is paused by the artist
    pub paused: bool,
    /// Sale has completed
    pub complete: bool,
}

/// One log entry from a transaction receipt.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics
    pub topics: Vec<H256>,
    /// Unindexed payload
    pub data: Vec<u8>,
}

impl std::fmt::Debug for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEntry")
            .field("address", &self.address)
            .field("topics", &self.topics)
            .field("data", &format_args!("0x{}", hex::encode(&self.data)))
            .finish()
    }
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: H256,
    /// `true` when the transaction succeeded, `false` on revert
    pub status: bool,
    /// Block the transaction was included in
    pub block_number: u64,
    /// Logs emitted during execution
    pub logs: Vec<LogEntry>,
}

/// Decoded mint event from a purchase receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintEvent {
    /// The freshly minted token
    pub token: TokenId,
    /// Recipient of the mint
    pub to: Address,
}

/// Decoded bid event from a bid or top-up receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidEvent {
    /// Authoritative bid identity
    pub bid_id: crate::types::BidId,
    /// Slot the bid now occupies
    pub slot_index: u16,
    /// Address the bid belongs to
    pub bidder: Address,
}

/// Closed union of every contract write this engine performs.
///
/// The wallet collaborator owns the ABI encoding for each variant and the
/// simulate-then-write discipline; the engine only chooses which call to
/// make and with what arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractCall {
    /// Plain purchase on a fixed-price or dutch-auction minter
    Purchase {
        /// Minter contract
        minter: Address,
        /// Project being purchased from
        project: ProjectRef,
        /// Token recipient
        to: Address,
        /// Native value attached
        value: U256,
    },
    /// Allowlisted purchase with a Merkle proof
    PurchaseMerkle {
        /// Minter contract
        minter: Address,
        /// Project being purchased from
        project: ProjectRef,
        /// Token recipient
        to: Address,
        /// Proof for the allowlisted address
        proof: Vec<H256>,
        /// Delegated vault the proof belongs to, if not the wallet itself
        vault: Option<Address>,
        /// Native value attached
        value: U256,
    },
    /// Holder-gated purchase naming the qualifying token
    PurchaseHolder {
        /// Minter contract
        minter: Address,
        /// Project being purchased from
        project: ProjectRef,
        /// Token recipient
        to: Address,
        /// Token that qualifies the caller
        held: TokenId,
        /// Delegated vault that owns the token, if not the wallet itself
        vault: Option<Address>,
        /// Native value attached
        value: U256,
    },
    /// Purchase paid in an ERC-20 currency
    PurchaseErc20 {
        /// Minter contract
        minter: Address,
        /// Project being purchased from
        project: ProjectRef,
        /// Token recipient
        to: Address,
        /// Maximum price the caller accepts
        max_price: U256,
        /// Payment token
        currency: Address,
    },
    /// ERC-20 spending approval ahead of an ERC-20 purchase
    Approve {
        /// Payment token
        token: Address,
        /// Minter being approved to spend
        spender: Address,
        /// Approved amount
        amount: U256,
    },
    /// New ranked-auction bid
    CreateBid {
        /// Minter contract
        minter: Address,
        /// Project being bid on
        project: ProjectRef,
        /// Slot the bid lands on
        slot_index: u16,
        /// Bid value attached
        value: U256,
    },
    /// Top-up of an existing ranked-auction bid to a higher slot
    TopUpBid {
        /// Minter contract
        minter: Address,
        /// Project being bid on
        project: ProjectRef,
        /// Bid being raised
        bid_id: crate::types::BidId,
        /// New slot for the bid
        slot_index: u16,
        /// Additional value attached
        added_value: U256,
    },
    /// Reclaim excess settlement funds after an auction settles
    ClaimExcessSettlementFunds {
        /// Minter holding the funds
        minter: Address,
        /// Project the auction belonged to
        project: ProjectRef,
        /// Bidder the funds are returned to
        to: Address,
    },
}

/// Read-side chain access plus receipt plumbing.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain the client is connected to.
    fn chain_id(&self) -> u64;

    /// Current price info for a project on its minter.
    async fn price_info(&self, project: &ProjectRef, minter: Address)
        -> Result<PriceInfo, ClientError>;

    /// Core-contract state for a project.
    async fn project_state(&self, project: &ProjectRef) -> Result<CoreProjectState, ClientError>;

    /// Auction-window fields of a ranked-auction minter.
    async fn ram_auction_details(
        &self,
        project: &ProjectRef,
        minter: Address,
    ) -> Result<RamAuctionDetails, ClientError>;

    /// Lowest accepted slot and its value on a ranked-auction minter.
    async fn ram_min_next_bid(
        &self,
        project: &ProjectRef,
        minter: Address,
    ) -> Result<(u16, U256), ClientError>;

    /// Invocation cap enforced by a ranked-auction minter.
    async fn ram_max_invocations(
        &self,
        project: &ProjectRef,
        minter: Address,
    ) -> Result<u64, ClientError>;

    /// Decimals of an ERC-20 token.
    async fn erc20_decimals(&self, token: Address) -> Result<u8, ClientError>;

    /// Current ERC-20 allowance from `owner` to `spender`.
    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ClientError>;

    /// Mints still available to `address` on an allowlisted minter.
    async fn remaining_invocations(
        &self,
        project: &ProjectRef,
        minter: Address,
        address: Address,
    ) -> Result<u32, ClientError>;

    /// Vaults that have delegated purchase rights to `delegate`.
    async fn delegated_vaults(&self, delegate: Address) -> Result<Vec<Address>, ClientError>;

    /// Wait for `confirmations` confirmations of `tx_hash`.
    async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        confirmations: u32,
    ) -> Result<TxReceipt, ClientError>;

    /// Decode the mint event out of a purchase receipt, if present.
    fn mint_event(&self, receipt: &TxReceipt) -> Option<MintEvent>;

    /// Decode the bid event out of a bid receipt, if present.
    fn bid_event(&self, receipt: &TxReceipt) -> Option<BidEvent>;
}

/// Wallet-side signing and submission.
#[async_trait]
pub trait WalletClient: Send + Sync {
    /// Connected account, if any. Absence is a normal, checked
    /// precondition, never a defect.
    fn account(&self) -> Option<Address>;

    /// Simulate and submit `call`, returning the transaction hash.
    async fn submit(&self, call: ContractCall) -> Result<H256, ClientError>;
}

/// Off-chain index queries. Eventually consistent relative to the chain,
/// which is why every "did it land" check in the engine polls.
#[async_trait]
pub trait IndexerClient: Send + Sync {
    /// Full sale snapshot for a project.
    async fn project_sale_data(
        &self,
        project: &ProjectRef,
    ) -> Result<ProjectSaleData, ClientError>;

    /// All of `bidder`'s bids on a project.
    async fn user_bids(
        &self,
        project: &ProjectRef,
        bidder: Address,
    ) -> Result<Vec<Bid>, ClientError>;

    /// Token record by identity, once indexed.
    async fn token_by_id(&self, token: &TokenId) -> Result<Option<MintedToken>, ClientError>;

    /// Tokens from `collections` owned by `owner`.
    async fn owned_tokens_in(
        &self,
        collections: &[Address],
        owner: Address,
    ) -> Result<Vec<TokenId>, ClientError>;

    /// Outstanding excess-settlement receipts for `bidder` on a project.
    async fn settlement_receipts(
        &self,
        project: &ProjectRef,
        bidder: Address,
    ) -> Result<Vec<SettlementReceipt>, ClientError>;
}

/// Off-chain allowlist storage. The Merkle tree itself is the
/// collaborator's business; the engine only fetches lists and proofs.
#[async_trait]
pub trait AllowlistStore: Send + Sync {
    /// Fetch the raw address list at `uri`.
    async fn fetch(&self, uri: &str) -> Result<Vec<Address>, ClientError>;

    /// Regenerate the proof for `address` against `root`.
    async fn proof_for(
        &self,
        uri: &str,
        root: H256,
        address: Address,
    ) -> Result<Vec<H256>, ClientError>;
}

/// Optional external marketplace index used to cross-check token sync.
#[async_trait]
pub trait MarketplaceIndex: Send + Sync {
    /// Whether the marketplace has indexed `token`.
    async fn has_token(&self, token: &TokenId) -> Result<bool, ClientError>;
}

/// The bundle of collaborator handles passed down the actor tree.
#[derive(Clone)]
pub struct ClientHandles {
    /// Chain reads and receipts
    pub chain: Arc<dyn ChainClient>,
    /// Off-chain index
    pub indexer: Arc<dyn IndexerClient>,
    /// Wallet signer
    pub wallet: Arc<dyn WalletClient>,
    /// Allowlist storage
    pub allowlists: Arc<dyn AllowlistStore>,
    /// Marketplace index, when one is configured
    pub marketplace: Option<Arc<dyn MarketplaceIndex>>,
}

impl ClientHandles {
    /// Connected wallet account, if any.
    pub fn account(&self) -> Option<Address> {
        self.wallet.account()
    }
}

impl std::fmt::Debug for ClientHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandles")
            .field("chain_id", &self.chain.chain_id())
            .field("account", &self.wallet.account())
            .field("marketplace", &self.marketplace.is_some())
            .finish()
    }
}
