//! Mock collaborator clients

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ethers_core::types::{Address, H256, U256};

use crate::clients::{
    AllowlistStore, BidEvent, ChainClient, ClientError, ContractCall, CoreProjectState,
    IndexerClient, LogEntry, MarketplaceIndex, MintEvent, PriceInfo, TxReceipt, WalletClient,
};
use crate::types::{
    Bid, MintedToken, ProjectRef, ProjectSaleData, RamAuctionDetails, SettlementReceipt, TokenId,
};

/// Scripted chain client with per-call overrides.
pub struct MockChainClient {
    /// Chain id reported to callers
    pub chain_id: u64,
    /// Price info returned by `price_info`
    pub price: Mutex<PriceInfo>,
    /// Core state returned by `project_state`
    pub state: Mutex<CoreProjectState>,
    /// Ranked-auction details, when the project is auction-style
    pub ram_details: Mutex<Option<RamAuctionDetails>>,
    /// Minimum next bid (slot, value)
    pub ram_min_next_bid: Mutex<(u16, U256)>,
    /// Ranked-auction invocation cap
    pub ram_max_invocations: Mutex<u64>,
    /// ERC-20 decimals by token
    pub decimals: Mutex<HashMap<Address, u8>>,
    /// ERC-20 allowances by (token, owner, spender)
    pub allowances: Mutex<HashMap<(Address, Address, Address), U256>>,
    /// Remaining allowlist invocations by address
    pub remaining: Mutex<HashMap<Address, u32>>,
    /// Delegated vaults by delegate
    pub vaults: Mutex<HashMap<Address, Vec<Address>>>,
    /// Receipts by transaction hash; missing entries yield a default
    /// successful receipt
    pub receipts: Mutex<HashMap<H256, Result<TxReceipt, ClientError>>>,
    /// Mint events decoded per transaction hash
    pub mint_events: Mutex<HashMap<H256, MintEvent>>,
    /// Bid events decoded per transaction hash
    pub bid_events: Mutex<HashMap<H256, BidEvent>>,
    /// When set, every read fails with this error
    pub read_failure: Mutex<Option<ClientError>>,
}

impl MockChainClient {
    /// A healthy chain with a configured price and an active project.
    pub fn new() -> Self {
        Self {
            chain_id: 1,
            price: Mutex::new(PriceInfo {
                price_per_token: U256::exp10(18),
                is_configured: true,
                currency_symbol: "ETH".into(),
                currency_address: None,
            }),
            state: Mutex::new(CoreProjectState {
                invocations: 10,
                max_invocations: 100,
                active: true,
                paused: false,
                complete: false,
            }),
            ram_details: Mutex::new(None),
            ram_min_next_bid: Mutex::new((0, U256::zero())),
            ram_max_invocations: Mutex::new(100),
            decimals: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            remaining: Mutex::new(HashMap::new()),
            vaults: Mutex::new(HashMap::new()),
            receipts: Mutex::new(HashMap::new()),
            mint_events: Mutex::new(HashMap::new()),
            bid_events: Mutex::new(HashMap::new()),
            read_failure: Mutex::new(None),
        }
    }

    fn check_read(&self) -> Result<(), ClientError> {
        match self.read_failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Script a successful receipt (with optional mint/bid events already
    /// scripted separately).
    pub fn script_receipt(&self, tx_hash: H256, status: bool) {
        self.receipts.lock().unwrap().insert(
            tx_hash,
            Ok(TxReceipt { tx_hash, status, block_number: 1, logs: Vec::<LogEntry>::new() }),
        );
    }
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn price_info(&self, _: &ProjectRef, _: Address) -> Result<PriceInfo, ClientError> {
        self.check_read()?;
        Ok(self.price.lock().unwrap().clone())
    }

    async fn project_state(&self, _: &ProjectRef) -> Result<CoreProjectState, ClientError> {
        self.check_read()?;
        Ok(self.state.lock().unwrap().clone())
    }

    async fn ram_auction_details(
        &self,
        _: &ProjectRef,
        _: Address,
    ) -> Result<RamAuctionDetails, ClientError> {
        self.check_read()?;
        self.ram_details
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ClientError::Rpc("no auction details scripted".into()))
    }

    async fn ram_min_next_bid(
        &self,
        _: &ProjectRef,
        _: Address,
    ) -> Result<(u16, U256), ClientError> {
        self.check_read()?;
        Ok(*self.ram_min_next_bid.lock().unwrap())
    }

    async fn ram_max_invocations(&self, _: &ProjectRef, _: Address) -> Result<u64, ClientError> {
        self.check_read()?;
        Ok(*self.ram_max_invocations.lock().unwrap())
    }

    async fn erc20_decimals(&self, token: Address) -> Result<u8, ClientError> {
        self.check_read()?;
        Ok(self.decimals.lock().unwrap().get(&token).copied().unwrap_or(18))
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ClientError> {
        self.check_read()?;
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn remaining_invocations(
        &self,
        _: &ProjectRef,
        _: Address,
        address: Address,
    ) -> Result<u32, ClientError> {
        self.check_read()?;
        Ok(self.remaining.lock().unwrap().get(&address).copied().unwrap_or(0))
    }

    async fn delegated_vaults(&self, delegate: Address) -> Result<Vec<Address>, ClientError> {
        self.check_read()?;
        Ok(self.vaults.lock().unwrap().get(&delegate).cloned().unwrap_or_default())
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        _confirmations: u32,
    ) -> Result<TxReceipt, ClientError> {
        match self.receipts.lock().unwrap().get(&tx_hash) {
            Some(result) => result.clone(),
            None => Ok(TxReceipt { tx_hash, status: true, block_number: 1, logs: Vec::new() }),
        }
    }

    fn mint_event(&self, receipt: &TxReceipt) -> Option<MintEvent> {
        self.mint_events.lock().unwrap().get(&receipt.tx_hash).cloned()
    }

    fn bid_event(&self, receipt: &TxReceipt) -> Option<BidEvent> {
        self.bid_events.lock().unwrap().get(&receipt.tx_hash).cloned()
    }
}

/// Scripted wallet with call history.
pub struct MockWalletClient {
    /// Connected account
    pub account: Mutex<Option<Address>>,
    /// Scripted submit outcomes, popped in order; when empty, submissions
    /// succeed with sequential hashes
    pub submissions: Mutex<VecDeque<Result<H256, ClientError>>>,
    /// Every call submitted through this wallet
    pub calls: Mutex<Vec<ContractCall>>,
    next_hash: AtomicU64,
}

impl MockWalletClient {
    /// A wallet connected as `account`.
    pub fn connected(account: Address) -> Self {
        Self {
            account: Mutex::new(Some(account)),
            submissions: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            next_hash: AtomicU64::new(1),
        }
    }

    /// Queue a submit outcome.
    pub fn script_submission(&self, outcome: Result<H256, ClientError>) {
        self.submissions.lock().unwrap().push_back(outcome);
    }

    /// Calls submitted so far.
    pub fn submitted_calls(&self) -> Vec<ContractCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletClient for MockWalletClient {
    fn account(&self) -> Option<Address> {
        *self.account.lock().unwrap()
    }

    async fn submit(&self, call: ContractCall) -> Result<H256, ClientError> {
        self.calls.lock().unwrap().push(call);
        match self.submissions.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(H256::from_low_u64_be(self.next_hash.fetch_add(1, Ordering::SeqCst))),
        }
    }
}

/// Scripted indexer with visibility delays for sync tests.
pub struct MockIndexerClient {
    /// Project snapshot served by `project_sale_data`
    pub project: Mutex<Option<ProjectSaleData>>,
    /// Bids visible before the sync threshold is crossed
    pub bids: Mutex<Vec<Bid>>,
    /// Bids visible after `bids_visible_after` queries
    pub synced_bids: Mutex<Vec<Bid>>,
    /// Number of `user_bids` queries before `synced_bids` becomes visible
    pub bids_visible_after: AtomicU64,
    /// Tokens visible to `token_by_id` once the threshold is crossed
    pub tokens: Mutex<HashMap<TokenId, MintedToken>>,
    /// Number of `token_by_id` queries before tokens become visible
    pub tokens_visible_after: AtomicU64,
    /// Tokens by owner for holder checks
    pub owned: Mutex<HashMap<Address, Vec<TokenId>>>,
    /// Settlement receipts served by `settlement_receipts`
    pub receipts: Mutex<Vec<SettlementReceipt>>,
    user_bids_queries: AtomicU64,
    token_queries: AtomicU64,
}

impl MockIndexerClient {
    /// An indexer with nothing indexed yet.
    pub fn new() -> Self {
        Self {
            project: Mutex::new(None),
            bids: Mutex::new(Vec::new()),
            synced_bids: Mutex::new(Vec::new()),
            bids_visible_after: AtomicU64::new(0),
            tokens: Mutex::new(HashMap::new()),
            tokens_visible_after: AtomicU64::new(0),
            owned: Mutex::new(HashMap::new()),
            receipts: Mutex::new(Vec::new()),
            user_bids_queries: AtomicU64::new(0),
            token_queries: AtomicU64::new(0),
        }
    }

    /// How many `token_by_id` queries have been made.
    pub fn token_queries(&self) -> u64 {
        self.token_queries.load(Ordering::SeqCst)
    }
}

impl Default for MockIndexerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexerClient for MockIndexerClient {
    async fn project_sale_data(&self, _: &ProjectRef) -> Result<ProjectSaleData, ClientError> {
        self.project
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ClientError::Rpc("project not indexed".into()))
    }

    async fn user_bids(&self, _: &ProjectRef, _: Address) -> Result<Vec<Bid>, ClientError> {
        let queries = self.user_bids_queries.fetch_add(1, Ordering::SeqCst) + 1;
        if queries > self.bids_visible_after.load(Ordering::SeqCst)
            && !self.synced_bids.lock().unwrap().is_empty()
        {
            return Ok(self.synced_bids.lock().unwrap().clone());
        }
        Ok(self.bids.lock().unwrap().clone())
    }

    async fn token_by_id(&self, token: &TokenId) -> Result<Option<MintedToken>, ClientError> {
        let queries = self.token_queries.fetch_add(1, Ordering::SeqCst) + 1;
        if queries <= self.tokens_visible_after.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.tokens.lock().unwrap().get(token).cloned())
    }

    async fn owned_tokens_in(
        &self,
        collections: &[Address],
        owner: Address,
    ) -> Result<Vec<TokenId>, ClientError> {
        let owned = self.owned.lock().unwrap().get(&owner).cloned().unwrap_or_default();
        Ok(owned.into_iter().filter(|t| collections.contains(&t.contract)).collect())
    }

    async fn settlement_receipts(
        &self,
        _: &ProjectRef,
        _: Address,
    ) -> Result<Vec<SettlementReceipt>, ClientError> {
        Ok(self.receipts.lock().unwrap().clone())
    }
}

/// In-memory allowlist store with deterministic proofs.
pub struct MockAllowlistStore {
    /// Address lists by uri
    pub lists: Mutex<HashMap<String, Vec<Address>>>,
}

impl MockAllowlistStore {
    /// An empty store.
    pub fn new() -> Self {
        Self { lists: Mutex::new(HashMap::new()) }
    }

    /// Publish a list at `uri`.
    pub fn publish(&self, uri: &str, addresses: Vec<Address>) {
        self.lists.lock().unwrap().insert(uri.to_string(), addresses);
    }
}

impl Default for MockAllowlistStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AllowlistStore for MockAllowlistStore {
    async fn fetch(&self, uri: &str) -> Result<Vec<Address>, ClientError> {
        self.lists
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .ok_or_else(|| ClientError::Rpc(format!("no allowlist at {uri}")))
    }

    async fn proof_for(
        &self,
        _uri: &str,
        _root: H256,
        address: Address,
    ) -> Result<Vec<H256>, ClientError> {
        let mut leaf = [0u8; 32];
        leaf[12..].copy_from_slice(address.as_bytes());
        Ok(vec![H256::from(leaf)])
    }
}

/// Marketplace index that knows a fixed token set.
pub struct MockMarketplaceIndex {
    /// Indexed tokens
    pub tokens: Mutex<Vec<TokenId>>,
}

#[async_trait]
impl MarketplaceIndex for MockMarketplaceIndex {
    async fn has_token(&self, token: &TokenId) -> Result<bool, ClientError> {
        Ok(self.tokens.lock().unwrap().contains(token))
    }
}
