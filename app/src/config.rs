//! Engine tunables

use std::time::Duration;

/// Intervals, budgets and confirmation depths used across the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Refresh interval of the live sale data poller
    pub live_data_interval: Duration,
    /// How often the sale-start gate re-evaluates its local guard
    pub sale_start_check_interval: Duration,
    /// Confirmations required of purchase, approval and bid transactions
    pub confirmations: u32,
    /// Attempts to find a confirmed bid in the off-chain index
    pub bid_sync_retries: u32,
    /// Fixed delay between bid sync attempts
    pub bid_sync_interval: Duration,
    /// Attempts to find a minted token in the off-chain index
    pub token_sync_retries: u32,
    /// Fixed delay between token sync attempts
    pub token_sync_interval: Duration,
    /// Attempts to fetch settlement receipts before giving up
    pub receipt_fetch_retries: u32,
    /// Fixed delay between settlement receipt fetch attempts
    pub receipt_fetch_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            live_data_interval: Duration::from_secs(10),
            sale_start_check_interval: Duration::from_secs(1),
            confirmations: 1,
            bid_sync_retries: 10,
            bid_sync_interval: Duration::from_secs(5),
            token_sync_retries: 10,
            token_sync_interval: Duration::from_secs(2),
            receipt_fetch_retries: 3,
            receipt_fetch_interval: Duration::from_secs(2),
        }
    }
}

impl EngineConfig {
    /// Millisecond-scale intervals for tests.
    pub fn test_config() -> Self {
        Self {
            live_data_interval: Duration::from_millis(20),
            sale_start_check_interval: Duration::from_millis(10),
            confirmations: 1,
            bid_sync_retries: 3,
            bid_sync_interval: Duration::from_millis(10),
            token_sync_retries: 3,
            token_sync_interval: Duration::from_millis(10),
            receipt_fetch_retries: 2,
            receipt_fetch_interval: Duration::from_millis(10),
        }
    }
}
