//! Messages of the live sale data poller

use actix::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::LiveSaleData;

/// Fresh live data, sent to the parent after every successful fetch.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct LiveSaleDataFetched {
    /// The merged live sale state
    pub data: LiveSaleData,
}

/// Unrecoverable poller failure, sent to the parent once.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct LiveDataFailed {
    /// Normalized failure message
    pub message: String,
}

/// Query the poller's current state and latest value.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "LiveDataSnapshot")]
pub struct GetLiveDataSnapshot;

/// Poller states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "camelCase")]
pub enum LiveDataState {
    /// Reading price and project state from the chain
    Fetching,
    /// Sleeping until the next refresh
    Waiting,
    /// Terminal: a read failed and the parent was notified
    Error,
}

/// Snapshot of the poller.
#[derive(Debug, Clone, Serialize, Deserialize, MessageResponse)]
pub struct LiveDataSnapshot {
    /// Current state
    pub state: LiveDataState,
    /// Most recent successful fetch
    pub last: Option<LiveSaleData>,
    /// Failure message once in the error state
    pub error: Option<String>,
}
