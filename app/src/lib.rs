//! Primary-sale orchestration engine
//!
//! A hierarchical, event-driven orchestration engine for on-chain token
//! sales: a root sale manager per project decides what the caller can do
//! right now (purchase, bid, nothing), spawns the matching child
//! orchestrator, and keeps a live-data poller feeding everyone fresh
//! on-chain state. Each orchestrator is an Actix actor walking an explicit
//! state enum; asynchronous steps are epoch-tagged invoked tasks so a late
//! completion can never corrupt a state the actor has already left.
//!
//! Wallets, chain RPC, the indexer and allowlist storage are external
//! collaborators behind the traits in [`clients`]; the engine owns only
//! the sequencing and failure handling between them.

pub mod actors;
pub mod clients;
pub mod config;
pub mod error;
pub mod metrics;
pub mod testing;
pub mod types;

pub use config::EngineConfig;
pub use error::EngineError;

/// Prelude module for embedding applications
pub mod prelude {
    pub use crate::actors::live_data::LiveDataActor;
    pub use crate::actors::purchase::PurchaseActor;
    pub use crate::actors::ram_bid::RamBidActor;
    pub use crate::actors::sale_manager::SaleManagerActor;
    pub use crate::actors::settlement::ExcessSettlementManagerActor;
    pub use crate::actors::tracking::{TrackingActor, TrackingManagerActor};
    pub use crate::actors::{Halt, Subscribe};
    pub use crate::clients::ClientHandles;
    pub use crate::config::EngineConfig;
    pub use crate::error::EngineError;
    pub use crate::types::SaleEvent;
}
