//! Orchestrator actors
//!
//! One actor per orchestration concern, composed into a tree: the sale
//! manager owns the live-data poller and at most one purchase or bid
//! orchestrator; the registry managers own dynamic collections of
//! per-transaction and per-receipt children. Data flows down as spawn-time
//! input and watch channels; completions and errors flow up as events.
//! Siblings never talk to each other directly.

pub mod live_data;
pub mod purchase;
pub mod ram_bid;
pub mod sale_manager;
pub mod settlement;
pub mod tracking;

use actix::prelude::*;

use crate::types::SaleEvent;
use machine::Emitted;

/// Ask an actor to stop itself, and with it all of its children.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct Halt;

/// Register a lifecycle-notification subscriber on an orchestrator.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct Subscribe {
    /// Where notifications are delivered
    pub recipient: Recipient<Emitted<SaleEvent>>,
}
