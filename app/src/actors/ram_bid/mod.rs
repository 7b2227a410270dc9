//! Ranked-auction bid orchestrator
//!
//! English/sealed-bid auction flow: fetch the caller's bids, let them
//! choose a new bid or a top-up, validate the slot against the ladder,
//! submit and confirm the transaction, then poll the index until the
//! authoritative bid id appears. `slots` holds the bid-value ladder.

pub mod actor;
pub mod messages;
pub mod slots;

pub use actor::RamBidActor;
pub use messages::*;
pub use slots::{nearest_slot_for_bid_value, slot_index_to_bid_value};

#[cfg(test)]
mod tests;
