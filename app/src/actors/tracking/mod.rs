//! Post-submission purchase tracking
//!
//! One tracker per purchase transaction: wait for the confirmation, derive
//! the token identity from the mint event, then poll the off-chain index
//! (and the marketplace index when configured) until the token record
//! exists. The manager owns the trackers keyed by transaction hash.

pub mod actor;
pub mod manager;
pub mod messages;

pub use actor::TrackingActor;
pub use manager::TrackingManagerActor;
pub use messages::*;
