//! Project sale manager (root orchestrator)
//!
//! The decision hub for one project: fetches the sale snapshot, keeps a
//! live-data poller running while a chain client is available, and spawns
//! the purchase or bid orchestrator the current eligibility calls for. The
//! routing decision itself is a pure function in [`router`], re-evaluated
//! after every context change.

pub mod actor;
pub mod messages;
pub mod router;

pub use actor::SaleManagerActor;
pub use messages::*;
pub use router::{decide, Route, RouterInputs};
