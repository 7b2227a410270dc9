//! Messages and state of the sale manager

use actix::prelude::*;
use serde::{Deserialize, Serialize};

use crate::actors::tracking::TrackingManagerActor;
use crate::clients::ClientHandles;
use crate::types::{LiveSaleData, ProjectRef, ProjectSaleData};

/// Swap the collaborator bundle (wallet/chain/indexer) for the whole tree.
///
/// `None` disconnects: children are halted and the manager idles until a
/// new bundle arrives. A fresh bundle clears any stored error and refetches
/// the project snapshot, so eligibility is re-evaluated from scratch.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct ClientsUpdated {
    /// The new bundle, or `None` when disconnected
    pub clients: Option<ClientHandles>,
}

/// Toggle the purchase-tracking manager's availability.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct TrackingAvailabilityChanged {
    /// Tracking manager, or `None` when unavailable
    pub tracking: Option<Addr<TrackingManagerActor>>,
}

/// Inject an error into the manager's context (routes to the error state).
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct InjectError {
    /// Normalized failure message
    pub message: String,
}

/// Query the manager's serializable snapshot.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "ManagerSnapshot")]
pub struct GetManagerSnapshot;

/// Sale manager states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "camelCase")]
pub enum ManagerState {
    /// Loading the project sale snapshot from the indexer
    FetchingProjectData,
    /// Router parked: nothing actionable, poller keeps refreshing
    Idle,
    /// Purchase orchestrator is live
    ReadyForPurchase,
    /// Bid orchestrator is live
    ReadyForRamBid,
    /// The sale has permanently completed
    ProjectSaleComplete,
    /// The project cannot sell through this engine
    ProjectIneligible,
    /// A stored error is blocking everything; a client update recovers
    Error,
}

/// Serializable snapshot of the sale manager. Client handles and child
/// actor addresses are excluded; hydration re-injects handles and the
/// router respawns children.
#[derive(Debug, Clone, Serialize, Deserialize, MessageResponse)]
pub struct ManagerSnapshot {
    /// Current state
    pub state: ManagerState,
    /// Project identity
    pub project_ref: ProjectRef,
    /// Project snapshot, once fetched
    pub project: Option<ProjectSaleData>,
    /// Latest live sale data
    pub live: Option<LiveSaleData>,
    /// Stored error, if any
    pub error: Option<String>,
    /// Why the project is ineligible, when it is
    pub ineligible_reason: Option<String>,
}
