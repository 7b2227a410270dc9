//! Pure routing decision for the sale manager
//!
//! Evaluated after every context mutation, the equivalent of re-running
//! the manager's always-transitions. Priority order: stored error, primary
//! sale eligibility, completion, direct purchasability, auction
//! biddability, idle.

use ethers_core::types::Address;

use crate::types::{LiveSaleData, ProjectSaleData};

/// Everything the routing decision reads.
#[derive(Debug, Clone, Copy)]
pub struct RouterInputs<'a> {
    /// Stored error, if any handler recorded one
    pub error: Option<&'a str>,
    /// Project snapshot, once fetched
    pub project: Option<&'a ProjectSaleData>,
    /// Latest live sale data, once the poller delivered any
    pub live: Option<&'a LiveSaleData>,
    /// Connected wallet account
    pub account: Option<Address>,
    /// Whether a chain client bundle is available at all
    pub clients_available: bool,
    /// Unix seconds now
    pub now: u64,
}

/// Outcome of one routing evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// A stored error wins over everything
    Error,
    /// The project cannot sell through this engine, with the reason
    Ineligible(String),
    /// The sale has permanently completed
    SaleComplete,
    /// The caller can purchase right now
    Purchase,
    /// The caller can bid right now
    RamBid,
    /// Nothing to do yet; keep polling
    Idle,
}

/// Decide what the manager should be doing given `inputs`.
pub fn decide(inputs: &RouterInputs<'_>) -> Route {
    if inputs.error.is_some() {
        return Route::Error;
    }
    let Some(project) = inputs.project else {
        return Route::Idle;
    };

    let Some(minter) = project.minter.as_ref() else {
        return Route::Ineligible("project has no minter configured".into());
    };
    if !minter.spec.is_supported() {
        return Route::Ineligible(format!(
            "minter type `{}` is not supported",
            minter.spec.name()
        ));
    }
    if let Some(live) = inputs.live {
        if !live.price_is_configured {
            return Route::Ineligible("project price has not been configured".into());
        }
    }

    if project.complete || inputs.live.map_or(false, |live| live.complete) {
        return Route::SaleComplete;
    }

    if !inputs.clients_available {
        return Route::Idle;
    }
    if let (Some(live), Some(account)) = (inputs.live, inputs.account) {
        if minter.spec.uses_purchase_flow() {
            let paused_for_caller = live.paused && account != project.artist_address;
            if !paused_for_caller && project.sale_started(inputs.now) {
                return Route::Purchase;
            }
        }
        if let Some(ram) = live.ram.as_ref() {
            if ram.is_live(inputs.now) && !ram.details.sold_out {
                return Route::RamBid;
            }
        }
    }

    Route::Idle
}
