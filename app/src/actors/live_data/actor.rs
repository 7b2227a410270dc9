//! Poller actor implementation

use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;
use tracing::{debug, warn};

use crate::actors::live_data::messages::*;
use crate::actors::Halt;
use crate::clients::ChainClient;
use crate::error::EngineError;
use crate::metrics;
use crate::types::{LiveSaleData, ProjectSaleData, RamLiveData};
use machine::{Invocations, Invoking};

const ACTOR: &str = "live_data";

/// Timer-driven poller for one project's volatile sale state.
pub struct LiveDataActor {
    project: ProjectSaleData,
    chain: Arc<dyn ChainClient>,
    interval: Duration,
    state: LiveDataState,
    last: Option<LiveSaleData>,
    error: Option<String>,
    invocations: Invocations,
    on_data: Recipient<LiveSaleDataFetched>,
    on_error: Recipient<LiveDataFailed>,
}

impl LiveDataActor {
    /// Create a poller reporting to the given parent recipients.
    pub fn new(
        project: ProjectSaleData,
        chain: Arc<dyn ChainClient>,
        interval: Duration,
        on_data: Recipient<LiveSaleDataFetched>,
        on_error: Recipient<LiveDataFailed>,
    ) -> Self {
        Self {
            project,
            chain,
            interval,
            state: LiveDataState::Fetching,
            last: None,
            error: None,
            invocations: Invocations::new(),
            on_data,
            on_error,
        }
    }

    fn set_state(&mut self, state: LiveDataState) {
        if self.state != state {
            debug!(project = %self.project.project, %state, "live data poller transition");
        }
        self.state = state;
        metrics::record_transition(ACTOR, &state.to_string());
    }

    fn enter_fetching(&mut self, ctx: &mut Context<Self>) {
        self.set_state(LiveDataState::Fetching);
        let chain = self.chain.clone();
        let project = self.project.clone();
        self.invoke(ctx, fetch_live_data(chain, project), |actor, ctx, result| {
            match result {
                Ok(data) => {
                    actor.last = Some(data.clone());
                    let _ = actor.on_data.do_send(LiveSaleDataFetched { data });
                    actor.enter_waiting(ctx);
                }
                Err(err) => actor.enter_error(err),
            }
        });
    }

    fn enter_waiting(&mut self, ctx: &mut Context<Self>) {
        self.set_state(LiveDataState::Waiting);
        self.delay(ctx, self.interval, |actor, ctx| actor.enter_fetching(ctx));
    }

    fn enter_error(&mut self, err: EngineError) {
        let message = err.message();
        warn!(project = %self.project.project, %message, "live data fetch failed");
        metrics::record_task_failure(ACTOR);
        self.error = Some(message.clone());
        self.set_state(LiveDataState::Error);
        self.invocations.invalidate();
        let _ = self.on_error.do_send(LiveDataFailed { message });
    }
}

impl Actor for LiveDataActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        metrics::record_spawn(ACTOR);
        debug!(project = %self.project.project, "live data poller started");
        self.enter_fetching(ctx);
    }
}

impl Invoking for LiveDataActor {
    fn invocations(&self) -> &Invocations {
        &self.invocations
    }

    fn invocations_mut(&mut self) -> &mut Invocations {
        &mut self.invocations
    }
}

impl Handler<GetLiveDataSnapshot> for LiveDataActor {
    type Result = LiveDataSnapshot;

    fn handle(&mut self, _: GetLiveDataSnapshot, _: &mut Context<Self>) -> LiveDataSnapshot {
        LiveDataSnapshot {
            state: self.state,
            last: self.last.clone(),
            error: self.error.clone(),
        }
    }
}

impl Handler<Halt> for LiveDataActor {
    type Result = ();

    fn handle(&mut self, _: Halt, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}

/// Read and merge the live sale state for one project.
///
/// Ranked-auction minters carry three extra reads (auction details,
/// minimum next bid, invocation cap) merged into the composite value.
pub async fn fetch_live_data(
    chain: Arc<dyn ChainClient>,
    project: ProjectSaleData,
) -> Result<LiveSaleData, EngineError> {
    let minter = project.minter.as_ref().ok_or(EngineError::NoMinter)?;

    let price = chain.price_info(&project.project, minter.address).await?;
    let state = chain.project_state(&project.project).await?;

    let ram = if minter.spec.is_ranked_auction() {
        let details = chain.ram_auction_details(&project.project, minter.address).await?;
        let (min_next_bid_slot, min_next_bid_value) =
            chain.ram_min_next_bid(&project.project, minter.address).await?;
        let max_invocations = chain.ram_max_invocations(&project.project, minter.address).await?;
        Some(RamLiveData { details, min_next_bid_slot, min_next_bid_value, max_invocations })
    } else {
        None
    };

    Ok(LiveSaleData {
        token_price: price.price_per_token,
        price_is_configured: price.is_configured,
        currency_symbol: price.currency_symbol,
        invocations: state.invocations,
        max_invocations: state.max_invocations,
        active: state.active,
        paused: state.paused,
        complete: state.complete,
        ram,
    })
}
