//! Ranked-auction bid orchestrator actor

use actix::prelude::*;
use ethers_core::types::H256;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::actors::ram_bid::messages::*;
use crate::actors::ram_bid::slots;
use crate::actors::{Halt, Subscribe};
use crate::clients::{ClientError, ClientHandles, ContractCall};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics;
use crate::types::{
    now_secs, Bid, LiveSaleData, MinterSpec, ProjectSaleData, RamConfig, RamLiveData, SaleEvent,
};
use machine::{Invocations, Invoking, Notifier};

const ACTOR: &str = "ram_bid";

/// Orchestrates one user's ranked-auction bidding: choose an action,
/// validate the slot, submit, confirm, then poll the index until it
/// reflects the bid. Spawned by the sale manager while the auction is
/// biddable.
pub struct RamBidActor {
    cfg: EngineConfig,
    project: ProjectSaleData,
    clients: ClientHandles,
    live: watch::Receiver<Option<LiveSaleData>>,
    notifier: Notifier<SaleEvent>,
    state: RamBidState,
    user_bids: Vec<Bid>,
    attempt: BidAttempt,
    invocations: Invocations,
}

impl RamBidActor {
    /// Create a fresh orchestrator starting at the bid fetch.
    pub fn new(
        cfg: EngineConfig,
        project: ProjectSaleData,
        clients: ClientHandles,
        live: watch::Receiver<Option<LiveSaleData>>,
    ) -> Self {
        Self {
            cfg,
            project,
            clients,
            live,
            notifier: Notifier::new(),
            state: RamBidState::FetchingUserBids,
            user_bids: Vec::new(),
            attempt: BidAttempt::default(),
            invocations: Invocations::new(),
        }
    }

    fn set_state(&mut self, state: RamBidState) {
        if self.state != state {
            debug!(project = %self.project.project, %state, "ram bid transition");
        }
        self.state = state;
        metrics::record_transition(ACTOR, &state.to_string());
    }

    fn fail(&mut self, err: EngineError) {
        self.fail_message(err.message());
    }

    fn fail_message(&mut self, message: String) {
        warn!(project = %self.project.project, %message, "bid attempt failed");
        metrics::record_task_failure(ACTOR);
        self.attempt.error = Some(message.clone());
        self.set_state(RamBidState::Error);
        self.invocations.invalidate();
        self.notifier.emit(SaleEvent::Error { message });
    }

    fn ram_live(&self) -> Option<RamLiveData> {
        self.live.borrow().as_ref().and_then(|live| live.ram.clone())
    }

    fn ram_config(&self) -> RamConfig {
        match self.project.minter.as_ref().map(|m| &m.spec) {
            Some(MinterSpec::RankedAuction { config }) => *config,
            _ => RamConfig::default(),
        }
    }

    fn minter_address(&self) -> Option<ethers_core::types::Address> {
        self.project.minter.as_ref().map(|m| m.address)
    }

    fn enter_fetching_user_bids(&mut self, ctx: &mut Context<Self>) {
        self.set_state(RamBidState::FetchingUserBids);
        let Some(bidder) = self.clients.account() else {
            return self.fail(EngineError::NoAccount);
        };
        let indexer = self.clients.indexer.clone();
        let project = self.project.project;
        self.invoke(
            ctx,
            async move { indexer.user_bids(&project, bidder).await },
            |actor, _ctx, result| match result {
                Ok(bids) => {
                    actor.user_bids = bids;
                    actor.invocations_mut().invalidate();
                    // a sold-out auction past its window takes no more bids
                    if let Some(ram) = actor.ram_live() {
                        if ram.details.sold_out && !ram.is_live(now_secs()) {
                            actor.set_state(RamBidState::SaleComplete);
                            return;
                        }
                    }
                    actor.set_state(RamBidState::AwaitingBidActionChoice);
                }
                Err(err) => actor.fail(err.into()),
            },
        );
    }

    fn enter_initiating_bid(&mut self, ctx: &mut Context<Self>, call: ContractCall) {
        self.set_state(RamBidState::InitiatingBidTx);
        let wallet = self.clients.wallet.clone();
        self.invoke(
            ctx,
            async move { wallet.submit(call).await },
            |actor, ctx, result: Result<H256, ClientError>| match result {
                Ok(tx_hash) => {
                    metrics::BIDS_SUBMITTED.inc();
                    actor.attempt.tx_hash = Some(tx_hash);
                    actor.notifier.emit(SaleEvent::BidSubmitted { tx_hash });
                    actor.enter_confirming(ctx, tx_hash);
                }
                Err(ClientError::UserRejected) => {
                    // back to the slot choice, context untouched
                    info!("bid declined in wallet");
                    actor.set_state(RamBidState::AwaitingBidAmount);
                    actor.invocations_mut().invalidate();
                }
                Err(err) => actor.fail(err.into()),
            },
        );
    }

    fn enter_confirming(&mut self, ctx: &mut Context<Self>, tx_hash: H256) {
        self.set_state(RamBidState::ConfirmingBidTx);
        let chain = self.clients.chain.clone();
        let confirmations = self.cfg.confirmations;
        let task = async move {
            let receipt = chain.wait_for_receipt(tx_hash, confirmations).await?;
            if !receipt.status {
                return Err(EngineError::Client(ClientError::Reverted(
                    "bid transaction reverted on-chain".into(),
                )));
            }
            chain.bid_event(&receipt).ok_or(EngineError::MissingBidEvent)
        };
        self.invoke(ctx, task, |actor, ctx, result| match result {
            Ok(event) => {
                info!(bid_id = %event.bid_id, slot = event.slot_index, "bid confirmed on-chain");
                actor.notifier.emit(SaleEvent::BidConfirmed {
                    bid_id: event.bid_id,
                    slot_index: event.slot_index,
                });
                actor.attempt.confirmed = Some(event);
                actor.attempt.sync_attempts = 0;
                actor.enter_awaiting_sync(ctx);
            }
            Err(err) => actor.fail(err),
        });
    }

    /// One sync probe per entry; a miss re-enters after a fixed delay
    /// until the retry budget runs out.
    fn enter_awaiting_sync(&mut self, ctx: &mut Context<Self>) {
        self.set_state(RamBidState::AwaitingSync);
        let Some(bidder) = self.clients.account() else {
            return self.fail(EngineError::NoAccount);
        };
        let indexer = self.clients.indexer.clone();
        let project = self.project.project;
        self.invoke(
            ctx,
            async move { indexer.user_bids(&project, bidder).await },
            |actor, ctx, result| {
                let Some(confirmed) = actor.attempt.confirmed.clone() else {
                    return actor.fail(EngineError::MissingBidEvent);
                };
                match result {
                    Ok(bids) => {
                        let synced = bids
                            .iter()
                            .any(|b| b.id == confirmed.bid_id && b.slot_index == confirmed.slot_index);
                        if synced {
                            actor.user_bids = bids;
                            actor.set_state(RamBidState::BidSuccess);
                            actor.invocations_mut().invalidate();
                            actor.notifier.emit(SaleEvent::BidSynced { bid_id: confirmed.bid_id });
                            return;
                        }
                        actor.retry_sync(ctx);
                    }
                    Err(err) => {
                        // transient read failures consume the same budget
                        debug!(error = %err, "bid sync probe failed");
                        actor.retry_sync(ctx);
                    }
                }
            },
        );
    }

    fn retry_sync(&mut self, ctx: &mut Context<Self>) {
        self.attempt.sync_attempts += 1;
        if self.attempt.sync_attempts >= self.cfg.bid_sync_retries {
            let bid_id = self
                .attempt
                .confirmed
                .as_ref()
                .map(|c| c.bid_id.to_string())
                .unwrap_or_default();
            self.fail_message(format!(
                "bid {bid_id} was submitted on-chain but has not been indexed yet; \
                 indexing is taking longer than expected"
            ));
        } else {
            let interval = self.cfg.bid_sync_interval;
            self.delay(ctx, interval, |actor, ctx| actor.enter_awaiting_sync(ctx));
        }
    }
}

impl Actor for RamBidActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        metrics::record_spawn(ACTOR);
        self.enter_fetching_user_bids(ctx);
    }
}

impl Invoking for RamBidActor {
    fn invocations(&self) -> &Invocations {
        &self.invocations
    }

    fn invocations_mut(&mut self) -> &mut Invocations {
        &mut self.invocations
    }
}

impl Handler<ChooseBidAction> for RamBidActor {
    type Result = ();

    fn handle(&mut self, msg: ChooseBidAction, _: &mut Context<Self>) {
        if self.state != RamBidState::AwaitingBidActionChoice {
            warn!(state = %self.state, "ignoring ChooseBidAction");
            return;
        }
        match msg.action {
            BidAction::NewBid => {
                self.attempt.action = Some(BidAction::NewBid);
                self.set_state(RamBidState::AwaitingBidAmount);
            }
            BidAction::TopUp => {
                if self.user_bids.iter().any(Bid::is_active) {
                    self.attempt.action = Some(BidAction::TopUp);
                    self.set_state(RamBidState::AwaitingTopUpBidChoice);
                } else {
                    warn!("no active bid to top up");
                }
            }
        }
    }
}

impl Handler<ChooseTopUpBid> for RamBidActor {
    type Result = ();

    fn handle(&mut self, msg: ChooseTopUpBid, _: &mut Context<Self>) {
        if self.state != RamBidState::AwaitingTopUpBidChoice {
            warn!(state = %self.state, "ignoring ChooseTopUpBid");
            return;
        }
        let valid = self.user_bids.iter().any(|b| b.id == msg.bid_id && b.is_active());
        if !valid {
            warn!(bid_id = %msg.bid_id, "not an active bid of this user");
            return;
        }
        self.attempt.top_up_of = Some(msg.bid_id);
        self.set_state(RamBidState::AwaitingBidAmount);
    }
}

impl Handler<SubmitBid> for RamBidActor {
    type Result = ();

    fn handle(&mut self, msg: SubmitBid, ctx: &mut Context<Self>) {
        if self.state != RamBidState::AwaitingBidAmount {
            warn!(state = %self.state, "ignoring SubmitBid");
            return;
        }
        let Some(ram) = self.ram_live() else {
            warn!("no live auction data; bid not submitted");
            return;
        };
        let Some(minter) = self.minter_address() else {
            warn!("project has no minter configured; bid not submitted");
            return;
        };
        let config = self.ram_config();

        if msg.slot_index >= config.num_slots {
            warn!(slot = msg.slot_index, "slot beyond the ladder; bid not submitted");
            return;
        }
        // guard: a bid must clear the auction's current floor
        if msg.slot_index < ram.min_next_bid_slot {
            warn!(
                slot = msg.slot_index,
                min = ram.min_next_bid_slot,
                "bid slot below the auction minimum; bid not submitted"
            );
            return;
        }

        let value = slots::slot_index_to_bid_value(&config, ram.details.base_price, msg.slot_index);
        let call = match self.attempt.top_up_of {
            Some(bid_id) => {
                let Some(current) = self.user_bids.iter().find(|b| b.id == bid_id) else {
                    warn!(%bid_id, "topped-up bid vanished from the user's list");
                    return;
                };
                // guard: a top-up must strictly raise the bid's own slot
                if msg.slot_index <= current.slot_index {
                    warn!(
                        slot = msg.slot_index,
                        current = current.slot_index,
                        "top-up slot does not raise the bid; not submitted"
                    );
                    return;
                }
                ContractCall::TopUpBid {
                    minter,
                    project: self.project.project,
                    bid_id,
                    slot_index: msg.slot_index,
                    added_value: value.saturating_sub(current.value),
                }
            }
            None => ContractCall::CreateBid {
                minter,
                project: self.project.project,
                slot_index: msg.slot_index,
                value,
            },
        };

        self.attempt.slot_index = Some(msg.slot_index);
        self.attempt.value = Some(value);
        self.enter_initiating_bid(ctx, call);
    }
}

impl Handler<ResetBid> for RamBidActor {
    type Result = ();

    fn handle(&mut self, _: ResetBid, ctx: &mut Context<Self>) {
        match self.state {
            RamBidState::InitiatingBidTx
            | RamBidState::ConfirmingBidTx
            | RamBidState::FetchingUserBids
            | RamBidState::AwaitingSync => {
                warn!(state = %self.state, "cannot reset while a bid step is in flight");
            }
            _ => {
                debug!("resetting bid attempt");
                // the user's bid list survives the reset
                self.attempt = BidAttempt::default();
                self.enter_fetching_user_bids(ctx);
            }
        }
    }
}

impl Handler<Subscribe> for RamBidActor {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) {
        self.notifier.subscribe(msg.recipient);
    }
}

impl Handler<GetRamBidSnapshot> for RamBidActor {
    type Result = RamBidSnapshot;

    fn handle(&mut self, _: GetRamBidSnapshot, _: &mut Context<Self>) -> RamBidSnapshot {
        RamBidSnapshot {
            state: self.state,
            user_bids: self.user_bids.clone(),
            attempt: self.attempt.clone(),
        }
    }
}

impl Handler<Halt> for RamBidActor {
    type Result = ();

    fn handle(&mut self, _: Halt, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}
