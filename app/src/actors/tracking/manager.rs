//! Purchase-tracking manager
//!
//! Owns one tracker per outstanding purchase transaction, keyed by hash.
//! A tracker is spawned when a purchase is initiated and removed (and
//! halted) when it reports its terminal outcome; child notifications are
//! relayed upward to the manager's own subscribers.

use std::collections::HashMap;

use actix::prelude::*;
use ethers_core::types::H256;
use tracing::{debug, info};

use crate::actors::tracking::actor::TrackingActor;
use crate::actors::tracking::messages::*;
use crate::actors::{Halt, Subscribe};
use crate::clients::ClientHandles;
use crate::config::EngineConfig;
use crate::metrics;
use crate::types::SaleEvent;
use machine::{Emitted, Notifier};

const ACTOR: &str = "tracking_manager";

/// Registry of per-transaction trackers.
pub struct TrackingManagerActor {
    cfg: EngineConfig,
    clients: ClientHandles,
    children: HashMap<H256, Addr<TrackingActor>>,
    notifier: Notifier<SaleEvent>,
}

impl TrackingManagerActor {
    /// Create an empty manager.
    pub fn new(cfg: EngineConfig, clients: ClientHandles) -> Self {
        Self { cfg, clients, children: HashMap::new(), notifier: Notifier::new() }
    }

    fn halt_children(&mut self) {
        for (tx_hash, child) in self.children.drain() {
            debug!(tx = ?tx_hash, "halting tracker");
            child.do_send(Halt);
        }
    }
}

impl Actor for TrackingManagerActor {
    type Context = Context<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        metrics::record_spawn(ACTOR);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        // children never outlive their manager
        self.halt_children();
        Running::Stop
    }
}

impl Handler<TrackPurchase> for TrackingManagerActor {
    type Result = ();

    fn handle(&mut self, msg: TrackPurchase, ctx: &mut Context<Self>) {
        if self.children.contains_key(&msg.tx_hash) {
            debug!(tx = ?msg.tx_hash, "purchase already tracked");
            return;
        }
        info!(tx = ?msg.tx_hash, project = %msg.project, "tracking new purchase");
        let child = TrackingActor::new(
            self.cfg.clone(),
            self.clients.clone(),
            msg.project,
            msg.tx_hash,
            ctx.address().recipient(),
        )
        .start();
        child.do_send(Subscribe { recipient: ctx.address().recipient() });
        self.children.insert(msg.tx_hash, child);
    }
}

impl Handler<TrackingFinished> for TrackingManagerActor {
    type Result = ();

    fn handle(&mut self, msg: TrackingFinished, _: &mut Context<Self>) {
        if let Some(child) = self.children.remove(&msg.tx_hash) {
            debug!(tx = ?msg.tx_hash, outcome = ?msg.outcome, "tracker finished");
            child.do_send(Halt);
        }
    }
}

impl Handler<Emitted<SaleEvent>> for TrackingManagerActor {
    type Result = ();

    fn handle(&mut self, msg: Emitted<SaleEvent>, _: &mut Context<Self>) {
        // relay child lifecycle notifications to our own subscribers
        self.notifier.emit(msg.0);
    }
}

impl Handler<Subscribe> for TrackingManagerActor {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) {
        self.notifier.subscribe(msg.recipient);
    }
}

impl Handler<GetActiveTracking> for TrackingManagerActor {
    type Result = ActiveTracking;

    fn handle(&mut self, _: GetActiveTracking, _: &mut Context<Self>) -> ActiveTracking {
        ActiveTracking(self.children.keys().copied().collect())
    }
}

impl Handler<Halt> for TrackingManagerActor {
    type Result = ();

    fn handle(&mut self, _: Halt, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}
