//! Excess-settlement-funds manager

use std::collections::{HashMap, HashSet};

use actix::prelude::*;
use tracing::{debug, info, warn};

use crate::actors::settlement::claim::{ClaimParent, SettlementClaimActor};
use crate::actors::settlement::messages::*;
use crate::actors::{Halt, Subscribe};
use crate::clients::ClientHandles;
use crate::config::EngineConfig;
use crate::metrics;
use crate::types::{SaleEvent, SettlementReceipt};
use machine::{poll_attempts, Emitted, Invocations, Invoking, MachineError, Notifier};

const ACTOR: &str = "settlement_manager";

/// Registry of per-receipt claim orchestrators, reconciled against the
/// indexer's receipt list on every refresh.
pub struct ExcessSettlementManagerActor {
    cfg: EngineConfig,
    clients: ClientHandles,
    children: HashMap<String, Addr<SettlementClaimActor>>,
    busy: HashSet<String>,
    notifier: Notifier<SaleEvent>,
    invocations: Invocations,
}

impl ExcessSettlementManagerActor {
    /// Create an empty manager.
    pub fn new(cfg: EngineConfig, clients: ClientHandles) -> Self {
        Self {
            cfg,
            clients,
            children: HashMap::new(),
            busy: HashSet::new(),
            notifier: Notifier::new(),
            invocations: Invocations::new(),
        }
    }

    /// Diff the desired receipt set against the spawned children: spawn
    /// one child per new receipt, stop children whose receipt disappeared.
    /// A child that is mid-claim is left alone.
    fn reconcile(&mut self, receipts: Vec<SettlementReceipt>, ctx: &mut Context<Self>) {
        let desired: HashMap<String, SettlementReceipt> =
            receipts.into_iter().map(|r| (r.key(), r)).collect();

        let stale: Vec<String> = self
            .children
            .keys()
            .filter(|key| !desired.contains_key(*key) && !self.busy.contains(*key))
            .cloned()
            .collect();
        for key in stale {
            if let Some(child) = self.children.remove(&key) {
                debug!(%key, "receipt gone; halting claim orchestrator");
                child.do_send(Halt);
            }
        }

        for (key, receipt) in desired {
            if self.children.contains_key(&key) {
                continue;
            }
            info!(%key, excess = %receipt.excess, "spawning claim orchestrator");
            let parent = ClaimParent {
                busy: ctx.address().recipient(),
                finished: ctx.address().recipient(),
            };
            let child =
                SettlementClaimActor::new(self.cfg.clone(), self.clients.clone(), receipt, parent)
                    .start();
            child.do_send(Subscribe { recipient: ctx.address().recipient() });
            self.children.insert(key, child);
        }
    }

    fn halt_children(&mut self) {
        for (key, child) in self.children.drain() {
            debug!(%key, "halting claim orchestrator");
            child.do_send(Halt);
        }
    }
}

impl Actor for ExcessSettlementManagerActor {
    type Context = Context<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        metrics::record_spawn(ACTOR);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.halt_children();
        Running::Stop
    }
}

impl Invoking for ExcessSettlementManagerActor {
    fn invocations(&self) -> &Invocations {
        &self.invocations
    }

    fn invocations_mut(&mut self) -> &mut Invocations {
        &mut self.invocations
    }
}

impl Handler<RefreshReceipts> for ExcessSettlementManagerActor {
    type Result = ();

    fn handle(&mut self, msg: RefreshReceipts, ctx: &mut Context<Self>) {
        let indexer = self.clients.indexer.clone();
        let retries = self.cfg.receipt_fetch_retries;
        let interval = self.cfg.receipt_fetch_interval;
        // transient read failures are swallowed by the probe and retried
        // on the poller's budget
        let task = async move {
            poll_attempts("settlement receipt fetch", retries, interval, move || {
                let indexer = indexer.clone();
                async move {
                    match indexer.settlement_receipts(&msg.project, msg.bidder).await {
                        Ok(receipts) => Ok(Some(receipts)),
                        Err(err) => {
                            debug!(error = %err, "receipt fetch failed; will retry");
                            Ok(None)
                        }
                    }
                }
            })
            .await
        };
        self.invoke(
            ctx,
            task,
            |actor, ctx, result: Result<Vec<SettlementReceipt>, MachineError>| match result {
                Ok(receipts) => actor.reconcile(receipts, ctx),
                Err(err) => warn!(error = %err, "settlement receipt fetch exhausted its retries"),
            },
        );
    }
}

impl Handler<ClaimReceipt> for ExcessSettlementManagerActor {
    type Result = ();

    fn handle(&mut self, msg: ClaimReceipt, _: &mut Context<Self>) {
        match self.children.get(&msg.key) {
            Some(child) => child.do_send(ClaimExcess),
            None => warn!(key = %msg.key, "no claim orchestrator for receipt"),
        }
    }
}

impl Handler<ClaimBusy> for ExcessSettlementManagerActor {
    type Result = ();

    fn handle(&mut self, msg: ClaimBusy, _: &mut Context<Self>) {
        if msg.busy {
            self.busy.insert(msg.key);
        } else {
            self.busy.remove(&msg.key);
        }
    }
}

impl Handler<ClaimFinished> for ExcessSettlementManagerActor {
    type Result = ();

    fn handle(&mut self, msg: ClaimFinished, _: &mut Context<Self>) {
        self.busy.remove(&msg.key);
        if let Some(child) = self.children.remove(&msg.key) {
            debug!(key = %msg.key, tx = ?msg.tx_hash, "claim finished; removing child");
            child.do_send(Halt);
        }
    }
}

impl Handler<Emitted<SaleEvent>> for ExcessSettlementManagerActor {
    type Result = ();

    fn handle(&mut self, msg: Emitted<SaleEvent>, _: &mut Context<Self>) {
        self.notifier.emit(msg.0);
    }
}

impl Handler<Subscribe> for ExcessSettlementManagerActor {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) {
        self.notifier.subscribe(msg.recipient);
    }
}

impl Handler<GetActiveClaims> for ExcessSettlementManagerActor {
    type Result = ActiveClaims;

    fn handle(&mut self, _: GetActiveClaims, _: &mut Context<Self>) -> ActiveClaims {
        ActiveClaims(self.children.keys().cloned().collect())
    }
}

impl Handler<Halt> for ExcessSettlementManagerActor {
    type Result = ();

    fn handle(&mut self, _: Halt, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}
