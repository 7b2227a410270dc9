//! Per-receipt claim orchestrator

use actix::prelude::*;
use tracing::{debug, info, warn};

use crate::actors::settlement::messages::*;
use crate::actors::{Halt, Subscribe};
use crate::clients::{ClientError, ClientHandles, ContractCall};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics;
use crate::types::{SaleEvent, SettlementReceipt};
use machine::{Invocations, Invoking, Notifier};

const ACTOR: &str = "settlement_claim";

/// Claims the excess settlement funds of one receipt.
pub struct SettlementClaimActor {
    cfg: EngineConfig,
    clients: ClientHandles,
    receipt: SettlementReceipt,
    state: ClaimState,
    tx_hash: Option<ethers_core::types::H256>,
    error: Option<String>,
    notifier: Notifier<SaleEvent>,
    parent: ClaimParent,
    invocations: Invocations,
}

/// Manager recipients a claim child reports to.
#[derive(Clone)]
pub struct ClaimParent {
    /// Busy bracketing, so the manager never stops a mid-claim child
    pub busy: Recipient<ClaimBusy>,
    /// Terminal claim report
    pub finished: Recipient<ClaimFinished>,
}

impl SettlementClaimActor {
    /// Create an idle claim orchestrator for `receipt`.
    pub fn new(
        cfg: EngineConfig,
        clients: ClientHandles,
        receipt: SettlementReceipt,
        parent: ClaimParent,
    ) -> Self {
        Self {
            cfg,
            clients,
            receipt,
            state: ClaimState::Idle,
            tx_hash: None,
            error: None,
            notifier: Notifier::new(),
            parent,
            invocations: Invocations::new(),
        }
    }

    fn set_state(&mut self, state: ClaimState) {
        if self.state != state {
            debug!(receipt = %self.receipt.key(), %state, "claim transition");
        }
        self.state = state;
        metrics::record_transition(ACTOR, &state.to_string());
    }

    fn set_busy(&mut self, busy: bool) {
        let _ = self.parent.busy.do_send(ClaimBusy { key: self.receipt.key(), busy });
    }
}

impl Actor for SettlementClaimActor {
    type Context = Context<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        metrics::record_spawn(ACTOR);
    }
}

impl Invoking for SettlementClaimActor {
    fn invocations(&self) -> &Invocations {
        &self.invocations
    }

    fn invocations_mut(&mut self) -> &mut Invocations {
        &mut self.invocations
    }
}

impl Handler<ClaimExcess> for SettlementClaimActor {
    type Result = ();

    fn handle(&mut self, _: ClaimExcess, ctx: &mut Context<Self>) {
        if self.state != ClaimState::Idle {
            warn!(state = %self.state, "ignoring ClaimExcess");
            return;
        }
        self.set_state(ClaimState::Claiming);
        self.set_busy(true);

        let clients = self.clients.clone();
        let receipt = self.receipt.clone();
        let confirmations = self.cfg.confirmations;
        let task = async move {
            let tx = clients
                .wallet
                .submit(ContractCall::ClaimExcessSettlementFunds {
                    minter: receipt.minter,
                    project: receipt.project,
                    to: receipt.bidder,
                })
                .await?;
            let mined = clients.chain.wait_for_receipt(tx, confirmations).await?;
            if !mined.status {
                return Err(EngineError::Client(ClientError::Reverted(
                    "settlement claim reverted on-chain".into(),
                )));
            }
            Ok(tx)
        };

        self.invoke(ctx, task, |actor, _ctx, result| {
            actor.set_busy(false);
            match result {
                Ok(tx_hash) => {
                    info!(receipt = %actor.receipt.key(), ?tx_hash, "excess settlement claimed");
                    metrics::SETTLEMENTS_CLAIMED.inc();
                    actor.tx_hash = Some(tx_hash);
                    actor.set_state(ClaimState::Claimed);
                    actor.invocations_mut().invalidate();
                    actor.notifier.emit(SaleEvent::SettlementClaimed {
                        minter: actor.receipt.minter,
                        bidder: actor.receipt.bidder,
                        excess: actor.receipt.excess,
                    });
                    let _ = actor.parent.finished.do_send(ClaimFinished {
                        key: actor.receipt.key(),
                        tx_hash: Some(tx_hash),
                    });
                }
                Err(err) if err.is_user_rejection() => {
                    info!("claim declined in wallet");
                    actor.set_state(ClaimState::Idle);
                    actor.invocations_mut().invalidate();
                }
                Err(err) => {
                    let message = err.message();
                    warn!(receipt = %actor.receipt.key(), %message, "settlement claim failed");
                    metrics::record_task_failure(ACTOR);
                    actor.error = Some(message.clone());
                    actor.set_state(ClaimState::Error);
                    actor.invocations_mut().invalidate();
                    actor.notifier.emit(SaleEvent::Error { message });
                }
            }
        });
    }
}

impl Handler<Subscribe> for SettlementClaimActor {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) {
        self.notifier.subscribe(msg.recipient);
    }
}

impl Handler<GetClaimSnapshot> for SettlementClaimActor {
    type Result = ClaimSnapshot;

    fn handle(&mut self, _: GetClaimSnapshot, _: &mut Context<Self>) -> ClaimSnapshot {
        ClaimSnapshot { state: self.state, tx_hash: self.tx_hash, error: self.error.clone() }
    }
}

impl Handler<Halt> for SettlementClaimActor {
    type Result = ();

    fn handle(&mut self, _: Halt, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}
