//! Purchase orchestrator actor

use actix::prelude::*;
use ethers_core::types::U256;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actors::purchase::eligibility::{self, Eligibility};
use crate::actors::purchase::messages::*;
use crate::actors::purchase::minters::{self, SubmitInputs};
use crate::actors::tracking::{TrackPurchase, TrackingManagerActor};
use crate::actors::{Halt, Subscribe};
use crate::clients::{ClientHandles, ContractCall};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics;
use crate::types::{now_secs, LiveSaleData, MinterSpec, ProjectSaleData, SaleEvent};
use machine::{Invocations, Invoking, Notifier};

const ACTOR: &str = "purchase";

/// Orchestrates one user's purchase attempt on a directly purchasable
/// minter. Spawned by the sale manager while the project is ready for
/// purchase; halted when it no longer is.
pub struct PurchaseActor {
    cfg: EngineConfig,
    project: ProjectSaleData,
    clients: ClientHandles,
    live: watch::Receiver<Option<LiveSaleData>>,
    tracking: Option<Addr<TrackingManagerActor>>,
    notifier: Notifier<SaleEvent>,
    state: PurchaseState,
    attempt: AttemptContext,
    attempt_id: Uuid,
    invocations: Invocations,
}

impl PurchaseActor {
    /// Create a fresh orchestrator starting at the eligibility check.
    pub fn new(
        cfg: EngineConfig,
        project: ProjectSaleData,
        clients: ClientHandles,
        live: watch::Receiver<Option<LiveSaleData>>,
        tracking: Option<Addr<TrackingManagerActor>>,
    ) -> Self {
        Self {
            cfg,
            project,
            clients,
            live,
            tracking,
            notifier: Notifier::new(),
            state: PurchaseState::GettingEligibility,
            attempt: AttemptContext::default(),
            attempt_id: Uuid::new_v4(),
            invocations: Invocations::new(),
        }
    }

    /// Rebuild an orchestrator from a serialized snapshot, re-injecting
    /// the live client handles the snapshot deliberately excludes.
    pub fn hydrate(
        snapshot: PurchaseSnapshot,
        cfg: EngineConfig,
        project: ProjectSaleData,
        clients: ClientHandles,
        live: watch::Receiver<Option<LiveSaleData>>,
        tracking: Option<Addr<TrackingManagerActor>>,
    ) -> Self {
        let mut actor = Self::new(cfg, project, clients, live, tracking);
        actor.state = snapshot.state;
        actor.attempt = snapshot.attempt;
        actor
    }

    fn set_state(&mut self, state: PurchaseState) {
        if self.state != state {
            debug!(project = %self.project.project, attempt = %self.attempt_id, %state, "purchase transition");
        }
        self.state = state;
        metrics::record_transition(ACTOR, &state.to_string());
    }

    fn emit(&mut self, event: SaleEvent) {
        self.notifier.emit(event);
    }

    fn fail(&mut self, err: EngineError) {
        let message = err.message();
        warn!(project = %self.project.project, %message, "purchase attempt failed");
        metrics::record_task_failure(ACTOR);
        self.attempt.error = Some(message.clone());
        self.set_state(PurchaseState::Error);
        self.invocations.invalidate();
        self.emit(SaleEvent::Error { message });
    }

    /// Price per token for the intended spend: the freshest on-chain read
    /// when the poller has one, the project snapshot otherwise.
    fn required_spend(&self) -> U256 {
        self.live
            .borrow()
            .as_ref()
            .map(|live| live.token_price)
            .unwrap_or(self.project.base_price)
    }

    fn enter_getting_eligibility(&mut self, ctx: &mut Context<Self>) {
        self.set_state(PurchaseState::GettingEligibility);
        let clients = self.clients.clone();
        let project = self.project.clone();
        self.invoke(ctx, eligibility::check(clients, project), |actor, ctx, result| {
            match result {
                Ok(Eligibility::Eligible(data)) => {
                    actor.attempt.eligibility = Some(data);
                    actor.enter_waiting_for_start(ctx);
                }
                Ok(Eligibility::Ineligible { reason }) => {
                    info!(project = %actor.project.project, %reason, "caller ineligible");
                    actor.attempt.ineligibility_reason = Some(reason.clone());
                    actor.set_state(PurchaseState::UserIneligible);
                    actor.invocations_mut().invalidate();
                    actor.emit(SaleEvent::Ineligible { reason });
                }
                Err(err) => actor.fail(err),
            }
        });
    }

    fn enter_waiting_for_start(&mut self, ctx: &mut Context<Self>) {
        self.set_state(PurchaseState::WaitingForStart);
        self.check_sale_open(ctx);
    }

    /// Local guard, re-evaluated on a timer; no network call involved.
    fn check_sale_open(&mut self, ctx: &mut Context<Self>) {
        if self.sale_open() {
            self.set_state(PurchaseState::ReadyForPurchase);
            self.invocations.invalidate();
        } else {
            self.delay(ctx, self.cfg.sale_start_check_interval, |actor, ctx| {
                actor.check_sale_open(ctx)
            });
        }
    }

    fn sale_open(&self) -> bool {
        if !self.project.sale_started(now_secs()) {
            return false;
        }
        let paused = self
            .live
            .borrow()
            .as_ref()
            .map(|live| live.paused)
            .unwrap_or(self.project.paused);
        // the artist may buy through a paused sale
        !paused || self.clients.account() == Some(self.project.artist_address)
    }

    fn enter_approving_erc20(&mut self, ctx: &mut Context<Self>, amount: U256) {
        self.set_state(PurchaseState::ApprovingErc20);
        let clients = self.clients.clone();
        let confirmations = self.cfg.confirmations;
        let minter = self.project.minter.as_ref().map(|m| m.address);
        let token = self.attempt.eligibility.as_ref().and_then(|e| e.erc20.as_ref()).map(|e| e.token);

        let task = async move {
            let (Some(spender), Some(token)) = (minter, token) else {
                return Err(EngineError::IncompleteEligibility);
            };
            let tx = clients.wallet.submit(ContractCall::Approve { token, spender, amount }).await?;
            let receipt = clients.chain.wait_for_receipt(tx, confirmations).await?;
            if !receipt.status {
                return Err(crate::clients::ClientError::Reverted(
                    "approval transaction reverted".into(),
                )
                .into());
            }
            Ok(())
        };

        self.invoke(ctx, task, move |actor, ctx, result: Result<(), EngineError>| match result {
            Ok(()) => {
                if let Some(erc20) =
                    actor.attempt.eligibility.as_mut().and_then(|e| e.erc20.as_mut())
                {
                    erc20.allowance = amount;
                }
                actor.enter_initiating(ctx);
            }
            Err(err) if err.is_user_rejection() => {
                info!("approval declined in wallet");
                actor.set_state(PurchaseState::AwaitingErc20ApprovalAmount);
                actor.invocations_mut().invalidate();
            }
            Err(err) => actor.fail(err),
        });
    }

    fn enter_initiating(&mut self, ctx: &mut Context<Self>) {
        let Some(account) = self.clients.account() else {
            return self.fail(EngineError::NoAccount);
        };
        let Some(eligibility) = self.attempt.eligibility.clone() else {
            return self.fail(EngineError::IncompleteEligibility);
        };

        self.set_state(PurchaseState::InitiatingPurchase);
        let clients = self.clients.clone();
        let project = self.project.clone();
        let inputs = SubmitInputs {
            account,
            to: self.attempt.recipient.unwrap_or(account),
            value: self.required_spend(),
            eligibility,
        };

        self.invoke(
            ctx,
            minters::submit_purchase(clients, project, inputs),
            |actor, _ctx, result| match result {
                Ok(tx_hash) => {
                    info!(project = %actor.project.project, ?tx_hash, "purchase initiated");
                    metrics::PURCHASES_INITIATED.inc();
                    actor.attempt.tx_hash = Some(tx_hash);
                    actor.set_state(PurchaseState::PurchaseInitiated);
                    actor.invocations_mut().invalidate();
                    if let Some(tracking) = &actor.tracking {
                        tracking.do_send(TrackPurchase {
                            project: actor.project.project,
                            tx_hash,
                        });
                    }
                    let chain_id = actor.clients.chain.chain_id();
                    actor.emit(SaleEvent::PurchaseInitiated { tx_hash, chain_id });
                }
                Err(err) if err.is_user_rejection() => {
                    // not an error: back to the interactive state, untouched
                    info!("purchase declined in wallet");
                    actor.set_state(PurchaseState::ReadyForPurchase);
                    actor.invocations_mut().invalidate();
                }
                Err(err) => actor.fail(err),
            },
        );
    }
}

impl Actor for PurchaseActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        metrics::record_spawn(ACTOR);
        match self.state {
            PurchaseState::GettingEligibility => self.enter_getting_eligibility(ctx),
            PurchaseState::WaitingForStart => self.enter_waiting_for_start(ctx),
            // a signature prompt cannot be resumed across a hydration
            PurchaseState::ApprovingErc20 | PurchaseState::InitiatingPurchase => {
                warn!("hydrated mid-transaction; returning to ready state");
                self.set_state(PurchaseState::ReadyForPurchase);
            }
            _ => {}
        }
    }
}

impl Invoking for PurchaseActor {
    fn invocations(&self) -> &Invocations {
        &self.invocations
    }

    fn invocations_mut(&mut self) -> &mut Invocations {
        &mut self.invocations
    }
}

impl Handler<InitiatePurchase> for PurchaseActor {
    type Result = ();

    fn handle(&mut self, msg: InitiatePurchase, ctx: &mut Context<Self>) {
        if self.state != PurchaseState::ReadyForPurchase {
            warn!(state = %self.state, "ignoring InitiatePurchase outside readyForPurchase");
            return;
        }
        let Some(account) = self.clients.account() else {
            warn!("no wallet account connected; purchase not started");
            return;
        };
        self.attempt.recipient = Some(msg.to.unwrap_or(account));

        let needs_approval = match self.project.minter.as_ref().map(|m| &m.spec) {
            Some(MinterSpec::Erc20 { .. }) => {
                let allowance = self
                    .attempt
                    .eligibility
                    .as_ref()
                    .and_then(|e| e.erc20.as_ref())
                    .map(|e| e.allowance)
                    .unwrap_or_default();
                allowance < self.required_spend()
            }
            _ => false,
        };

        if needs_approval {
            debug!("allowance below required spend; routing through approval");
            self.set_state(PurchaseState::AwaitingErc20ApprovalAmount);
        } else {
            self.enter_initiating(ctx);
        }
    }
}

impl Handler<ApproveSpend> for PurchaseActor {
    type Result = ();

    fn handle(&mut self, msg: ApproveSpend, ctx: &mut Context<Self>) {
        if self.state != PurchaseState::AwaitingErc20ApprovalAmount {
            warn!(state = %self.state, "ignoring ApproveSpend outside the approval state");
            return;
        }
        if msg.amount < self.required_spend() {
            warn!(amount = %msg.amount, "approval amount below required spend; ignored");
            return;
        }
        self.attempt.approval_amount = Some(msg.amount);
        self.enter_approving_erc20(ctx, msg.amount);
    }
}

impl Handler<ResetPurchase> for PurchaseActor {
    type Result = ();

    fn handle(&mut self, _: ResetPurchase, ctx: &mut Context<Self>) {
        match self.state {
            PurchaseState::ApprovingErc20 | PurchaseState::InitiatingPurchase => {
                warn!("cannot reset while a transaction is in flight");
            }
            _ => {
                self.attempt = AttemptContext::default();
                self.attempt_id = Uuid::new_v4();
                debug!(attempt = %self.attempt_id, "resetting purchase attempt");
                self.enter_getting_eligibility(ctx);
            }
        }
    }
}

impl Handler<TrackingAvailability> for PurchaseActor {
    type Result = ();

    fn handle(&mut self, msg: TrackingAvailability, _: &mut Context<Self>) {
        self.tracking = msg.tracking;
    }
}

impl Handler<Subscribe> for PurchaseActor {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) {
        self.notifier.subscribe(msg.recipient);
    }
}

impl Handler<GetPurchaseSnapshot> for PurchaseActor {
    type Result = PurchaseSnapshot;

    fn handle(&mut self, _: GetPurchaseSnapshot, _: &mut Context<Self>) -> PurchaseSnapshot {
        PurchaseSnapshot { state: self.state, attempt: self.attempt.clone() }
    }
}

impl Handler<Halt> for PurchaseActor {
    type Result = ();

    fn handle(&mut self, _: Halt, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}
