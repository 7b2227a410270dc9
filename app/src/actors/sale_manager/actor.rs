//! Sale manager actor implementation

use actix::prelude::*;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::actors::live_data::{LiveDataActor, LiveDataFailed, LiveSaleDataFetched};
use crate::actors::purchase::{self, PurchaseActor};
use crate::actors::ram_bid::RamBidActor;
use crate::actors::sale_manager::messages::*;
use crate::actors::sale_manager::router::{self, Route, RouterInputs};
use crate::actors::tracking::TrackingManagerActor;
use crate::actors::{Halt, Subscribe};
use crate::clients::ClientHandles;
use crate::config::EngineConfig;
use crate::metrics;
use crate::types::{now_secs, LiveSaleData, ProjectRef, ProjectSaleData, SaleEvent};
use machine::{Emitted, Invocations, Invoking, Notifier};

const ACTOR: &str = "sale_manager";

/// Root orchestrator for one project's sale.
pub struct SaleManagerActor {
    cfg: EngineConfig,
    project_ref: ProjectRef,
    clients: Option<ClientHandles>,
    project: Option<ProjectSaleData>,
    live: Option<LiveSaleData>,
    live_tx: watch::Sender<Option<LiveSaleData>>,
    state: ManagerState,
    error: Option<String>,
    ineligible_reason: Option<String>,
    poller: Option<Addr<LiveDataActor>>,
    purchase: Option<Addr<PurchaseActor>>,
    ram: Option<Addr<RamBidActor>>,
    tracking: Option<Addr<TrackingManagerActor>>,
    notifier: Notifier<SaleEvent>,
    invocations: Invocations,
}

impl SaleManagerActor {
    /// Create a manager for `project_ref`, fetching its snapshot on start.
    pub fn new(
        cfg: EngineConfig,
        project_ref: ProjectRef,
        clients: Option<ClientHandles>,
    ) -> Self {
        let (live_tx, _) = watch::channel(None);
        Self {
            cfg,
            project_ref,
            clients,
            project: None,
            live: None,
            live_tx,
            state: ManagerState::FetchingProjectData,
            error: None,
            ineligible_reason: None,
            poller: None,
            purchase: None,
            ram: None,
            tracking: None,
            notifier: Notifier::new(),
            invocations: Invocations::new(),
        }
    }

    /// Rebuild a manager from a serialized snapshot, re-injecting the live
    /// client handles. Children are not serialized; the router respawns
    /// whatever the restored context calls for.
    pub fn hydrate(
        snapshot: ManagerSnapshot,
        cfg: EngineConfig,
        clients: Option<ClientHandles>,
    ) -> Self {
        let mut actor = Self::new(cfg, snapshot.project_ref, clients);
        actor.state = snapshot.state;
        actor.project = snapshot.project;
        actor.live = snapshot.live.clone();
        actor.error = snapshot.error;
        actor.ineligible_reason = snapshot.ineligible_reason;
        let _ = actor.live_tx.send(snapshot.live);
        actor
    }

    fn set_state(&mut self, state: ManagerState) {
        if self.state != state {
            info!(project = %self.project_ref, from = %self.state, to = %state, "sale manager transition");
        }
        self.state = state;
        metrics::record_transition(ACTOR, &state.to_string());
    }

    fn enter_fetching_project_data(&mut self, ctx: &mut Context<Self>) {
        let Some(clients) = self.clients.clone() else {
            self.set_state(ManagerState::Idle);
            return;
        };
        self.set_state(ManagerState::FetchingProjectData);
        let project_ref = self.project_ref;
        self.invoke(
            ctx,
            async move { clients.indexer.project_sale_data(&project_ref).await },
            |actor, ctx, result| {
                match result {
                    Ok(project) => actor.project = Some(project),
                    Err(err) => {
                        warn!(project = %actor.project_ref, error = %err, "project fetch failed");
                        actor.error = Some(err.to_string());
                    }
                }
                actor.invocations_mut().invalidate();
                actor.route(ctx);
            },
        );
    }

    /// Re-run the routing decision against the current context. Called
    /// after every context mutation, whatever state the manager is in, so
    /// terminal-ish states recover as soon as their cause goes away.
    fn route(&mut self, ctx: &mut Context<Self>) {
        if self.state == ManagerState::FetchingProjectData
            && self.project.is_none()
            && self.error.is_none()
        {
            // still waiting for the snapshot fetch to settle
            return;
        }
        let inputs = RouterInputs {
            error: self.error.as_deref(),
            project: self.project.as_ref(),
            live: self.live.as_ref(),
            account: self.clients.as_ref().and_then(|c| c.account()),
            clients_available: self.clients.is_some(),
            now: now_secs(),
        };
        let next = match router::decide(&inputs) {
            Route::Error => ManagerState::Error,
            Route::Ineligible(reason) => {
                self.ineligible_reason = Some(reason);
                ManagerState::ProjectIneligible
            }
            Route::SaleComplete => ManagerState::ProjectSaleComplete,
            Route::Purchase => ManagerState::ReadyForPurchase,
            Route::RamBid => ManagerState::ReadyForRamBid,
            Route::Idle => ManagerState::Idle,
        };
        self.transition_to(next, ctx);
    }

    fn transition_to(&mut self, next: ManagerState, ctx: &mut Context<Self>) {
        if next != self.state {
            // leaving a ready state stops the orchestrator it owned
            match self.state {
                ManagerState::ReadyForPurchase => self.stop_purchase(),
                ManagerState::ReadyForRamBid => self.stop_ram(),
                _ => {}
            }
            self.set_state(next);
            match next {
                ManagerState::ReadyForPurchase => self.spawn_purchase(ctx),
                ManagerState::ReadyForRamBid => self.spawn_ram(ctx),
                ManagerState::Error => {
                    let message = self.error.clone().unwrap_or_else(|| "unknown error".into());
                    self.notifier.emit(SaleEvent::Error { message });
                }
                ManagerState::ProjectIneligible => {
                    let reason = self
                        .ineligible_reason
                        .clone()
                        .unwrap_or_else(|| "project is not eligible for primary sale".into());
                    self.notifier.emit(SaleEvent::Ineligible { reason });
                }
                _ => {}
            }
        }
        self.ensure_poller(ctx);
    }

    /// The poller runs whenever a client is available and the sale still
    /// needs watching; terminal states let it go.
    fn ensure_poller(&mut self, ctx: &mut Context<Self>) {
        let want = self.clients.is_some()
            && self.project.is_some()
            && matches!(
                self.state,
                ManagerState::Idle | ManagerState::ReadyForPurchase | ManagerState::ReadyForRamBid
            );

        if want && self.poller.is_none() {
            let clients = self.clients.as_ref().expect("checked above");
            let project = self.project.clone().expect("checked above");
            debug!(project = %self.project_ref, "spawning live data poller");
            let poller = LiveDataActor::new(
                project,
                clients.chain.clone(),
                self.cfg.live_data_interval,
                ctx.address().recipient::<LiveSaleDataFetched>(),
                ctx.address().recipient::<LiveDataFailed>(),
            )
            .start();
            self.poller = Some(poller);
        } else if !want {
            if let Some(poller) = self.poller.take() {
                debug!(project = %self.project_ref, "halting live data poller");
                poller.do_send(Halt);
            }
        }
    }

    fn spawn_purchase(&mut self, ctx: &mut Context<Self>) {
        let Some(clients) = self.clients.clone() else { return };
        let Some(project) = self.project.clone() else { return };
        debug!(project = %self.project_ref, "spawning purchase orchestrator");
        let child = PurchaseActor::new(
            self.cfg.clone(),
            project,
            clients,
            self.live_tx.subscribe(),
            self.tracking.clone(),
        )
        .start();
        child.do_send(Subscribe { recipient: ctx.address().recipient::<Emitted<SaleEvent>>() });
        self.purchase = Some(child);
    }

    fn stop_purchase(&mut self) {
        if let Some(child) = self.purchase.take() {
            debug!(project = %self.project_ref, "halting purchase orchestrator");
            child.do_send(Halt);
        }
    }

    fn spawn_ram(&mut self, ctx: &mut Context<Self>) {
        let Some(clients) = self.clients.clone() else { return };
        let Some(project) = self.project.clone() else { return };
        debug!(project = %self.project_ref, "spawning ram bid orchestrator");
        let child =
            RamBidActor::new(self.cfg.clone(), project, clients, self.live_tx.subscribe()).start();
        child.do_send(Subscribe { recipient: ctx.address().recipient::<Emitted<SaleEvent>>() });
        self.ram = Some(child);
    }

    fn stop_ram(&mut self) {
        if let Some(child) = self.ram.take() {
            debug!(project = %self.project_ref, "halting ram bid orchestrator");
            child.do_send(Halt);
        }
    }

    fn halt_children(&mut self) {
        self.stop_purchase();
        self.stop_ram();
        if let Some(poller) = self.poller.take() {
            poller.do_send(Halt);
        }
    }
}

impl Actor for SaleManagerActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        metrics::record_spawn(ACTOR);
        if self.project.is_some() {
            // hydrated: no children exist yet, so re-enter the router from
            // idle and let it respawn whatever the restored context needs
            self.state = ManagerState::Idle;
            self.route(ctx);
        } else {
            self.enter_fetching_project_data(ctx);
        }
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        // children never outlive the manager
        self.halt_children();
        Running::Stop
    }
}

impl Invoking for SaleManagerActor {
    fn invocations(&self) -> &Invocations {
        &self.invocations
    }

    fn invocations_mut(&mut self) -> &mut Invocations {
        &mut self.invocations
    }
}

impl Handler<LiveSaleDataFetched> for SaleManagerActor {
    type Result = ();

    fn handle(&mut self, msg: LiveSaleDataFetched, ctx: &mut Context<Self>) {
        if !msg.data.price_is_configured {
            self.ineligible_reason = Some("project price has not been configured".into());
        }
        self.live = Some(msg.data.clone());
        let _ = self.live_tx.send(Some(msg.data));
        self.route(ctx);
    }
}

impl Handler<LiveDataFailed> for SaleManagerActor {
    type Result = ();

    fn handle(&mut self, msg: LiveDataFailed, ctx: &mut Context<Self>) {
        // the poller is terminal after a failure; drop it and surface the
        // error. A client update respawns a fresh one.
        warn!(project = %self.project_ref, message = %msg.message, "live data poller failed");
        if let Some(poller) = self.poller.take() {
            poller.do_send(Halt);
        }
        self.error = Some(msg.message);
        self.route(ctx);
    }
}

impl Handler<ClientsUpdated> for SaleManagerActor {
    type Result = ();

    fn handle(&mut self, msg: ClientsUpdated, ctx: &mut Context<Self>) {
        info!(project = %self.project_ref, connected = msg.clients.is_some(), "client bundle updated");
        self.clients = msg.clients;
        self.error = None;
        // children hold the old handles; respawn them against the new ones
        self.stop_purchase();
        self.stop_ram();
        if let Some(poller) = self.poller.take() {
            poller.do_send(Halt);
        }
        if self.clients.is_some() {
            self.enter_fetching_project_data(ctx);
        } else {
            self.route(ctx);
        }
    }
}

impl Handler<TrackingAvailabilityChanged> for SaleManagerActor {
    type Result = ();

    fn handle(&mut self, msg: TrackingAvailabilityChanged, _: &mut Context<Self>) {
        self.tracking = msg.tracking.clone();
        // relay to a live purchase orchestrator
        if let Some(purchase) = &self.purchase {
            purchase.do_send(purchase::TrackingAvailability { tracking: msg.tracking });
        }
    }
}

impl Handler<InjectError> for SaleManagerActor {
    type Result = ();

    fn handle(&mut self, msg: InjectError, ctx: &mut Context<Self>) {
        self.error = Some(msg.message);
        self.route(ctx);
    }
}

impl Handler<Emitted<SaleEvent>> for SaleManagerActor {
    type Result = ();

    fn handle(&mut self, msg: Emitted<SaleEvent>, _: &mut Context<Self>) {
        // relay child lifecycle notifications to our own subscribers
        self.notifier.emit(msg.0);
    }
}

impl Handler<Subscribe> for SaleManagerActor {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) {
        self.notifier.subscribe(msg.recipient);
    }
}

impl Handler<GetManagerSnapshot> for SaleManagerActor {
    type Result = ManagerSnapshot;

    fn handle(&mut self, _: GetManagerSnapshot, _: &mut Context<Self>) -> ManagerSnapshot {
        ManagerSnapshot {
            state: self.state,
            project_ref: self.project_ref,
            project: self.project.clone(),
            live: self.live.clone(),
            error: self.error.clone(),
            ineligible_reason: self.ineligible_reason.clone(),
        }
    }
}

impl Handler<Halt> for SaleManagerActor {
    type Result = ();

    fn handle(&mut self, _: Halt, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}
