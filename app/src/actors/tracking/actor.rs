//! Tracker actor implementation

use actix::prelude::*;
use ethers_core::types::H256;
use tracing::{debug, info, warn};

use crate::actors::tracking::messages::*;
use crate::actors::{Halt, Subscribe};
use crate::clients::{ClientError, ClientHandles};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics;
use crate::types::{ProjectRef, SaleEvent, TokenId};
use machine::{Invocations, Invoking, Notifier};

const ACTOR: &str = "tracking";

/// Follows one purchase transaction to its minted, indexed token.
pub struct TrackingActor {
    cfg: EngineConfig,
    clients: ClientHandles,
    project: ProjectRef,
    tx_hash: H256,
    state: TrackingState,
    token: Option<TokenId>,
    sync_attempts: u32,
    error: Option<String>,
    notifier: Notifier<SaleEvent>,
    parent: Recipient<TrackingFinished>,
    invocations: Invocations,
}

impl TrackingActor {
    /// Create a tracker reporting its terminal outcome to `parent`.
    pub fn new(
        cfg: EngineConfig,
        clients: ClientHandles,
        project: ProjectRef,
        tx_hash: H256,
        parent: Recipient<TrackingFinished>,
    ) -> Self {
        Self {
            cfg,
            clients,
            project,
            tx_hash,
            state: TrackingState::AwaitingConfirmation,
            token: None,
            sync_attempts: 0,
            error: None,
            notifier: Notifier::new(),
            parent,
            invocations: Invocations::new(),
        }
    }

    fn set_state(&mut self, state: TrackingState) {
        if self.state != state {
            debug!(tx = ?self.tx_hash, %state, "tracking transition");
        }
        self.state = state;
        metrics::record_transition(ACTOR, &state.to_string());
    }

    fn fail(&mut self, message: String) {
        warn!(tx = ?self.tx_hash, %message, "purchase tracking failed");
        metrics::record_task_failure(ACTOR);
        self.error = Some(message.clone());
        self.set_state(TrackingState::Error);
        self.invocations.invalidate();
        self.notifier.emit(SaleEvent::Error { message: message.clone() });
        let _ = self.parent.do_send(TrackingFinished {
            tx_hash: self.tx_hash,
            outcome: TrackingOutcome::Failed(message),
        });
    }

    fn enter_awaiting_confirmation(&mut self, ctx: &mut Context<Self>) {
        self.set_state(TrackingState::AwaitingConfirmation);
        self.notifier
            .emit(SaleEvent::AwaitingPurchaseConfirmations { tx_hash: self.tx_hash });

        let chain = self.clients.chain.clone();
        let tx_hash = self.tx_hash;
        let confirmations = self.cfg.confirmations;
        let task = async move {
            let receipt = chain.wait_for_receipt(tx_hash, confirmations).await?;
            if !receipt.status {
                return Err(EngineError::Client(ClientError::Reverted(
                    "purchase transaction reverted on-chain".into(),
                )));
            }
            chain.mint_event(&receipt).ok_or(EngineError::MissingMintEvent)
        };
        self.invoke(ctx, task, |actor, ctx, result| match result {
            Ok(mint) => {
                info!(tx = ?actor.tx_hash, token = %mint.token, "purchase confirmed");
                actor.token = Some(mint.token);
                actor.enter_awaiting_token_sync(ctx);
            }
            Err(err) => actor.fail(err.message()),
        });
    }

    fn enter_awaiting_token_sync(&mut self, ctx: &mut Context<Self>) {
        self.set_state(TrackingState::AwaitingTokenSync);
        self.notifier.emit(SaleEvent::AwaitingTokenSync { tx_hash: self.tx_hash });
        self.sync_probe(ctx);
    }

    /// One index probe per call; a miss retries after a fixed delay until
    /// the budget runs out.
    fn sync_probe(&mut self, ctx: &mut Context<Self>) {
        let Some(token) = self.token else {
            return self.fail(EngineError::MissingMintEvent.message());
        };
        let indexer = self.clients.indexer.clone();
        let marketplace = self.clients.marketplace.clone();
        let task = async move {
            if indexer.token_by_id(&token).await?.is_none() {
                return Ok(false);
            }
            match marketplace {
                Some(marketplace) => marketplace.has_token(&token).await,
                None => Ok(true),
            }
        };
        self.invoke(ctx, task, |actor, ctx, result: Result<bool, ClientError>| match result {
            Ok(true) => actor.finish(),
            Ok(false) => actor.retry_sync(ctx, None),
            Err(err) => actor.retry_sync(ctx, Some(err.to_string())),
        });
    }

    fn retry_sync(&mut self, ctx: &mut Context<Self>, probe_error: Option<String>) {
        self.sync_attempts += 1;
        if self.sync_attempts >= self.cfg.token_sync_retries {
            // a persistent read failure is reported as such; a clean miss
            // means the mint succeeded and only the index is behind
            let message = probe_error.unwrap_or_else(|| {
                "the purchase was mined but indexing is taking longer than expected; \
                 the token will appear once the index catches up"
                    .into()
            });
            self.fail(message);
        } else {
            let interval = self.cfg.token_sync_interval;
            self.delay(ctx, interval, |actor, ctx| actor.sync_probe(ctx));
        }
    }

    fn finish(&mut self) {
        let Some(token) = self.token else {
            return self.fail(EngineError::MissingMintEvent.message());
        };
        info!(tx = ?self.tx_hash, %token, "token indexed and ready");
        self.set_state(TrackingState::TokenReady);
        self.invocations.invalidate();
        self.notifier.emit(SaleEvent::TokenReady { token });
        let _ = self.parent.do_send(TrackingFinished {
            tx_hash: self.tx_hash,
            outcome: TrackingOutcome::TokenReady(token),
        });
    }
}

impl Actor for TrackingActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        metrics::record_spawn(ACTOR);
        debug!(tx = ?self.tx_hash, project = %self.project, "tracking purchase");
        self.enter_awaiting_confirmation(ctx);
    }
}

impl Invoking for TrackingActor {
    fn invocations(&self) -> &Invocations {
        &self.invocations
    }

    fn invocations_mut(&mut self) -> &mut Invocations {
        &mut self.invocations
    }
}

impl Handler<Subscribe> for TrackingActor {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) {
        self.notifier.subscribe(msg.recipient);
    }
}

impl Handler<GetTrackingSnapshot> for TrackingActor {
    type Result = TrackingSnapshot;

    fn handle(&mut self, _: GetTrackingSnapshot, _: &mut Context<Self>) -> TrackingSnapshot {
        TrackingSnapshot {
            state: self.state,
            tx_hash: self.tx_hash,
            token: self.token,
            sync_attempts: self.sync_attempts,
            error: self.error.clone(),
        }
    }
}

impl Handler<Halt> for TrackingActor {
    type Result = ();

    fn handle(&mut self, _: Halt, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}
