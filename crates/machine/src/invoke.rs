//! Epoch-tagged invoked tasks
//!
//! A state binds at most one asynchronous task; entering a state starts it
//! and leaving the state must make any in-flight completion inert. Rather
//! than cancelling futures directly, every invocation is tagged with the
//! epoch current at spawn time and the settlement closure only runs if that
//! epoch is still current. Re-entering a state begins a new epoch, so a
//! retry supersedes the previous attempt and stale results are dropped on
//! the floor. Stopping the actor drops the spawned future outright.

use std::future::Future;
use std::time::Duration;

use actix::prelude::*;
use tracing::trace;

/// Opaque token identifying one invocation generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Epoch(u64);

/// Per-actor invocation generation counter.
#[derive(Debug, Default)]
pub struct Invocations {
    current: u64,
}

impl Invocations {
    /// Create a fresh counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new invocation generation, superseding any in-flight task.
    pub fn begin(&mut self) -> Epoch {
        self.current += 1;
        Epoch(self.current)
    }

    /// Invalidate pending completions without starting a new task.
    ///
    /// Used when entering a state that has no invoked task.
    pub fn invalidate(&mut self) {
        self.current += 1;
    }

    /// Whether `epoch` is still the live generation.
    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current == epoch.0
    }
}

/// Actors that run epoch-guarded invoked tasks.
///
/// Implementors expose their [`Invocations`] counter; the provided methods
/// wire task settlement back into the actor with the stale-completion guard
/// applied.
pub trait Invoking: Actor<Context = Context<Self>> {
    /// Access the invocation counter.
    fn invocations(&self) -> &Invocations;

    /// Mutable access to the invocation counter.
    fn invocations_mut(&mut self) -> &mut Invocations;

    /// Start `task` as the state's invoked task.
    ///
    /// `settle` runs with the actor borrowed mutably when the task
    /// completes, unless the actor has since begun a newer invocation.
    fn invoke<T, Fut, S>(&mut self, ctx: &mut Context<Self>, task: Fut, settle: S)
    where
        T: 'static,
        Fut: Future<Output = T> + 'static,
        S: FnOnce(&mut Self, &mut Context<Self>, T) + 'static,
    {
        let epoch = self.invocations_mut().begin();
        ctx.spawn(task.into_actor(self).map(move |output, actor, ctx| {
            if actor.invocations().is_current(epoch) {
                settle(actor, ctx, output);
            } else {
                trace!(?epoch, "discarding stale invoked-task completion");
            }
        }));
    }

    /// Fire `after` once `delay` has elapsed, unless superseded.
    ///
    /// The timer is an invoked task like any other: leaving the state (or
    /// stopping the actor) cancels it.
    fn delay<S>(&mut self, ctx: &mut Context<Self>, delay: Duration, after: S)
    where
        S: FnOnce(&mut Self, &mut Context<Self>) + 'static,
    {
        self.invoke(ctx, tokio::time::sleep(delay), move |actor, ctx, _| {
            after(actor, ctx)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Probe {
        invocations: Invocations,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Actor for Probe {
        type Context = Context<Self>;
    }

    impl Invoking for Probe {
        fn invocations(&self) -> &Invocations {
            &self.invocations
        }

        fn invocations_mut(&mut self) -> &mut Invocations {
            &mut self.invocations
        }
    }

    #[derive(Message)]
    #[rtype(result = "()")]
    struct StartPair;

    impl Handler<StartPair> for Probe {
        type Result = ();

        // Two invocations racing: the slow one was started first and must
        // be discarded when it finally settles.
        fn handle(&mut self, _: StartPair, ctx: &mut Context<Self>) {
            let seen = self.seen.clone();
            self.invoke(
                ctx,
                tokio::time::sleep(Duration::from_millis(50)),
                move |_, _, _| seen.lock().unwrap().push("slow"),
            );
            let seen = self.seen.clone();
            self.invoke(
                ctx,
                tokio::time::sleep(Duration::from_millis(5)),
                move |_, _, _| seen.lock().unwrap().push("fast"),
            );
        }
    }

    #[actix::test]
    async fn stale_completions_are_discarded() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let addr = Probe {
            invocations: Invocations::new(),
            seen: seen.clone(),
        }
        .start();

        addr.send(StartPair).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(*seen.lock().unwrap(), vec!["fast"]);
    }

    #[actix::test]
    async fn invalidate_drops_pending_settlement() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let addr = Probe {
            invocations: Invocations::new(),
            seen: seen.clone(),
        }
        .start();

        #[derive(Message)]
        #[rtype(result = "()")]
        struct StartThenInvalidate;

        impl Handler<StartThenInvalidate> for Probe {
            type Result = ();

            fn handle(&mut self, _: StartThenInvalidate, ctx: &mut Context<Self>) {
                let seen = self.seen.clone();
                self.invoke(
                    ctx,
                    tokio::time::sleep(Duration::from_millis(10)),
                    move |_, _, _| seen.lock().unwrap().push("should not fire"),
                );
                self.invocations_mut().invalidate();
            }
        }

        addr.send(StartThenInvalidate).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(seen.lock().unwrap().is_empty());
    }
}
