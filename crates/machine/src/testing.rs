//! Test support for notification-emitting actors

use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix::prelude::*;

use crate::notify::Emitted;

/// Actor that records every notification it receives.
pub struct Recorder<N: Clone + Send + 'static> {
    seen: Arc<Mutex<Vec<N>>>,
}

impl<N: Clone + Send + Unpin + 'static> Actor for Recorder<N> {
    type Context = Context<Self>;
}

impl<N: Clone + Send + Unpin + 'static> Handler<Emitted<N>> for Recorder<N> {
    type Result = ();

    fn handle(&mut self, msg: Emitted<N>, _: &mut Context<Self>) {
        self.seen.lock().unwrap().push(msg.0);
    }
}

/// Read-side handle onto a [`Recorder`]'s captured notifications.
#[derive(Clone)]
pub struct RecorderHandle<N> {
    seen: Arc<Mutex<Vec<N>>>,
}

impl<N: Clone> RecorderHandle<N> {
    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Vec<N> {
        self.seen.lock().unwrap().clone()
    }

    /// Await `predicate` becoming true over the recorded notifications.
    ///
    /// Panics after two seconds; test timings in this workspace are all in
    /// the low milliseconds.
    pub async fn wait_for(&self, predicate: impl Fn(&[N]) -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if predicate(&self.seen.lock().unwrap()) {
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("recorder predicate not satisfied within deadline");
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// Start a recorder actor and return its address plus read handle.
pub fn recorder<N: Clone + Send + Unpin + 'static>() -> (Addr<Recorder<N>>, RecorderHandle<N>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let addr = Recorder { seen: seen.clone() }.start();
    (addr, RecorderHandle { seen })
}
