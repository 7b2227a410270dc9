//! Minimal state-machine runtime for orchestration actors
//!
//! This crate provides the shared plumbing used by every orchestrator actor
//! in the engine: epoch-tagged invoked tasks (so a completion arriving after
//! the actor has moved on is discarded rather than applied), cancellable
//! delays tied to the actor lifecycle, a generic bounded poller for
//! "wait until the world catches up" workflows, and a small subscriber
//! registry for lifecycle notifications.
//!
//! Each actor processes one message at a time, so a state transition always
//! runs to completion before the next event is observed. Concurrency across
//! actors comes from the parent/child tree; siblings only communicate
//! through their shared parent.

pub mod error;
pub mod invoke;
pub mod notify;
pub mod poll;
pub mod testing;

pub use error::MachineError;
pub use invoke::{Epoch, Invocations, Invoking};
pub use notify::{Emitted, Notifier};
pub use poll::{poll, poll_attempts};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        error::MachineError,
        invoke::{Epoch, Invocations, Invoking},
        notify::{Emitted, Notifier},
        poll::{poll, poll_attempts},
    };
    pub use actix::prelude::*;
}
