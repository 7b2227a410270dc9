//! Live sale data poller
//!
//! Continuously re-reads the volatile sale state of one project from the
//! chain and reports every refresh to its parent. Terminal on the first
//! unrecoverable read failure; whether to respawn is the parent's call.

pub mod actor;
pub mod messages;

pub use actor::{fetch_live_data, LiveDataActor};
pub use messages::*;

#[cfg(test)]
mod tests;
