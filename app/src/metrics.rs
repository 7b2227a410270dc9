//! Prometheus counters for the orchestration engine
//!
//! Counters register against the default registry; the embedding
//! application decides how (and whether) to expose them.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec,
};

lazy_static! {
    /// Orchestrator actors spawned, by kind.
    pub static ref ORCHESTRATORS_SPAWNED: IntCounterVec = register_int_counter_vec!(
        "sales_orchestrators_spawned_total",
        "Orchestrator actors spawned, labeled by actor kind",
        &["actor"]
    )
    .expect("metric registration");

    /// State transitions, by actor kind and target state.
    pub static ref STATE_TRANSITIONS: IntCounterVec = register_int_counter_vec!(
        "sales_state_transitions_total",
        "State transitions, labeled by actor kind and target state",
        &["actor", "state"]
    )
    .expect("metric registration");

    /// Invoked tasks that settled with a hard failure, by actor kind.
    pub static ref TASK_FAILURES: IntCounterVec = register_int_counter_vec!(
        "sales_invoked_task_failures_total",
        "Invoked tasks settling in an error state, labeled by actor kind",
        &["actor"]
    )
    .expect("metric registration");

    /// Purchase transactions successfully submitted.
    pub static ref PURCHASES_INITIATED: IntCounter = register_int_counter!(
        "sales_purchases_initiated_total",
        "Purchase transactions submitted through the wallet"
    )
    .expect("metric registration");

    /// Bid transactions successfully submitted.
    pub static ref BIDS_SUBMITTED: IntCounter = register_int_counter!(
        "sales_bids_submitted_total",
        "Bid and top-up transactions submitted through the wallet"
    )
    .expect("metric registration");

    /// Excess settlement claims completed.
    pub static ref SETTLEMENTS_CLAIMED: IntCounter = register_int_counter!(
        "sales_settlements_claimed_total",
        "Excess settlement funds claims that confirmed"
    )
    .expect("metric registration");
}

/// Record an actor spawn.
pub fn record_spawn(actor: &str) {
    ORCHESTRATORS_SPAWNED.with_label_values(&[actor]).inc();
}

/// Record a state transition.
pub fn record_transition(actor: &str, state: &str) {
    STATE_TRANSITIONS.with_label_values(&[actor, state]).inc();
}

/// Record an invoked task settling in failure.
pub fn record_task_failure(actor: &str) {
    TASK_FAILURES.with_label_values(&[actor]).inc();
}
