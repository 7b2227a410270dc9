//! Generic bounded polling primitives
//!
//! Every "wait until a condition becomes true" workflow in the engine goes
//! through one of these two functions: [`poll`] bounds the wait by
//! wall-clock time, [`poll_attempts`] by a fixed number of probes. A probe
//! reporting `Ok(None)` means "not yet"; a probe error propagates
//! immediately. Swallowing transient failures is the caller's decision,
//! made by wrapping the probe.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::error::MachineError;

/// Poll `probe` until it reports a value or `timeout` elapses.
///
/// The first probe runs immediately; subsequent probes are scheduled
/// `interval` apart. The timeout is measured from the first call, so a
/// budget of `timeout` guarantees at least `timeout / interval` probes.
/// Probe errors propagate without further retries.
pub async fn poll<T, E, F, Fut>(
    operation: &'static str,
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> Result<T, E>
where
    E: From<MachineError>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = Instant::now();
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        if started.elapsed() + interval > timeout {
            trace!(operation, ?timeout, "poll deadline exceeded");
            return Err(MachineError::PollTimeout { operation, timeout }.into());
        }
        tokio::time::sleep(interval).await;
    }
}

/// Poll `probe` up to `attempts` times, `interval` apart.
///
/// Used where the bound is a retry budget rather than a deadline, e.g.
/// waiting for an eventually-consistent index to reflect an on-chain write.
/// Probe errors propagate without consuming the remaining budget.
pub async fn poll_attempts<T, E, F, Fut>(
    operation: &'static str,
    attempts: u32,
    interval: Duration,
    mut probe: F,
) -> Result<T, E>
where
    E: From<MachineError>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    for attempt in 1..=attempts {
        if let Some(value) = probe().await? {
            return Ok(value);
        }
        trace!(operation, attempt, attempts, "probe not yet satisfied");
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    Err(MachineError::RetriesExhausted { operation, attempts }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn resolves_immediately_when_first_probe_is_done() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, MachineError> = poll(
            "immediate",
            Duration::from_secs(1),
            Duration::from_secs(10),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(7))
            },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_enough_probes() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, MachineError> = poll(
            "never-done",
            Duration::from_secs(1),
            Duration::from_secs(10),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            },
        )
        .await;
        assert_eq!(
            result.unwrap_err(),
            MachineError::PollTimeout {
                operation: "never-done",
                timeout: Duration::from_secs(10),
            }
        );
        // at least floor(timeout / interval) probes before giving up
        assert!(calls.load(Ordering::SeqCst) >= 10);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_errors_propagate_without_retry() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, MachineError> = poll(
            "faulty",
            Duration::from_secs(1),
            Duration::from_secs(10),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(MachineError::Task("read failed".into()))
            },
        )
        .await;
        assert_eq!(result.unwrap_err(), MachineError::Task("read failed".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_budget_is_respected() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, MachineError> = poll_attempts(
            "indexing",
            4,
            Duration::from_millis(500),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            },
        )
        .await;
        assert_eq!(
            result.unwrap_err(),
            MachineError::RetriesExhausted { operation: "indexing", attempts: 4 }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_resolve_on_late_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, MachineError> = poll_attempts(
            "indexing",
            5,
            Duration::from_millis(500),
            move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok((n == 3).then_some(n))
            },
        )
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
