//! Test support: mock collaborators, fixtures, assertion helpers
//!
//! The mocks keep scripted responses and call history behind `Mutex`es so
//! tests can steer collaborator behavior mid-flight and assert on exactly
//! which contract calls the orchestrators made.

pub mod fixtures;
pub mod mocks;

use std::future::Future;
use std::time::Duration;

/// Await `probe` becoming true, panicking with `what` after two seconds.
pub async fn eventually<Fut>(what: &str, mut probe: impl FnMut() -> Fut)
where
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if probe().await {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not reached in time: {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
