//! Unit tests for the live data poller

use actix::prelude::*;

use crate::actors::live_data::*;
use crate::clients::ClientError;
use crate::testing::fixtures::*;
use crate::testing::eventually;
use crate::types::{MinterSpec, RamConfig};
use machine::testing::recorder;
use machine::Emitted;
use ethers_core::types::U256;
use std::time::Duration;

fn interval() -> Duration {
    Duration::from_millis(20)
}

#[actix::test]
async fn fetches_and_reports_on_a_timer() {
    let world = MockWorld::new();
    let (data_rx, data_seen) = recorder::<LiveDataReport>();
    let (err_rx, _) = recorder::<LiveDataReport>();

    let addr = LiveDataActor::new(
        project_with(MinterSpec::SetPrice),
        world.chain.clone(),
        interval(),
        relay_data(data_rx.clone()),
        relay_error(err_rx.clone()),
    )
    .start();

    // first fetch is immediate, later ones ride the interval
    data_seen.wait_for(|seen| seen.len() >= 2).await;

    let addr_ref = addr.clone();
    eventually("poller settles between fetches", move || {
        let addr = addr_ref.clone();
        async move { addr.send(GetLiveDataSnapshot).await.unwrap().state == LiveDataState::Waiting }
    })
    .await;
    let snapshot = addr.send(GetLiveDataSnapshot).await.unwrap();
    let last = snapshot.last.expect("a fetch succeeded");
    assert_eq!(last.token_price, eth(1));
    assert!(last.price_is_configured);
    assert!(last.ram.is_none());
}

#[actix::test]
async fn merges_ranked_auction_fields() {
    let world = MockWorld::new();
    *world.chain.ram_details.lock().unwrap() = Some(ram_live().details);
    *world.chain.ram_min_next_bid.lock().unwrap() = (8, eth(1) / U256::from(2));

    let (data_rx, data_seen) = recorder::<LiveDataReport>();
    let (err_rx, _) = recorder::<LiveDataReport>();
    let _addr = LiveDataActor::new(
        project_with(MinterSpec::RankedAuction { config: RamConfig::default() }),
        world.chain.clone(),
        interval(),
        relay_data(data_rx.clone()),
        relay_error(err_rx.clone()),
    )
    .start();

    data_seen.wait_for(|seen| !seen.is_empty()).await;
    let LiveDataReport::Data(data) = data_seen.snapshot().remove(0) else {
        panic!("expected live data");
    };
    let ram = data.ram.expect("ranked-auction fields merged");
    assert_eq!(ram.min_next_bid_slot, 8);
    assert_eq!(ram.max_invocations, 100);
}

#[actix::test]
async fn read_failure_is_terminal_and_reported_once() {
    let world = MockWorld::new();
    *world.chain.read_failure.lock().unwrap() = Some(ClientError::Rpc("node down".into()));

    let (data_rx, data_seen) = recorder::<LiveDataReport>();
    let (err_rx, err_seen) = recorder::<LiveDataReport>();
    let addr = LiveDataActor::new(
        project_with(MinterSpec::SetPrice),
        world.chain.clone(),
        interval(),
        relay_data(data_rx.clone()),
        relay_error(err_rx.clone()),
    )
    .start();

    err_seen.wait_for(|seen| !seen.is_empty()).await;
    let addr_ref = addr.clone();
    eventually("poller settles in error", move || {
        let addr = addr_ref.clone();
        async move { addr.send(GetLiveDataSnapshot).await.unwrap().state == LiveDataState::Error }
    })
    .await;

    // terminal: no refetch, no data, exactly one error report
    tokio::time::sleep(interval() * 3).await;
    assert!(data_seen.snapshot().is_empty());
    assert_eq!(err_seen.snapshot().len(), 1);
    let snapshot = addr.send(GetLiveDataSnapshot).await.unwrap();
    assert!(snapshot.error.unwrap().contains("node down"));
}

/// What the parent recipients saw, unified for the recorder.
#[derive(Debug, Clone)]
pub enum LiveDataReport {
    /// A successful fetch
    Data(crate::types::LiveSaleData),
    /// The terminal failure
    Failed(String),
}

/// Adapter actor turning parent messages into recorder notifications.
struct Relay {
    out: Addr<machine::testing::Recorder<LiveDataReport>>,
}

impl Actor for Relay {
    type Context = Context<Self>;
}

impl Handler<LiveSaleDataFetched> for Relay {
    type Result = ();

    fn handle(&mut self, msg: LiveSaleDataFetched, _: &mut Context<Self>) {
        self.out.do_send(Emitted(LiveDataReport::Data(msg.data)));
    }
}

impl Handler<LiveDataFailed> for Relay {
    type Result = ();

    fn handle(&mut self, msg: LiveDataFailed, _: &mut Context<Self>) {
        self.out.do_send(Emitted(LiveDataReport::Failed(msg.message)));
    }
}

fn relay_data(
    out: Addr<machine::testing::Recorder<LiveDataReport>>,
) -> Recipient<LiveSaleDataFetched> {
    Relay { out }.start().recipient()
}

fn relay_error(
    out: Addr<machine::testing::Recorder<LiveDataReport>>,
) -> Recipient<LiveDataFailed> {
    Relay { out }.start().recipient()
}
