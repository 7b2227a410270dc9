//! Unit tests for the ranked-auction bid orchestrator

use actix::prelude::*;
use ethers_core::types::{H256, U256};
use tokio::sync::watch;

use crate::actors::ram_bid::*;
use crate::actors::Subscribe;
use crate::clients::{BidEvent, ContractCall};
use crate::config::EngineConfig;
use crate::testing::fixtures::*;
use crate::testing::eventually;
use crate::types::{now_secs, BidId, LiveSaleData, MinterSpec, RamConfig, SaleEvent};
use machine::testing::{recorder, RecorderHandle};

fn ram_project() -> crate::types::ProjectSaleData {
    project_with(MinterSpec::RankedAuction { config: RamConfig::default() })
}

fn live_with_ram(ram: crate::types::RamLiveData) -> LiveSaleData {
    LiveSaleData { ram: Some(ram), ..live_data() }
}

struct Harness {
    world: MockWorld,
    addr: Addr<RamBidActor>,
    events: RecorderHandle<SaleEvent>,
    _live_tx: watch::Sender<Option<LiveSaleData>>,
}

async fn spawn(world: MockWorld, live: LiveSaleData) -> Harness {
    let (live_tx, live_rx) = watch::channel(Some(live));
    let addr =
        RamBidActor::new(EngineConfig::test_config(), ram_project(), world.handles(), live_rx)
            .start();
    let (events_addr, events) = recorder::<SaleEvent>();
    addr.send(Subscribe { recipient: events_addr.recipient() }).await.unwrap();
    Harness { world, addr, events, _live_tx: live_tx }
}

async fn wait_for_state(h: &Harness, state: RamBidState) {
    let addr = h.addr.clone();
    eventually(&format!("ram bid reaches {state}"), || {
        let addr = addr.clone();
        async move { addr.send(GetRamBidSnapshot).await.unwrap().state == state }
    })
    .await;
}

#[actix::test]
async fn new_bid_flows_to_success_once_indexed() {
    let world = MockWorld::new();
    // the bid event the chain will report for the first submitted tx
    let tx = H256::from_low_u64_be(1);
    let bid_id = BidId(U256::from(77));
    world
        .chain
        .bid_events
        .lock()
        .unwrap()
        .insert(tx, BidEvent { bid_id, slot_index: 10, bidder: collector() });
    // the index takes a couple of queries to catch up (query 1 is the
    // initial bid fetch)
    let base = ram_live().details.base_price;
    let value = slot_index_to_bid_value(&RamConfig::default(), base, 10);
    *world.indexer.synced_bids.lock().unwrap() = vec![{
        let mut b = bid(77, 10, value);
        b.id = bid_id;
        b
    }];
    world.indexer.bids_visible_after.store(2, std::sync::atomic::Ordering::SeqCst);

    let h = spawn(world, live_with_ram(ram_live())).await;
    wait_for_state(&h, RamBidState::AwaitingBidActionChoice).await;

    h.addr.send(ChooseBidAction { action: BidAction::NewBid }).await.unwrap();
    h.addr.send(SubmitBid { slot_index: 10 }).await.unwrap();
    wait_for_state(&h, RamBidState::BidSuccess).await;

    let snapshot = h.addr.send(GetRamBidSnapshot).await.unwrap();
    assert_eq!(snapshot.attempt.slot_index, Some(10));
    assert_eq!(snapshot.attempt.confirmed.as_ref().map(|c| c.bid_id), Some(bid_id));
    assert!(snapshot.user_bids.iter().any(|b| b.id == bid_id));
    h.events
        .wait_for(|seen| {
            seen.iter().any(|e| matches!(e, SaleEvent::BidSubmitted { .. }))
                && seen.iter().any(|e| matches!(e, SaleEvent::BidConfirmed { .. }))
                && seen.iter().any(|e| matches!(e, SaleEvent::BidSynced { .. }))
        })
        .await;

    match h.world.wallet.submitted_calls().as_slice() {
        [ContractCall::CreateBid { slot_index, value: v, .. }] => {
            assert_eq!(*slot_index, 10);
            assert_eq!(*v, value);
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[actix::test]
async fn bid_below_the_minimum_slot_is_rejected_by_guard() {
    let h = spawn(MockWorld::new(), live_with_ram(ram_live())).await;
    wait_for_state(&h, RamBidState::AwaitingBidActionChoice).await;

    h.addr.send(ChooseBidAction { action: BidAction::NewBid }).await.unwrap();
    wait_for_state(&h, RamBidState::AwaitingBidAmount).await;

    // floor is slot 8; slot 5 must be refused with no state change
    h.addr.send(SubmitBid { slot_index: 5 }).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;

    let snapshot = h.addr.send(GetRamBidSnapshot).await.unwrap();
    assert_eq!(snapshot.state, RamBidState::AwaitingBidAmount);
    assert_eq!(snapshot.attempt.slot_index, None);
    assert!(h.world.wallet.submitted_calls().is_empty());
}

#[actix::test]
async fn top_up_must_raise_the_bids_own_slot() {
    let world = MockWorld::new();
    let base = ram_live().details.base_price;
    let current_value = slot_index_to_bid_value(&RamConfig::default(), base, 10);
    *world.indexer.bids.lock().unwrap() = vec![bid(5, 10, current_value)];

    let h = spawn(world, live_with_ram(ram_live())).await;
    wait_for_state(&h, RamBidState::AwaitingBidActionChoice).await;

    h.addr.send(ChooseBidAction { action: BidAction::TopUp }).await.unwrap();
    wait_for_state(&h, RamBidState::AwaitingTopUpBidChoice).await;
    h.addr.send(ChooseTopUpBid { bid_id: BidId(U256::from(5)) }).await.unwrap();
    wait_for_state(&h, RamBidState::AwaitingBidAmount).await;

    // equal slot: refused
    h.addr.send(SubmitBid { slot_index: 10 }).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(h.world.wallet.submitted_calls().is_empty());

    // higher slot: submitted with only the difference attached
    h.addr.send(SubmitBid { slot_index: 12 }).await.unwrap();
    wait_for_state(&h, RamBidState::ConfirmingBidTx).await;
    let expected_added =
        slot_index_to_bid_value(&RamConfig::default(), base, 12) - current_value;
    match h.world.wallet.submitted_calls().as_slice() {
        [ContractCall::TopUpBid { bid_id, slot_index, added_value, .. }] => {
            assert_eq!(*bid_id, BidId(U256::from(5)));
            assert_eq!(*slot_index, 12);
            assert_eq!(*added_value, expected_added);
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[actix::test]
async fn sync_exhaustion_reports_submitted_but_not_indexed() {
    let world = MockWorld::new();
    let tx = H256::from_low_u64_be(1);
    world.chain.bid_events.lock().unwrap().insert(
        tx,
        BidEvent { bid_id: BidId(U256::from(9)), slot_index: 10, bidder: collector() },
    );
    // the index never catches up

    let h = spawn(world, live_with_ram(ram_live())).await;
    wait_for_state(&h, RamBidState::AwaitingBidActionChoice).await;
    h.addr.send(ChooseBidAction { action: BidAction::NewBid }).await.unwrap();
    h.addr.send(SubmitBid { slot_index: 10 }).await.unwrap();

    wait_for_state(&h, RamBidState::Error).await;
    let snapshot = h.addr.send(GetRamBidSnapshot).await.unwrap();
    let message = snapshot.attempt.error.unwrap();
    assert!(message.contains("has not been indexed"), "got: {message}");
    // the tx itself made it on-chain
    assert_eq!(snapshot.attempt.tx_hash, Some(tx));
}

#[actix::test]
async fn reverted_bid_is_a_hard_failure() {
    let world = MockWorld::new();
    let tx = H256::from_low_u64_be(1);
    world.chain.script_receipt(tx, false);

    let h = spawn(world, live_with_ram(ram_live())).await;
    wait_for_state(&h, RamBidState::AwaitingBidActionChoice).await;
    h.addr.send(ChooseBidAction { action: BidAction::NewBid }).await.unwrap();
    h.addr.send(SubmitBid { slot_index: 10 }).await.unwrap();

    wait_for_state(&h, RamBidState::Error).await;
    let snapshot = h.addr.send(GetRamBidSnapshot).await.unwrap();
    assert!(snapshot.attempt.error.unwrap().contains("reverted"));
}

#[actix::test]
async fn sold_out_closed_auction_short_circuits_to_sale_complete() {
    let mut ram = ram_live();
    ram.details.sold_out = true;
    ram.details.auction_end = now_secs() - 10;

    let h = spawn(MockWorld::new(), live_with_ram(ram)).await;
    wait_for_state(&h, RamBidState::SaleComplete).await;
}

#[actix::test]
async fn reset_keeps_the_user_bid_list() {
    let world = MockWorld::new();
    let base = ram_live().details.base_price;
    let value = slot_index_to_bid_value(&RamConfig::default(), base, 9);
    *world.indexer.bids.lock().unwrap() = vec![bid(3, 9, value)];
    let tx = H256::from_low_u64_be(1);
    world.chain.script_receipt(tx, false);

    let h = spawn(world, live_with_ram(ram_live())).await;
    wait_for_state(&h, RamBidState::AwaitingBidActionChoice).await;
    h.addr.send(ChooseBidAction { action: BidAction::NewBid }).await.unwrap();
    h.addr.send(SubmitBid { slot_index: 10 }).await.unwrap();
    wait_for_state(&h, RamBidState::Error).await;

    h.addr.send(ResetBid).await.unwrap();
    wait_for_state(&h, RamBidState::AwaitingBidActionChoice).await;
    let snapshot = h.addr.send(GetRamBidSnapshot).await.unwrap();
    assert_eq!(snapshot.attempt, Default::default());
    assert_eq!(snapshot.user_bids.len(), 1);
}
