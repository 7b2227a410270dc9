//! Unit tests for settlement claims

use actix::prelude::*;
use ethers_core::types::H256;

use crate::actors::settlement::*;
use crate::actors::Subscribe;
use crate::clients::{ClientError, ContractCall};
use crate::config::EngineConfig;
use crate::testing::fixtures::*;
use crate::testing::eventually;
use crate::types::{SaleEvent, SettlementReceipt};
use machine::testing::recorder;

fn receipt(bidder_n: u64, excess_eth: u64) -> SettlementReceipt {
    SettlementReceipt {
        minter: addr(0xD3),
        project: project_ref(),
        bidder: addr(bidder_n),
        excess: eth(excess_eth),
    }
}

async fn active_keys(manager: &Addr<ExcessSettlementManagerActor>) -> Vec<String> {
    let mut keys = manager.send(GetActiveClaims).await.unwrap().0;
    keys.sort();
    keys
}

#[actix::test]
async fn refresh_reconciles_the_child_set_against_the_receipts() {
    let world = MockWorld::new();
    let (first, second) = (receipt(1, 2), receipt(2, 3));
    *world.indexer.receipts.lock().unwrap() = vec![first.clone(), second.clone()];

    let manager =
        ExcessSettlementManagerActor::new(EngineConfig::test_config(), world.handles()).start();
    manager.send(RefreshReceipts { project: project_ref(), bidder: collector() }).await.unwrap();

    let manager_ref = manager.clone();
    eventually("both receipts spawned", || {
        let manager = manager_ref.clone();
        async move { manager.send(GetActiveClaims).await.unwrap().0.len() == 2 }
    })
    .await;

    // one receipt disappears; its idle child is reaped
    *world.indexer.receipts.lock().unwrap() = vec![first.clone()];
    manager.send(RefreshReceipts { project: project_ref(), bidder: collector() }).await.unwrap();

    let expected = vec![first.key()];
    let manager_ref = manager.clone();
    eventually("stale child reaped", || {
        let manager = manager_ref.clone();
        let expected = expected.clone();
        async move {
            let mut keys = manager.send(GetActiveClaims).await.unwrap().0;
            keys.sort();
            keys == expected
        }
    })
    .await;
}

#[actix::test]
async fn claim_submits_confirms_and_removes_the_child() {
    let world = MockWorld::new();
    let receipt = receipt(1, 2);
    *world.indexer.receipts.lock().unwrap() = vec![receipt.clone()];

    let manager =
        ExcessSettlementManagerActor::new(EngineConfig::test_config(), world.handles()).start();
    let (events_addr, events) = recorder::<SaleEvent>();
    manager.send(Subscribe { recipient: events_addr.recipient() }).await.unwrap();

    manager.send(RefreshReceipts { project: project_ref(), bidder: collector() }).await.unwrap();
    let manager_ref = manager.clone();
    eventually("claim child spawned", || {
        let manager = manager_ref.clone();
        async move { !manager.send(GetActiveClaims).await.unwrap().0.is_empty() }
    })
    .await;

    manager.send(ClaimReceipt { key: receipt.key() }).await.unwrap();

    events
        .wait_for(|seen| {
            seen.iter().any(|e| {
                matches!(e, SaleEvent::SettlementClaimed { excess, .. } if *excess == eth(2))
            })
        })
        .await;
    assert!(active_keys(&manager).await.is_empty(), "finished child is removed");

    match world.wallet.submitted_calls().as_slice() {
        [ContractCall::ClaimExcessSettlementFunds { minter, to, .. }] => {
            assert_eq!(*minter, addr(0xD3));
            assert_eq!(*to, addr(1));
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[actix::test]
async fn declined_claim_returns_to_idle() {
    let world = MockWorld::new();
    world.wallet.script_submission(Err(ClientError::UserRejected));
    let receipt = receipt(1, 2);

    let (busy_addr, _busy) = recorder::<ClaimBusy>();
    let (finished_addr, finished) = recorder::<ClaimFinished>();
    let child = SettlementClaimActor::new(
        EngineConfig::test_config(),
        world.handles(),
        receipt,
        claim::ClaimParent {
            busy: BusyRelay { out: busy_addr }.start().recipient(),
            finished: FinishRelay { out: finished_addr }.start().recipient(),
        },
    )
    .start();

    child.send(ClaimExcess).await.unwrap();
    let child_ref = child.clone();
    eventually("claim back to idle", || {
        let child = child_ref.clone();
        async move { child.send(GetClaimSnapshot).await.unwrap().state == ClaimState::Idle }
    })
    .await;
    assert!(finished.snapshot().is_empty(), "a declined claim does not finish");
}

#[actix::test]
async fn reverted_claim_is_an_error() {
    let world = MockWorld::new();
    let tx = H256::from_low_u64_be(1);
    world.chain.script_receipt(tx, false);
    let receipt = receipt(1, 2);

    let (busy_addr, _busy) = recorder::<ClaimBusy>();
    let (finished_addr, _finished) = recorder::<ClaimFinished>();
    let child = SettlementClaimActor::new(
        EngineConfig::test_config(),
        world.handles(),
        receipt,
        claim::ClaimParent {
            busy: BusyRelay { out: busy_addr }.start().recipient(),
            finished: FinishRelay { out: finished_addr }.start().recipient(),
        },
    )
    .start();

    child.send(ClaimExcess).await.unwrap();
    let child_ref = child.clone();
    eventually("claim errors", || {
        let child = child_ref.clone();
        async move { child.send(GetClaimSnapshot).await.unwrap().state == ClaimState::Error }
    })
    .await;
    let snapshot = child.send(GetClaimSnapshot).await.unwrap();
    assert!(snapshot.error.unwrap().contains("reverted"));
}

struct BusyRelay {
    out: Addr<machine::testing::Recorder<ClaimBusy>>,
}

impl Actor for BusyRelay {
    type Context = Context<Self>;
}

impl Handler<ClaimBusy> for BusyRelay {
    type Result = ();

    fn handle(&mut self, msg: ClaimBusy, _: &mut Context<Self>) {
        self.out.do_send(machine::Emitted(msg));
    }
}

struct FinishRelay {
    out: Addr<machine::testing::Recorder<ClaimFinished>>,
}

impl Actor for FinishRelay {
    type Context = Context<Self>;
}

impl Handler<ClaimFinished> for FinishRelay {
    type Result = ();

    fn handle(&mut self, msg: ClaimFinished, _: &mut Context<Self>) {
        self.out.do_send(machine::Emitted(msg));
    }
}
