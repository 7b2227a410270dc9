//! Unit tests for the purchase orchestrator

use actix::prelude::*;
use tokio::sync::watch;

use crate::actors::purchase::eligibility::{self, Eligibility};
use crate::actors::purchase::*;
use crate::actors::Subscribe;
use crate::clients::{ClientError, ContractCall};
use crate::config::EngineConfig;
use crate::testing::fixtures::*;
use crate::testing::eventually;
use crate::types::{LiveSaleData, MinterSpec, SaleEvent};
use machine::testing::{recorder, RecorderHandle};

struct Harness {
    world: MockWorld,
    addr: Addr<PurchaseActor>,
    events: RecorderHandle<SaleEvent>,
    _live_tx: watch::Sender<Option<LiveSaleData>>,
}

async fn spawn(world: MockWorld, spec: MinterSpec, live: Option<LiveSaleData>) -> Harness {
    let (live_tx, live_rx) = watch::channel(live);
    let addr = PurchaseActor::new(
        EngineConfig::test_config(),
        project_with(spec),
        world.handles(),
        live_rx,
        None,
    )
    .start();
    let (events_addr, events) = recorder::<SaleEvent>();
    addr.send(Subscribe { recipient: events_addr.recipient() }).await.unwrap();
    Harness { world, addr, events, _live_tx: live_tx }
}

async fn state_of(h: &Harness) -> PurchaseState {
    h.addr.send(GetPurchaseSnapshot).await.unwrap().state
}

async fn wait_for_state(h: &Harness, state: PurchaseState) {
    let addr = h.addr.clone();
    eventually(&format!("purchase reaches {state}"), || {
        let addr = addr.clone();
        async move { addr.send(GetPurchaseSnapshot).await.unwrap().state == state }
    })
    .await;
}

#[actix::test]
async fn set_price_purchase_happy_path() {
    let h = spawn(MockWorld::new(), MinterSpec::SetPrice, Some(live_data())).await;
    wait_for_state(&h, PurchaseState::ReadyForPurchase).await;

    h.addr.send(InitiatePurchase { to: None }).await.unwrap();
    wait_for_state(&h, PurchaseState::PurchaseInitiated).await;

    let snapshot = h.addr.send(GetPurchaseSnapshot).await.unwrap();
    let tx_hash = snapshot.attempt.tx_hash.expect("purchase submitted");
    h.events
        .wait_for(|seen| {
            seen.iter().any(|e| matches!(e, SaleEvent::PurchaseInitiated { tx_hash: t, chain_id: 1 } if *t == tx_hash))
        })
        .await;

    match h.world.wallet.submitted_calls().as_slice() {
        [ContractCall::Purchase { to, value, .. }] => {
            assert_eq!(*to, collector());
            assert_eq!(*value, eth(1));
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[actix::test]
async fn erc20_with_no_allowance_routes_through_approval() {
    let world = MockWorld::new();
    let token = addr(0xE0);
    // allowance stays at zero; required spend is 1 ether
    let h = spawn(world, MinterSpec::Erc20 { token }, Some(live_data())).await;
    wait_for_state(&h, PurchaseState::ReadyForPurchase).await;

    h.addr.send(InitiatePurchase { to: None }).await.unwrap();
    wait_for_state(&h, PurchaseState::AwaitingErc20ApprovalAmount).await;

    h.addr.send(ApproveSpend { amount: eth(2) }).await.unwrap();
    wait_for_state(&h, PurchaseState::PurchaseInitiated).await;

    let calls = h.world.wallet.submitted_calls();
    assert!(
        matches!(
            calls.as_slice(),
            [
                ContractCall::Approve { amount, .. },
                ContractCall::PurchaseErc20 { max_price, .. },
            ] if *amount == eth(2) && *max_price == eth(1)
        ),
        "unexpected calls: {calls:?}"
    );
}

#[actix::test]
async fn erc20_with_sufficient_allowance_skips_approval() {
    let world = MockWorld::new();
    let token = addr(0xE0);
    let minter = addr(0xD3);
    world.chain.allowances.lock().unwrap().insert((token, collector(), minter), eth(5));

    let h = spawn(world, MinterSpec::Erc20 { token }, Some(live_data())).await;
    wait_for_state(&h, PurchaseState::ReadyForPurchase).await;

    h.addr.send(InitiatePurchase { to: None }).await.unwrap();
    wait_for_state(&h, PurchaseState::PurchaseInitiated).await;

    let calls = h.world.wallet.submitted_calls();
    assert!(
        matches!(calls.as_slice(), [ContractCall::PurchaseErc20 { .. }]),
        "approval should have been skipped: {calls:?}"
    );
}

#[actix::test]
async fn user_rejection_returns_to_ready_without_error() {
    let world = MockWorld::new();
    world.wallet.script_submission(Err(ClientError::UserRejected));

    let h = spawn(world, MinterSpec::SetPrice, Some(live_data())).await;
    wait_for_state(&h, PurchaseState::ReadyForPurchase).await;

    h.addr.send(InitiatePurchase { to: None }).await.unwrap();
    wait_for_state(&h, PurchaseState::ReadyForPurchase).await;

    let snapshot = h.addr.send(GetPurchaseSnapshot).await.unwrap();
    assert!(snapshot.attempt.error.is_none());
    assert!(snapshot.attempt.tx_hash.is_none());
    assert!(!h.events.snapshot().iter().any(|e| matches!(e, SaleEvent::Error { .. })));
}

#[actix::test]
async fn hard_submission_failure_reaches_error_and_reset_recovers() {
    let world = MockWorld::new();
    world.wallet.script_submission(Err(ClientError::Reverted("out of mints".into())));

    let h = spawn(world, MinterSpec::SetPrice, Some(live_data())).await;
    wait_for_state(&h, PurchaseState::ReadyForPurchase).await;

    h.addr.send(InitiatePurchase { to: None }).await.unwrap();
    wait_for_state(&h, PurchaseState::Error).await;
    let snapshot = h.addr.send(GetPurchaseSnapshot).await.unwrap();
    assert!(snapshot.attempt.error.unwrap().contains("reverted"));

    // reset clears the attempt and walks back through eligibility
    h.addr.send(ResetPurchase).await.unwrap();
    wait_for_state(&h, PurchaseState::ReadyForPurchase).await;
    let snapshot = h.addr.send(GetPurchaseSnapshot).await.unwrap();
    assert!(snapshot.attempt.error.is_none());
    assert!(snapshot.attempt.tx_hash.is_none());
    assert!(snapshot.attempt.approval_amount.is_none());
    assert!(snapshot.attempt.ineligibility_reason.is_none());
}

#[actix::test]
async fn paused_sale_waits_until_unpaused() {
    let mut paused = live_data();
    paused.paused = true;
    let h = spawn(MockWorld::new(), MinterSpec::SetPrice, Some(paused)).await;

    wait_for_state(&h, PurchaseState::WaitingForStart).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(state_of(&h).await, PurchaseState::WaitingForStart);

    // the local guard picks the change up on its next tick
    h._live_tx.send(Some(live_data())).unwrap();
    wait_for_state(&h, PurchaseState::ReadyForPurchase).await;
}

#[actix::test]
async fn merkle_ineligible_wallet_reports_reason() {
    let world = MockWorld::new();
    world.allowlists.publish("ipfs://list", vec![addr(0x77)]);

    let h = spawn(
        world,
        MinterSpec::Merkle {
            merkle_root: ethers_core::types::H256::zero(),
            allowlist_uri: "ipfs://list".into(),
        },
        Some(live_data()),
    )
    .await;

    wait_for_state(&h, PurchaseState::UserIneligible).await;
    let snapshot = h.addr.send(GetPurchaseSnapshot).await.unwrap();
    assert_eq!(
        snapshot.attempt.ineligibility_reason.as_deref(),
        Some("address is not on the allowlist")
    );
    h.events
        .wait_for(|seen| seen.iter().any(|e| matches!(e, SaleEvent::Ineligible { .. })))
        .await;
}

#[actix::test]
async fn merkle_delegated_vault_is_chosen_when_wallet_is_not_listed() {
    let world = MockWorld::new();
    let vault = addr(0x55);
    world.allowlists.publish("ipfs://list", vec![vault]);
    world.chain.vaults.lock().unwrap().insert(collector(), vec![vault]);
    world.chain.remaining.lock().unwrap().insert(vault, 3);

    let spec = MinterSpec::Merkle {
        merkle_root: ethers_core::types::H256::zero(),
        allowlist_uri: "ipfs://list".into(),
    };
    let outcome =
        eligibility::check(world.handles(), project_with(spec.clone())).await.unwrap();
    let Eligibility::Eligible(data) = outcome else {
        panic!("vault path should be eligible: {outcome:?}");
    };
    assert_eq!(data.vault, Some(vault));
    assert_eq!(data.remaining_invocations, Some(3));

    // the purchase flows the vault through to the submitted call
    let h = spawn(world, spec, Some(live_data())).await;
    wait_for_state(&h, PurchaseState::ReadyForPurchase).await;
    h.addr.send(InitiatePurchase { to: None }).await.unwrap();
    wait_for_state(&h, PurchaseState::PurchaseInitiated).await;

    match h.world.wallet.submitted_calls().as_slice() {
        [ContractCall::PurchaseMerkle { vault: v, proof, .. }] => {
            assert_eq!(*v, Some(vault));
            assert!(!proof.is_empty());
        }
        calls => panic!("unexpected calls: {calls:?}"),
    }
}

#[actix::test]
async fn direct_wallet_is_preferred_over_a_listed_vault() {
    let world = MockWorld::new();
    let vault = addr(0x55);
    world.allowlists.publish("ipfs://list", vec![collector(), vault]);
    world.chain.vaults.lock().unwrap().insert(collector(), vec![vault]);
    world.chain.remaining.lock().unwrap().insert(collector(), 1);
    world.chain.remaining.lock().unwrap().insert(vault, 5);

    let spec = MinterSpec::Merkle {
        merkle_root: ethers_core::types::H256::zero(),
        allowlist_uri: "ipfs://list".into(),
    };
    let outcome = eligibility::check(world.handles(), project_with(spec)).await.unwrap();
    let Eligibility::Eligible(data) = outcome else { panic!("expected eligible") };
    assert_eq!(data.vault, None, "direct wallet wins over the vault");
}

#[actix::test]
async fn eligibility_is_idempotent_for_unchanged_inputs() {
    let world = MockWorld::new();
    let vault = addr(0x55);
    world.allowlists.publish("ipfs://list", vec![vault]);
    world.chain.vaults.lock().unwrap().insert(collector(), vec![vault]);
    world.chain.remaining.lock().unwrap().insert(vault, 2);

    let spec = MinterSpec::Merkle {
        merkle_root: ethers_core::types::H256::zero(),
        allowlist_uri: "ipfs://list".into(),
    };
    let first = eligibility::check(world.handles(), project_with(spec.clone())).await.unwrap();
    let second = eligibility::check(world.handles(), project_with(spec)).await.unwrap();
    assert_eq!(first, second);
}

#[actix::test]
async fn holder_prefers_direct_ownership() {
    let world = MockWorld::new();
    let collection = addr(0xCC);
    let vault = addr(0x55);
    let direct_token = token(1);
    let vault_token = token(2);
    let direct_token = crate::types::TokenId { contract: collection, ..direct_token };
    let vault_token = crate::types::TokenId { contract: collection, ..vault_token };
    world.chain.vaults.lock().unwrap().insert(collector(), vec![vault]);
    world.indexer.owned.lock().unwrap().insert(collector(), vec![direct_token]);
    world.indexer.owned.lock().unwrap().insert(vault, vec![vault_token]);

    let spec = MinterSpec::Holder { allowed_collections: vec![collection] };
    let outcome = eligibility::check(world.handles(), project_with(spec)).await.unwrap();
    let Eligibility::Eligible(data) = outcome else { panic!("expected eligible") };
    assert_eq!(data.held_token, Some(direct_token));
    assert_eq!(data.vault, None);
}
