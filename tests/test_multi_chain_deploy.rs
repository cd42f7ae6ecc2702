//! Token creation on one or many chains

mod common;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use common::{chain_config, factory, registry, MockReader, MockWallet};
use launchpad_engine::contracts::abi::ITokenFactory;
use launchpad_engine::error::ProviderError;
use launchpad_engine::{
    ChainReaders, ChainRegistry, DeploymentMode, DeploymentStatus, EngineError, LaunchpadClient, TokenForm,
    TradeAction, TradeIntent,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

const TOKEN_A: Address = Address::repeat_byte(0x1a);
const POOL_A: Address = Address::repeat_byte(0x2a);
const TOKEN_B: Address = Address::repeat_byte(0x1b);
const POOL_B: Address = Address::repeat_byte(0x2b);

fn form() -> TokenForm {
    let mut form = TokenForm::new("Rocket", "RKT", "to the moon");
    form.website = Some("https://rocket.example".to_string());
    form
}

fn readers(chain_ids: &[u64]) -> (ChainReaders, Vec<Arc<MockReader>>) {
    let mut readers = ChainReaders::new();
    let mut mocks = Vec::new();
    for &chain_id in chain_ids {
        let reader = Arc::new(MockReader::new(chain_id));
        readers.insert(reader.clone());
        mocks.push(reader);
    }
    (readers, mocks)
}

fn client(registry: ChainRegistry, readers: ChainReaders, wallet: Option<Arc<MockWallet>>) -> LaunchpadClient {
    let mut builder = LaunchpadClient::builder(registry, 1).with_readers(readers);
    if let Some(wallet) = wallet {
        builder = builder.with_wallet(wallet);
    }
    builder.build().unwrap()
}

#[tokio::test]
async fn test_failed_chain_does_not_stop_the_batch() {
    let (readers, _) = readers(&[1, 2]);
    let wallet = Arc::new(MockWallet::new(1).failing_switch(1).creates_on(2, TOKEN_B, POOL_B));
    let client = client(registry(&[1, 2]), readers, Some(wallet.clone()));

    let report = client
        .deploy_to_multiple_chains(&[1, 2], &form(), None, DeploymentMode::Sequential)
        .await
        .unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(report.attempts[0].chain_id, 1);
    assert_eq!(report.attempts[0].status(), DeploymentStatus::Error);
    assert_eq!(report.attempts[0].error(), Some("Network problem. Please retry."));

    let success = &report.attempts[1];
    assert_eq!(success.status(), DeploymentStatus::Success);
    assert_eq!(success.progress(), 100);
    let result = success.result().unwrap();
    assert_eq!(result.token_address, TOKEN_B);
    assert_eq!(result.pool_address, POOL_B);

    assert_eq!(wallet.switches(), vec![1, 2]);
    assert_eq!(report.successes().count(), 1);
    assert_eq!(report.failures().count(), 1);
}

#[tokio::test]
async fn test_creation_call_carries_form_and_fee() {
    let (readers, mocks) = readers(&[1]);
    let wallet = Arc::new(MockWallet::new(1).creates_on(1, TOKEN_A, POOL_A));
    wallet.estimate.store(1_000_000, Ordering::SeqCst);
    let client = client(registry(&[1]), readers, Some(wallet.clone()));

    client
        .deploy_to_multiple_chains(&[1], &form(), Some("ipfs://image"), DeploymentMode::Sequential)
        .await
        .unwrap();

    let sent = wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, factory(1));
    assert_eq!(sent[0].value, *mocks[0].fee.lock().unwrap());
    assert_eq!(sent[0].gas_limit, Some(1_200_000));

    let call = ITokenFactory::createTokenCall::abi_decode(&sent[0].data, true).unwrap();
    assert_eq!(call.symbol, "RKT");
    assert_eq!(call.imageUrl, "ipfs://image");
    assert_eq!(call.website, "https://rocket.example");
    assert_eq!(call.twitter, "");
}

#[tokio::test]
async fn test_fee_falls_back_to_registry() {
    let (readers, mocks) = readers(&[1]);
    mocks[0].set_failing(true);
    let wallet = Arc::new(MockWallet::new(1).creates_on(1, TOKEN_A, POOL_A));
    let client = client(registry(&[1]), readers, Some(wallet.clone()));

    let result = client.create_token(&form(), None).await.unwrap();

    assert_eq!(result.token_address, TOKEN_A);
    assert_eq!(wallet.sent()[0].value, U256::from(500u64));
}

#[tokio::test]
async fn test_empty_batch_touches_nothing() {
    let (readers, _) = readers(&[1]);
    let wallet = Arc::new(MockWallet::new(1));
    let client = client(registry(&[1]), readers, Some(wallet.clone()));

    let report = client
        .deploy_to_multiple_chains(&[], &form(), None, DeploymentMode::Parallel)
        .await
        .unwrap();

    assert!(report.is_empty());
    assert!(wallet.switches().is_empty());
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn test_wallet_checked_before_any_switch() {
    let (readers, _) = readers(&[1, 2]);
    let locked = Arc::new(MockWallet::locked(1));
    let client_with_locked = client(registry(&[1, 2]), readers.clone(), Some(locked.clone()));

    let err = client_with_locked
        .deploy_to_multiple_chains(&[1, 2], &form(), None, DeploymentMode::Sequential)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::WalletNotConnected);
    assert!(locked.switches().is_empty());

    let without_wallet = client(registry(&[1, 2]), readers, None);
    let err = without_wallet.create_token(&form(), None).await.unwrap_err();
    assert_eq!(err, EngineError::WalletNotConnected);
}

#[tokio::test]
async fn test_missing_creation_event_fails_the_chain() {
    let (readers, _) = readers(&[1]);
    // The wallet's receipts carry no creation log for chain 1.
    let wallet = Arc::new(MockWallet::new(1));
    let client = client(registry(&[1]), readers, Some(wallet.clone()));

    let err = client.create_token(&form(), None).await.unwrap_err();
    assert!(matches!(err, EngineError::CreationEventNotFound(_)));

    let report = client
        .deploy_to_multiple_chains(&[1], &form(), None, DeploymentMode::Sequential)
        .await
        .unwrap();
    assert_eq!(report.attempts[0].status(), DeploymentStatus::Error);
    assert!(report.attempts[0].result().is_none());
}

#[tokio::test]
async fn test_unconfigured_chains_fail_individually() {
    let registry = ChainRegistry::new(vec![chain_config(1, true), chain_config(3, false)]).unwrap();
    let (readers, _) = readers(&[1]);
    let wallet = Arc::new(MockWallet::new(1).creates_on(1, TOKEN_A, POOL_A));
    let client = client(registry, readers, Some(wallet.clone()));

    let report = client
        .deploy_to_multiple_chains(&[3, 99, 1], &form(), None, DeploymentMode::Sequential)
        .await
        .unwrap();

    assert_eq!(report.len(), 3);
    assert_eq!(report.attempts[0].error(), Some("Token launches are not available on chain 3."));
    assert_eq!(report.attempts[1].chain_name, "Chain 99");
    assert_eq!(report.attempts[1].status(), DeploymentStatus::Error);
    assert_eq!(report.attempts[2].status(), DeploymentStatus::Success);
    assert_eq!(wallet.sent().len(), 1);
}

#[tokio::test]
async fn test_rejected_switch_is_reported_as_rejection() {
    let (readers, _) = readers(&[1, 2]);
    let wallet = Arc::new(MockWallet::new(1).rejecting_switch(2));
    let client = client(registry(&[1, 2]), readers, Some(wallet));

    let report = client
        .deploy_to_multiple_chains(&[2], &form(), None, DeploymentMode::Sequential)
        .await
        .unwrap();

    assert_eq!(report.attempts[0].error(), Some("Transaction rejected by you."));
}

#[tokio::test]
async fn test_duplicate_chain_ids_keep_every_attempt() {
    let (readers, _) = readers(&[1]);
    let wallet = Arc::new(MockWallet::new(1).creates_on(1, TOKEN_A, POOL_A));
    let client = client(registry(&[1]), readers, Some(wallet.clone()));

    let report = client
        .deploy_to_multiple_chains(&[1, 1], &form(), None, DeploymentMode::Sequential)
        .await
        .unwrap();

    assert_eq!(report.len(), 2);
    assert_eq!(wallet.sent().len(), 2);
    let by_chain = report.into_map();
    assert_eq!(by_chain.len(), 1);
    assert_eq!(by_chain[&1].status(), DeploymentStatus::Success);
}

#[tokio::test]
async fn test_deployed_pool_is_cached_for_trading() {
    let (readers, mocks) = readers(&[1]);
    let wallet = Arc::new(MockWallet::new(1).creates_on(1, TOKEN_A, POOL_A));
    let client = client(registry(&[1]), readers, Some(wallet));

    client.create_token(&form(), None).await.unwrap();

    assert_eq!(client.pool_cache().get(1, TOKEN_A).await, Some(POOL_A));
    assert_eq!(client.resolve_pool_address(TOKEN_A).await.unwrap(), POOL_A);
    assert_eq!(mocks[0].amm_calls.load(Ordering::SeqCst), 0);
    assert_eq!(mocks[0].log_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_subscribers_see_final_snapshot() {
    let (readers, _) = readers(&[1, 2]);
    let wallet = Arc::new(MockWallet::new(1).failing_switch(2).creates_on(1, TOKEN_A, POOL_A));
    let client = client(registry(&[1, 2]), readers, Some(wallet));
    let mut updates = client.subscribe_deployments();

    client
        .deploy_to_multiple_chains(&[1, 2], &form(), None, DeploymentMode::Sequential)
        .await
        .unwrap();

    assert!(updates.has_changed().unwrap());
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].status(), DeploymentStatus::Success);
    assert_eq!(snapshot[1].status(), DeploymentStatus::Error);
    assert!(snapshot.iter().all(|state| state.is_terminal()));
}

#[tokio::test]
async fn test_rejected_creation_keeps_progress_and_batch_continues() {
    let (readers, _) = readers(&[1, 2]);
    let wallet = Arc::new(
        MockWallet::new(1)
            .failing_send(1, ProviderError::user_rejected())
            .creates_on(2, TOKEN_B, POOL_B),
    );
    let client = client(registry(&[1, 2]), readers, Some(wallet.clone()));

    let report = client
        .deploy_to_multiple_chains(&[1, 2], &form(), None, DeploymentMode::Sequential)
        .await
        .unwrap();

    let rejected = &report.attempts[0];
    assert_eq!(rejected.status(), DeploymentStatus::Error);
    assert_eq!(rejected.progress(), 70);
    assert_eq!(rejected.error(), Some("Transaction rejected by you."));

    assert_eq!(report.attempts[1].status(), DeploymentStatus::Success);
    assert_eq!(report.attempts[1].result().unwrap().token_address, TOKEN_B);
    assert_eq!(wallet.sent_on(), vec![2]);
}

#[tokio::test]
async fn test_trade_after_deploy_returns_wallet_to_active_chain() {
    let (readers, mocks) = readers(&[1, 2]);
    mocks[0].amm.lock().unwrap().insert(TOKEN_A, POOL_A);
    let wallet = Arc::new(MockWallet::new(1).creates_on(2, TOKEN_B, POOL_B));
    let client = client(registry(&[1, 2]), readers, Some(wallet.clone()));

    client
        .deploy_to_multiple_chains(&[2], &form(), None, DeploymentMode::Sequential)
        .await
        .unwrap();

    let trade = TradeIntent {
        token: TOKEN_A,
        action: TradeAction::Buy,
        amount: U256::from(1_000u64),
        slippage_tolerance: 1.0,
        expected_output: U256::from(1_000_000u64),
        price_impact_percent: 0.0,
        estimated_gas_fee: U256::ZERO,
    };
    client.execute_trade(&trade).await.unwrap();

    assert_eq!(wallet.switches(), vec![2, 1]);
    assert_eq!(wallet.sent_on(), vec![2, 1]);
    assert_eq!(wallet.sent()[1].to, POOL_A);
}
