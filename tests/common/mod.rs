//! In-memory chain reader and wallet shared by the integration tests.

#![allow(dead_code)]

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use launchpad_engine::chain::{ChainConfig, ChainRegistry, NativeCurrency};
use launchpad_engine::contracts::events::encode;
use launchpad_engine::contracts::{ChainReader, Erc20Metadata, FactoryTokenConfig, RawLog, TxReceipt, TxRequest, WalletSession};
use launchpad_engine::error::ProviderError;
use launchpad_engine::types::PoolState;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const ACCOUNT: Address = Address::repeat_byte(0xaa);
pub const TOKEN: Address = Address::repeat_byte(0x01);
pub const POOL: Address = Address::repeat_byte(0x02);

/// Tokens returned per native unit by the mock curve.
pub const TOKENS_PER_NATIVE: u64 = 1_000;

pub fn factory(chain_id: u64) -> Address {
    Address::repeat_byte(0xf0 | (chain_id as u8 & 0x0f))
}

pub fn chain_config(chain_id: u64, with_factory: bool) -> ChainConfig {
    ChainConfig {
        chain_id,
        name: format!("Testnet {}", chain_id),
        rpc_urls: vec![format!("http://127.0.0.1:{}", 8500 + chain_id)],
        native_currency: NativeCurrency::default(),
        factory_address: with_factory.then(|| factory(chain_id)),
        creation_fee: Some(U256::from(500u64)),
        explorer_url: None,
    }
}

pub fn registry(chain_ids: &[u64]) -> ChainRegistry {
    ChainRegistry::new(chain_ids.iter().map(|&id| chain_config(id, true)).collect()).unwrap()
}

fn failure() -> ProviderError {
    ProviderError::Transport("connection refused".to_string())
}

/// Scriptable [`ChainReader`] with call counters.
pub struct MockReader {
    chain_id: u64,
    factory: Address,
    pub amm: Mutex<HashMap<Address, Address>>,
    pub logs: Mutex<Vec<RawLog>>,
    pub configs: Mutex<HashMap<Address, FactoryTokenConfig>>,
    pub metadata: Mutex<HashMap<Address, Erc20Metadata>>,
    pub pool_state: Mutex<PoolState>,
    pub impact_bps: Mutex<U256>,
    pub balances: Mutex<HashMap<Address, U256>>,
    pub allowances: Mutex<HashMap<Address, U256>>,
    pub fee: Mutex<U256>,
    pub gas_price: Mutex<Option<U256>>,
    pub failing: AtomicBool,
    pub amm_failing: AtomicBool,
    pub read_delay_ms: AtomicU64,
    pub amm_calls: AtomicUsize,
    pub log_calls: AtomicUsize,
    pub trading_info_calls: AtomicUsize,
}

impl MockReader {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            factory: factory(chain_id),
            amm: Mutex::new(HashMap::new()),
            logs: Mutex::new(Vec::new()),
            configs: Mutex::new(HashMap::new()),
            metadata: Mutex::new(HashMap::new()),
            pool_state: Mutex::new(PoolState {
                current_supply: U256::from(1_000_000u64),
                current_price: U256::from(1_000u64),
                total_volume: U256::ZERO,
                graduation_progress: U256::from(10u64),
                is_graduated: false,
            }),
            impact_bps: Mutex::new(U256::from(250u64)),
            balances: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            fee: Mutex::new(U256::from(1_000u64)),
            gas_price: Mutex::new(Some(U256::from(2_000_000_000u64))),
            failing: AtomicBool::new(false),
            amm_failing: AtomicBool::new(false),
            read_delay_ms: AtomicU64::new(0),
            amm_calls: AtomicUsize::new(0),
            log_calls: AtomicUsize::new(0),
            trading_info_calls: AtomicUsize::new(0),
        }
    }

    /// Factory knows `token -> pool` directly.
    pub fn with_pool(self, token: Address, pool: Address) -> Self {
        self.amm.lock().unwrap().insert(token, pool);
        self
    }

    pub fn with_log(self, log: RawLog) -> Self {
        self.logs.lock().unwrap().push(log);
        self
    }

    pub fn with_token(self, token: Address, name: &str, symbol: &str) -> Self {
        self.configs.lock().unwrap().insert(
            token,
            FactoryTokenConfig {
                name: name.to_string(),
                symbol: symbol.to_string(),
                description: "test token".to_string(),
                image_url: String::new(),
                creator: ACCOUNT,
                total_supply: U256::from(1_000_000_000u64),
                created_at: 1_700_000_000,
            },
        );
        self
    }

    pub fn with_balance(self, token: Address, balance: U256) -> Self {
        self.balances.lock().unwrap().insert(token, balance);
        self
    }

    pub fn with_allowance(self, token: Address, allowance: U256) -> Self {
        self.allowances.lock().unwrap().insert(token, allowance);
        self
    }

    pub fn graduated(self) -> Self {
        self.pool_state.lock().unwrap().is_graduated = true;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(failure())
        } else {
            Ok(())
        }
    }

    async fn delay(&self) {
        let ms = self.read_delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl ChainReader for MockReader {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn factory_address(&self) -> Address {
        self.factory
    }

    async fn get_all_tokens(&self) -> Result<Vec<Address>, ProviderError> {
        self.check()?;
        let mut tokens: Vec<Address> = self.configs.lock().unwrap().keys().copied().collect();
        tokens.sort();
        Ok(tokens)
    }

    async fn get_token_config(&self, token: Address) -> Result<FactoryTokenConfig, ProviderError> {
        self.check()?;
        self.configs
            .lock()
            .unwrap()
            .get(&token)
            .cloned()
            .ok_or_else(|| ProviderError::rpc(3, "execution reverted: unknown token"))
    }

    async fn get_token_amm(&self, token: Address) -> Result<Address, ProviderError> {
        self.amm_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.amm_failing.load(Ordering::SeqCst) {
            return Err(ProviderError::rpc(-32601, "method not found"));
        }
        Ok(self.amm.lock().unwrap().get(&token).copied().unwrap_or(Address::ZERO))
    }

    async fn is_known_token(&self, token: Address) -> Result<bool, ProviderError> {
        self.check()?;
        Ok(self.configs.lock().unwrap().contains_key(&token))
    }

    async fn creation_fee(&self) -> Result<U256, ProviderError> {
        self.check()?;
        Ok(*self.fee.lock().unwrap())
    }

    async fn creation_logs(&self, token: Address) -> Result<Vec<RawLog>, ProviderError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.topics.get(1) == Some(&token.into_word()))
            .cloned()
            .collect())
    }

    async fn trading_info(&self, _pool: Address) -> Result<PoolState, ProviderError> {
        self.trading_info_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.check()?;
        Ok(self.pool_state.lock().unwrap().clone())
    }

    async fn quote_buy(&self, _pool: Address, native_in: U256, _supply: U256) -> Result<U256, ProviderError> {
        self.check()?;
        Ok(native_in * U256::from(TOKENS_PER_NATIVE))
    }

    async fn quote_sell(&self, _pool: Address, tokens_in: U256, _supply: U256) -> Result<U256, ProviderError> {
        self.check()?;
        Ok(tokens_in / U256::from(TOKENS_PER_NATIVE))
    }

    async fn price_impact(&self, _pool: Address, _amount: U256, _is_buy: bool) -> Result<U256, ProviderError> {
        self.check()?;
        Ok(*self.impact_bps.lock().unwrap())
    }

    async fn token_metadata(&self, token: Address) -> Result<Erc20Metadata, ProviderError> {
        self.check()?;
        self.metadata
            .lock()
            .unwrap()
            .get(&token)
            .cloned()
            .ok_or_else(|| ProviderError::rpc(3, "execution reverted"))
    }

    async fn balance_of(&self, token: Address, _owner: Address) -> Result<U256, ProviderError> {
        self.check()?;
        Ok(self.balances.lock().unwrap().get(&token).copied().unwrap_or_default())
    }

    async fn allowance(&self, token: Address, _owner: Address, _spender: Address) -> Result<U256, ProviderError> {
        self.check()?;
        Ok(self.allowances.lock().unwrap().get(&token).copied().unwrap_or_default())
    }

    async fn gas_price(&self) -> Result<U256, ProviderError> {
        self.check()?;
        let price = *self.gas_price.lock().unwrap();
        price.ok_or_else(failure)
    }
}

/// Scriptable [`WalletSession`] that records every switch and transaction.
pub struct MockWallet {
    account: Option<Address>,
    pub current_chain: Mutex<u64>,
    pub switches: Mutex<Vec<u64>>,
    pub sent: Mutex<Vec<TxRequest>>,
    /// Chain each entry of `sent` went out on
    pub sent_on: Mutex<Vec<u64>>,
    pub estimate: AtomicU64,
    /// Estimation failures, per chain
    pub estimate_errors: Mutex<HashMap<u64, ProviderError>>,
    /// Send failures, per chain; raised after estimation succeeded
    pub send_errors: Mutex<HashMap<u64, ProviderError>>,
    pub failing_switches: Mutex<HashSet<u64>>,
    pub rejected_switches: Mutex<HashSet<u64>>,
    /// Token and pool announced by creation receipts, per chain
    pub creations: Mutex<HashMap<u64, (Address, Address)>>,
    pub reverting: AtomicBool,
    receipts: Mutex<HashMap<B256, TxReceipt>>,
    nonce: AtomicU64,
}

impl MockWallet {
    pub fn new(chain_id: u64) -> Self {
        Self::with_account(Some(ACCOUNT), chain_id)
    }

    /// A wallet that is present but locked.
    pub fn locked(chain_id: u64) -> Self {
        Self::with_account(None, chain_id)
    }

    fn with_account(account: Option<Address>, chain_id: u64) -> Self {
        Self {
            account,
            current_chain: Mutex::new(chain_id),
            switches: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            sent_on: Mutex::new(Vec::new()),
            estimate: AtomicU64::new(100_000),
            estimate_errors: Mutex::new(HashMap::new()),
            send_errors: Mutex::new(HashMap::new()),
            failing_switches: Mutex::new(HashSet::new()),
            rejected_switches: Mutex::new(HashSet::new()),
            creations: Mutex::new(HashMap::new()),
            reverting: AtomicBool::new(false),
            receipts: Mutex::new(HashMap::new()),
            nonce: AtomicU64::new(0),
        }
    }

    pub fn creates_on(self, chain_id: u64, token: Address, pool: Address) -> Self {
        self.creations.lock().unwrap().insert(chain_id, (token, pool));
        self
    }

    pub fn failing_switch(self, chain_id: u64) -> Self {
        self.failing_switches.lock().unwrap().insert(chain_id);
        self
    }

    pub fn rejecting_switch(self, chain_id: u64) -> Self {
        self.rejected_switches.lock().unwrap().insert(chain_id);
        self
    }

    pub fn failing_estimate(self, chain_id: u64, err: ProviderError) -> Self {
        self.estimate_errors.lock().unwrap().insert(chain_id, err);
        self
    }

    pub fn failing_send(self, chain_id: u64, err: ProviderError) -> Self {
        self.send_errors.lock().unwrap().insert(chain_id, err);
        self
    }

    pub fn sent_on(&self) -> Vec<u64> {
        self.sent_on.lock().unwrap().clone()
    }

    fn active_chain(&self) -> u64 {
        *self.current_chain.lock().unwrap()
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn switches(&self) -> Vec<u64> {
        self.switches.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSession for MockWallet {
    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(*self.current_chain.lock().unwrap())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.switches.lock().unwrap().push(chain_id);
        if self.rejected_switches.lock().unwrap().contains(&chain_id) {
            return Err(ProviderError::user_rejected());
        }
        if self.failing_switches.lock().unwrap().contains(&chain_id) {
            return Err(ProviderError::rpc(4902, "Unrecognized chain ID"));
        }
        *self.current_chain.lock().unwrap() = chain_id;
        Ok(())
    }

    async fn estimate_gas(&self, _tx: &TxRequest) -> Result<u64, ProviderError> {
        let chain_id = self.active_chain();
        if let Some(err) = self.estimate_errors.lock().unwrap().get(&chain_id).cloned() {
            return Err(err);
        }
        Ok(self.estimate.load(Ordering::SeqCst))
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, ProviderError> {
        let chain_id = self.active_chain();
        if let Some(err) = self.send_errors.lock().unwrap().get(&chain_id).cloned() {
            return Err(err);
        }

        let n = self.nonce.fetch_add(1, Ordering::SeqCst) + 1;
        let hash = B256::from(U256::from(n));

        let logs = match self.creations.lock().unwrap().get(&chain_id) {
            Some(&(token, pool)) if tx.to == factory(chain_id) => {
                let mut log = encode::current_log(tx.to, token, ACCOUNT, pool, 100 + n);
                log.transaction_hash = Some(hash);
                vec![log]
            }
            _ => Vec::new(),
        };

        self.receipts.lock().unwrap().insert(
            hash,
            TxReceipt {
                transaction_hash: hash,
                block_number: 100 + n,
                status: !self.reverting.load(Ordering::SeqCst),
                gas_used: 90_000,
                logs,
            },
        );
        self.sent.lock().unwrap().push(tx);
        self.sent_on.lock().unwrap().push(chain_id);
        Ok(hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError> {
        self.receipts
            .lock()
            .unwrap()
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| ProviderError::Decode(format!("unknown transaction {}", tx_hash)))
    }
}
