//! Seams between the engine and the outside world.
//!
//! [`ChainReader`] is the typed read surface of one chain's contracts and
//! [`WalletSession`] is the user's wallet. The engine only depends on these
//! traits; [`RpcGateway`](super::rpc::RpcGateway) is the production reader and
//! the host application supplies the wallet.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::types::PoolState;

/// Factory-side record of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryTokenConfig {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image_url: String,
    pub creator: Address,
    pub total_supply: U256,
    pub created_at: u64,
}

/// ERC-20 metadata read from the token contract itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Metadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

/// Event log as returned by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// Emitting contract
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub log_index: u64,
    pub transaction_hash: Option<B256>,
}

/// Transaction to be estimated and sent by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    /// ABI encoded calldata
    pub data: Bytes,
    /// Native currency attached
    pub value: U256,
    /// Unset while estimating, set before sending
    pub gas_limit: Option<u64>,
}

impl TxRequest {
    pub fn new(to: Address, data: impl Into<Bytes>, value: U256) -> Self {
        Self {
            to,
            data: data.into(),
            value,
            gas_limit: None,
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// Mined transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    /// `false` when the transaction reverted
    pub status: bool,
    pub gas_used: u64,
    pub logs: Vec<RawLog>,
}

/// Typed reads against one chain's factory, pools and tokens.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Chain this reader talks to.
    fn chain_id(&self) -> u64;

    /// Factory contract on this chain.
    fn factory_address(&self) -> Address;

    async fn get_all_tokens(&self) -> Result<Vec<Address>, ProviderError>;

    async fn get_token_config(&self, token: Address) -> Result<FactoryTokenConfig, ProviderError>;

    /// Direct pool lookup. Zero address when the factory does not know the pool.
    async fn get_token_amm(&self, token: Address) -> Result<Address, ProviderError>;

    async fn is_known_token(&self, token: Address) -> Result<bool, ProviderError>;

    /// Fixed fee the factory charges on `createToken`.
    async fn creation_fee(&self) -> Result<U256, ProviderError>;

    /// Factory creation events whose first indexed topic is `token`, across
    /// every supported event shape, over the full chain history.
    async fn creation_logs(&self, token: Address) -> Result<Vec<RawLog>, ProviderError>;

    async fn trading_info(&self, pool: Address) -> Result<PoolState, ProviderError>;

    async fn quote_buy(&self, pool: Address, native_in: U256, supply: U256) -> Result<U256, ProviderError>;

    async fn quote_sell(&self, pool: Address, tokens_in: U256, supply: U256) -> Result<U256, ProviderError>;

    /// Price impact of a trade in basis points.
    async fn price_impact(&self, pool: Address, amount: U256, is_buy: bool) -> Result<U256, ProviderError>;

    async fn token_metadata(&self, token: Address) -> Result<Erc20Metadata, ProviderError>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ProviderError>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256, ProviderError>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<U256, ProviderError>;
}

/// The user's connected wallet. Signing happens behind this trait.
#[async_trait]
pub trait WalletSession: Send + Sync {
    /// Connected account, `None` when the wallet is locked or disconnected.
    fn account(&self) -> Option<Address>;

    /// Chain the wallet is currently attached to.
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// Ask the wallet to attach to another chain.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64, ProviderError>;

    /// Sign and broadcast. Returns the transaction hash.
    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, ProviderError>;

    /// Wait until the transaction is mined.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError>;
}
