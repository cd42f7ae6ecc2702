//! JSON-RPC implementation of [`ChainReader`].
//!
//! Calls are ABI encoded with `alloy-sol-types` and sent as `eth_call` over
//! HTTP. Every request passes the rate limiter, carries a timeout and is
//! retried with exponential backoff on transport failures, moving to the next
//! configured endpoint on each attempt.

use alloy_primitives::{Address, Bytes, U256, U64};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonempty::NonEmpty;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, instrument, warn};

use super::abi::{IBondingPool, IERC20, ITokenFactory};
use super::events::creation_signatures;
use super::gateway::{ChainReader, Erc20Metadata, FactoryTokenConfig, RawLog};
use crate::chain::ChainConfig;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, ProviderError};
use crate::types::PoolState;

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcErrorBody>,
}

#[derive(Deserialize)]
struct JsonRpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: Address,
    topics: Vec<alloy_primitives::B256>,
    data: Bytes,
    block_number: Option<U64>,
    log_index: Option<U64>,
    transaction_hash: Option<alloy_primitives::B256>,
}

impl From<RpcLog> for RawLog {
    fn from(log: RpcLog) -> Self {
        RawLog {
            address: log.address,
            topics: log.topics,
            data: log.data,
            block_number: log.block_number.map(|n| n.to::<u64>()).unwrap_or_default(),
            log_index: log.log_index.map(|n| n.to::<u64>()).unwrap_or_default(),
            transaction_hash: log.transaction_hash,
        }
    }
}

/// [`ChainReader`] backed by a node's JSON-RPC endpoint.
pub struct RpcGateway {
    chain_id: u64,
    factory: Address,
    endpoints: NonEmpty<String>,
    http_client: Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    retry_attempts: usize,
    next_endpoint: AtomicUsize,
    request_id: AtomicU64,
}

impl RpcGateway {
    /// Build a gateway for a chain that has a factory deployed.
    pub fn new(chain: &ChainConfig, config: &EngineConfig) -> EngineResult<Self> {
        let factory = chain
            .factory_address
            .filter(|address| !address.is_zero())
            .ok_or(EngineError::ChainNotConfigured(chain.chain_id))?;

        let endpoints = NonEmpty::from_vec(chain.rpc_urls.clone())
            .ok_or(EngineError::ContractsNotInitialized(chain.chain_id))?;

        let http_client = Client::builder()
            .timeout(config.rpc_timeout())
            .build()
            .map_err(|e| EngineError::NetworkUnavailable(e.to_string()))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_requests_per_second).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            chain_id: chain.chain_id,
            factory,
            endpoints,
            http_client,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            retry_attempts: config.rpc_retry_attempts,
            next_endpoint: AtomicUsize::new(0),
            request_id: AtomicU64::new(1),
        })
    }

    /// Send one JSON-RPC request with retries across endpoints.
    #[instrument(skip(self, params), fields(chain_id = self.chain_id))]
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .map(jitter)
            .take(self.retry_attempts);

        RetryIf::start(
            strategy,
            || self.request_once(method, params.clone()),
            |err: &ProviderError| matches!(err, ProviderError::Transport(_) | ProviderError::Timeout),
        )
        .await
    }

    async fn request_once(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.rate_limiter.until_ready().await;

        let index = self.next_endpoint.load(Ordering::Relaxed) % self.endpoints.len();
        let endpoint = &self.endpoints[index];
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self.http_client.post(endpoint).json(&body).send().await;
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                // Rotate so the retry goes to the next endpoint.
                self.next_endpoint.fetch_add(1, Ordering::Relaxed);
                warn!("RPC {} to {} failed: {}", method, endpoint, e);
                return Err(if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Transport(e.to_string())
                });
            }
        };

        if !response.status().is_success() {
            self.next_endpoint.fetch_add(1, Ordering::Relaxed);
            return Err(ProviderError::Transport(format!(
                "{} returned HTTP {}",
                endpoint,
                response.status()
            )));
        }

        let payload: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        if let Some(error) = payload.error {
            return Err(ProviderError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        debug!("RPC {} answered by {}", method, endpoint);
        payload
            .result
            .ok_or_else(|| ProviderError::Decode(format!("{} returned no result", method)))
    }

    /// `eth_call` a typed contract function at the latest block.
    async fn call<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return, ProviderError> {
        let params = json!([{ "to": to, "data": Bytes::from(call.abi_encode()) }, "latest"]);
        let raw = self.request("eth_call", params).await?;
        let data: Bytes = serde_json::from_value(raw).map_err(|e| ProviderError::Decode(e.to_string()))?;
        C::abi_decode_returns(&data, true).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChainReader for RpcGateway {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn factory_address(&self) -> Address {
        self.factory
    }

    async fn get_all_tokens(&self) -> Result<Vec<Address>, ProviderError> {
        let ret = self.call(self.factory, ITokenFactory::getAllTokensCall {}).await?;
        Ok(ret._0)
    }

    async fn get_token_config(&self, token: Address) -> Result<FactoryTokenConfig, ProviderError> {
        let config = self
            .call(self.factory, ITokenFactory::getTokenConfigCall { token })
            .await?
            ._0;
        Ok(FactoryTokenConfig {
            name: config.name,
            symbol: config.symbol,
            description: config.description,
            image_url: config.imageUrl,
            creator: config.creator,
            total_supply: config.totalSupply,
            created_at: config.createdAt.saturating_to::<u64>(),
        })
    }

    async fn get_token_amm(&self, token: Address) -> Result<Address, ProviderError> {
        let ret = self.call(self.factory, ITokenFactory::getTokenAMMCall { token }).await?;
        Ok(ret._0)
    }

    async fn is_known_token(&self, token: Address) -> Result<bool, ProviderError> {
        let ret = self.call(self.factory, ITokenFactory::isKnownTokenCall { token }).await?;
        Ok(ret._0)
    }

    async fn creation_fee(&self) -> Result<U256, ProviderError> {
        let ret = self.call(self.factory, ITokenFactory::creationFeeCall {}).await?;
        Ok(ret._0)
    }

    #[instrument(skip(self), fields(chain_id = self.chain_id, token = %token))]
    async fn creation_logs(&self, token: Address) -> Result<Vec<RawLog>, ProviderError> {
        let filter = json!([{
            "address": self.factory,
            "fromBlock": "earliest",
            "toBlock": "latest",
            "topics": [creation_signatures(), token.into_word()],
        }]);
        let raw = self.request("eth_getLogs", filter).await?;
        let logs: Vec<RpcLog> = serde_json::from_value(raw).map_err(|e| ProviderError::Decode(e.to_string()))?;
        debug!("Found {} creation logs for {}", logs.len(), token);
        Ok(logs.into_iter().map(RawLog::from).collect())
    }

    async fn trading_info(&self, pool: Address) -> Result<PoolState, ProviderError> {
        let info = self.call(pool, IBondingPool::getTradingInfoCall {}).await?;
        Ok(PoolState {
            current_supply: info.supply,
            current_price: info.price,
            total_volume: info.volume,
            graduation_progress: info.graduationProgress,
            is_graduated: info.isGraduated,
        })
    }

    async fn quote_buy(&self, pool: Address, native_in: U256, supply: U256) -> Result<U256, ProviderError> {
        let ret = self
            .call(pool, IBondingPool::quoteBuyCall { ethIn: native_in, supply })
            .await?;
        Ok(ret._0)
    }

    async fn quote_sell(&self, pool: Address, tokens_in: U256, supply: U256) -> Result<U256, ProviderError> {
        let ret = self
            .call(pool, IBondingPool::quoteSellCall { tokensIn: tokens_in, supply })
            .await?;
        Ok(ret._0)
    }

    async fn price_impact(&self, pool: Address, amount: U256, is_buy: bool) -> Result<U256, ProviderError> {
        let ret = self
            .call(pool, IBondingPool::priceImpactCall { amount, isBuy: is_buy })
            .await?;
        Ok(ret._0)
    }

    async fn token_metadata(&self, token: Address) -> Result<Erc20Metadata, ProviderError> {
        let name = self.call(token, IERC20::nameCall {}).await?._0;
        let symbol = self.call(token, IERC20::symbolCall {}).await?._0;
        let decimals = self.call(token, IERC20::decimalsCall {}).await?._0;
        let total_supply = self.call(token, IERC20::totalSupplyCall {}).await?._0;
        Ok(Erc20Metadata {
            name,
            symbol,
            decimals,
            total_supply,
        })
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ProviderError> {
        let ret = self.call(token, IERC20::balanceOfCall { account: owner }).await?;
        Ok(ret._0)
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256, ProviderError> {
        let ret = self.call(token, IERC20::allowanceCall { owner, spender }).await?;
        Ok(ret._0)
    }

    async fn gas_price(&self) -> Result<U256, ProviderError> {
        let raw = self.request("eth_gasPrice", json!([])).await?;
        serde_json::from_value(raw).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}
