//! Facade exposed to the UI layer.
//!
//! Read paths swallow failures into empty results; write paths return typed
//! [`EngineError`](crate::error::EngineError)s. Nothing here hands a raw provider error to the caller.

use alloy_primitives::{Address, B256, U256};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::chain::ChainRegistry;
use crate::config::EngineConfig;
use crate::contracts::{ChainReader, ChainReaders, WalletSession};
use crate::deploy::{DeploymentMode, DeploymentOrchestrator, DeploymentReport, DeploymentResult, DeploymentState};
use crate::error::EngineResult;
use crate::quote::{QuoteDebouncer, QuoteEngine, SwapQuote};
use crate::resolver::{with_timeout, AmmResolver, PoolAddressCache};
use crate::trade::{TradeExecutor, TradeIntent};
use crate::types::{TokenDescriptor, TokenForm, TokenInfo, TradeAction};

/// Entry point bound to one active chain for reads and trades, with access to
/// every configured chain for deployment.
pub struct LaunchpadClient {
    config: EngineConfig,
    reader: Arc<dyn ChainReader>,
    resolver: AmmResolver,
    quotes: Arc<QuoteEngine>,
    executor: TradeExecutor,
    orchestrator: DeploymentOrchestrator,
}

impl LaunchpadClient {
    pub fn builder(registry: ChainRegistry, active_chain_id: u64) -> LaunchpadClientBuilder {
        LaunchpadClientBuilder::new(registry, active_chain_id)
    }

    pub fn active_chain_id(&self) -> u64 {
        self.reader.chain_id()
    }

    pub fn pool_cache(&self) -> &PoolAddressCache {
        self.resolver.cache()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pool backing `token` on the active chain.
    pub async fn resolve_pool_address(&self, token: Address) -> EngineResult<Address> {
        self.resolver.resolve_pool_address(token).await
    }

    pub async fn get_swap_quote(&self, token: Address, amount: U256, action: TradeAction) -> EngineResult<SwapQuote> {
        self.quotes.get_swap_quote(token, amount, action).await
    }

    /// Debouncer for quotes driven by keystrokes. Each call returns an
    /// independent debouncer; share one per input field.
    pub fn quote_debouncer(&self) -> QuoteDebouncer {
        QuoteDebouncer::new(self.quotes.clone(), self.config.quote_debounce())
    }

    pub async fn execute_trade(&self, intent: &TradeIntent) -> EngineResult<B256> {
        self.executor.execute_trade(intent).await
    }

    /// Create a token on the wallet's current chain.
    pub async fn create_token(&self, form: &TokenForm, image_url: Option<&str>) -> EngineResult<DeploymentResult> {
        self.orchestrator.create_token(form, image_url).await
    }

    pub async fn deploy_to_multiple_chains(
        &self,
        chain_ids: &[u64],
        form: &TokenForm,
        image_url: Option<&str>,
        mode: DeploymentMode,
    ) -> EngineResult<DeploymentReport> {
        self.orchestrator
            .deploy_to_multiple_chains(chain_ids, form, image_url, mode)
            .await
    }

    pub fn subscribe_deployments(&self) -> watch::Receiver<Vec<DeploymentState>> {
        self.orchestrator.subscribe()
    }

    /// Every token the factory knows about. Empty on failure.
    pub async fn get_all_tokens(&self) -> Vec<Address> {
        match with_timeout(self.config.rpc_timeout(), "getAllTokens", self.reader.get_all_tokens()).await {
            Ok(tokens) => {
                debug!("Factory lists {} tokens", tokens.len());
                tokens
            }
            Err(e) => {
                warn!("Failed to list tokens: {}", e);
                Vec::new()
            }
        }
    }

    /// Descriptor plus live pool data for `token`. `None` when the token is
    /// unknown or its config cannot be read.
    pub async fn get_token_info(&self, token: Address) -> Option<TokenInfo> {
        let timeout = self.config.rpc_timeout();

        match with_timeout(timeout, "isKnownToken", self.reader.is_known_token(token)).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("{} is not a factory token", token);
                return None;
            }
            Err(e) => {
                warn!("isKnownToken failed for {}: {}", token, e);
                return None;
            }
        }

        let config = match with_timeout(timeout, "getTokenConfig", self.reader.get_token_config(token)).await {
            Ok(config) => config,
            Err(e) => {
                warn!("getTokenConfig failed for {}: {}", token, e);
                return None;
            }
        };

        let mut descriptor = TokenDescriptor {
            address: token,
            chain_id: self.reader.chain_id(),
            name: config.name,
            symbol: config.symbol,
            description: config.description,
            image_url: config.image_url,
            creator: config.creator,
            total_supply: config.total_supply,
            created_at: config.created_at,
        };

        // Early factories did not record names; the token contract always has them.
        if descriptor.name.is_empty() || descriptor.symbol.is_empty() {
            match with_timeout(timeout, "token metadata", self.reader.token_metadata(token)).await {
                Ok(metadata) => {
                    descriptor.name = metadata.name;
                    descriptor.symbol = metadata.symbol;
                    if descriptor.total_supply.is_zero() {
                        descriptor.total_supply = metadata.total_supply;
                    }
                }
                Err(e) => warn!("Token metadata unavailable for {}: {}", token, e),
            }
        }

        let pool = self.resolver.resolve_pool_address(token).await.ok();
        let pool_state = match pool {
            Some(pool) => with_timeout(timeout, "getTradingInfo", self.reader.trading_info(pool))
                .await
                .map_err(|e| warn!("Trading info unavailable for {}: {}", token, e))
                .ok(),
            None => None,
        };

        Some(TokenInfo {
            descriptor,
            pool,
            pool_state,
            fetched_at: Utc::now(),
        })
    }
}

/// Assembles a [`LaunchpadClient`].
pub struct LaunchpadClientBuilder {
    registry: ChainRegistry,
    active_chain_id: u64,
    config: EngineConfig,
    readers: Option<ChainReaders>,
    wallet: Option<Arc<dyn WalletSession>>,
    cache: Option<PoolAddressCache>,
}

impl LaunchpadClientBuilder {
    pub fn new(registry: ChainRegistry, active_chain_id: u64) -> Self {
        Self {
            registry,
            active_chain_id,
            config: EngineConfig::default(),
            readers: None,
            wallet: None,
            cache: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use these readers instead of building JSON-RPC gateways from the registry.
    pub fn with_readers(mut self, readers: ChainReaders) -> Self {
        self.readers = Some(readers);
        self
    }

    pub fn with_wallet(mut self, wallet: Arc<dyn WalletSession>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Share a pool cache with other clients.
    pub fn with_pool_cache(mut self, cache: PoolAddressCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> anyhow::Result<LaunchpadClient> {
        self.config.validate()?;

        let readers = self
            .readers
            .unwrap_or_else(|| ChainReaders::from_registry(&self.registry, &self.config));
        let reader = readers.get(self.active_chain_id)?;
        let cache = self
            .cache
            .unwrap_or_else(|| PoolAddressCache::new(self.config.pool_cache_capacity));

        let resolver = AmmResolver::new(reader.clone(), cache.clone(), self.config.rpc_timeout());
        let quotes = Arc::new(QuoteEngine::new(reader.clone(), resolver.clone(), &self.config));
        let executor = TradeExecutor::new(reader.clone(), resolver.clone(), self.wallet.clone(), &self.config);
        let orchestrator = DeploymentOrchestrator::new(
            Arc::new(self.registry),
            readers,
            self.wallet,
            cache,
            &self.config,
        );

        info!("Launchpad client ready on chain {}", self.active_chain_id);
        Ok(LaunchpadClient {
            config: self.config,
            reader,
            resolver,
            quotes,
            executor,
            orchestrator,
        })
    }
}
