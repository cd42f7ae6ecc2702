//! Pool address resolution.
//!
//! The direct factory lookup is tried first; older factories only expose the
//! pool through their creation event, so the resolver falls back to scanning
//! the factory logs. Resolved addresses are cached for the lifetime of the
//! cache handle since a pool never moves after creation.

use alloy_primitives::Address;
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::contracts::events::CREATION_DECODERS;
use crate::contracts::gateway::ChainReader;
use crate::error::{EngineError, EngineResult, ProviderError};

/// Shared token → pool address cache, keyed by chain.
///
/// Cloning yields another handle to the same cache.
#[derive(Clone)]
pub struct PoolAddressCache {
    inner: Cache<(u64, Address), Address>,
}

impl PoolAddressCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    pub async fn get(&self, chain_id: u64, token: Address) -> Option<Address> {
        self.inner.get(&(chain_id, token)).await
    }

    /// Record a pool. Zero addresses are never cached.
    pub async fn insert(&self, chain_id: u64, token: Address, pool: Address) {
        if pool.is_zero() {
            return;
        }
        self.inner.insert((chain_id, token), pool).await;
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
        info!("Cleared pool address cache");
    }

    /// Approximate number of cached entries.
    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}

impl Default for PoolAddressCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

/// Await a provider call under a deadline.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} timed out after {:?}", what, timeout);
            Err(ProviderError::Timeout)
        }
    }
}

/// Resolves the pool that backs a token on one chain.
#[derive(Clone)]
pub struct AmmResolver {
    reader: Arc<dyn ChainReader>,
    cache: PoolAddressCache,
    timeout: Duration,
}

impl AmmResolver {
    pub fn new(reader: Arc<dyn ChainReader>, cache: PoolAddressCache, timeout: Duration) -> Self {
        Self { reader, cache, timeout }
    }

    pub fn chain_id(&self) -> u64 {
        self.reader.chain_id()
    }

    pub fn cache(&self) -> &PoolAddressCache {
        &self.cache
    }

    /// Pool address for `token`, or `PoolNotFound`.
    #[instrument(skip(self), fields(chain_id = self.reader.chain_id(), token = %token))]
    pub async fn resolve_pool_address(&self, token: Address) -> EngineResult<Address> {
        let chain_id = self.reader.chain_id();

        if let Some(pool) = self.cache.get(chain_id, token).await {
            debug!("Pool cache hit for {}", token);
            return Ok(pool);
        }

        match with_timeout(self.timeout, "getTokenAMM", self.reader.get_token_amm(token)).await {
            Ok(pool) if !pool.is_zero() => {
                self.cache.insert(chain_id, token, pool).await;
                debug!("Resolved pool {} for {} via factory lookup", pool, token);
                return Ok(pool);
            }
            Ok(_) => debug!("Factory has no pool recorded for {}, scanning creation logs", token),
            Err(e) => debug!("Factory lookup failed for {} ({}), scanning creation logs", token, e),
        }

        if let Some(pool) = self.scan_creation_logs(token).await {
            self.cache.insert(chain_id, token, pool).await;
            info!("Resolved pool {} for {} from creation logs", pool, token);
            return Ok(pool);
        }

        warn!("No pool found for token {}", token);
        Err(EngineError::PoolNotFound(token.to_string()))
    }

    /// Most recent decodable creation event for `token`.
    async fn scan_creation_logs(&self, token: Address) -> Option<Address> {
        let mut logs = match with_timeout(self.timeout, "creation log scan", self.reader.creation_logs(token)).await
        {
            Ok(logs) => logs,
            Err(e) => {
                warn!("Creation log scan failed for {}: {}", token, e);
                return None;
            }
        };

        let factory = self.reader.factory_address();
        logs.retain(|log| log.address == factory);
        logs.sort_by(|a, b| (b.block_number, b.log_index).cmp(&(a.block_number, a.log_index)));

        logs.iter()
            .filter_map(|log| CREATION_DECODERS.iter().find_map(|decode| decode(log)))
            .find(|event| event.token == token && !event.pool.is_zero())
            .map(|event| event.pool)
    }
}
