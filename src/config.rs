//! Engine configuration.
//!
//! Defaults match the platform's production behaviour: a 20% gas buffer, a
//! 0.5% advisory slippage on quotes and a 400ms quote debounce.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for the quote, execution and deployment pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deadline for a single RPC read, in milliseconds
    pub rpc_timeout_ms: u64,
    /// Retries for transport failures before giving up on a read
    pub rpc_retry_attempts: usize,
    /// Client-side request quota per chain endpoint
    pub rate_limit_requests_per_second: u32,
    /// How long to wait for a receipt before abandoning the wait
    pub receipt_timeout_secs: u64,
    /// Safety margin added on top of every gas estimate
    pub gas_buffer_percent: u32,
    /// Slippage used for the display-only minimum output of a quote
    pub advisory_slippage_percent: f64,
    /// Delay before a user-driven quote request is issued
    pub quote_debounce_ms: u64,
    /// Upper bound on cached pool addresses
    pub pool_cache_capacity: u64,
    /// Gas units assumed for a buy when estimating the quote's fee
    pub buy_gas_units: u64,
    /// Gas units assumed for a sell when estimating the quote's fee
    pub sell_gas_units: u64,
    /// Gas price used when the node cannot be asked, in gwei
    pub fallback_gas_price_gwei: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rpc_timeout_ms: 10_000,
            rpc_retry_attempts: 3,
            rate_limit_requests_per_second: 20,
            receipt_timeout_secs: 120,
            gas_buffer_percent: 20,
            advisory_slippage_percent: 0.5,
            quote_debounce_ms: 400,
            pool_cache_capacity: 10_000,
            buy_gas_units: 150_000,
            sell_gas_units: 180_000,
            fallback_gas_price_gwei: 1,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse engine config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engine misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.rpc_timeout_ms == 0 {
            return Err(anyhow!("rpc_timeout_ms must be greater than zero"));
        }
        if self.receipt_timeout_secs == 0 {
            return Err(anyhow!("receipt_timeout_secs must be greater than zero"));
        }
        if !(0.0..100.0).contains(&self.advisory_slippage_percent) {
            return Err(anyhow!(
                "advisory_slippage_percent must be in [0, 100), got {}",
                self.advisory_slippage_percent
            ));
        }
        if self.pool_cache_capacity == 0 {
            return Err(anyhow!("pool_cache_capacity must be greater than zero"));
        }
        Ok(())
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn quote_debounce(&self) -> Duration {
        Duration::from_millis(self.quote_debounce_ms)
    }
}

/// Fluent construction of an [`EngineConfig`].
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set the per-read RPC deadline.
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.config.rpc_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set transport retry attempts.
    pub fn with_rpc_retries(mut self, attempts: usize) -> Self {
        self.config.rpc_retry_attempts = attempts;
        self
    }

    /// Set the request quota.
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.config.rate_limit_requests_per_second = requests_per_second;
        self
    }

    /// Set the receipt wait deadline.
    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.config.receipt_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set the gas safety buffer.
    pub fn with_gas_buffer(mut self, percent: u32) -> Self {
        self.config.gas_buffer_percent = percent;
        self
    }

    /// Set the advisory slippage applied to quotes.
    pub fn with_advisory_slippage(mut self, percent: f64) -> Self {
        self.config.advisory_slippage_percent = percent;
        self
    }

    /// Set the quote debounce delay.
    pub fn with_quote_debounce(mut self, delay: Duration) -> Self {
        self.config.quote_debounce_ms = delay.as_millis() as u64;
        self
    }

    /// Set the pool cache capacity.
    pub fn with_pool_cache_capacity(mut self, capacity: u64) -> Self {
        self.config.pool_cache_capacity = capacity;
        self
    }

    /// Build and validate.
    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
