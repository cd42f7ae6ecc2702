//! Swap quotes against a token's pool.
//!
//! A quote is advisory: it describes the pool as of the block it was read at.
//! Its `minimum_output` uses the platform's advisory slippage and is meant for
//! display; execution derives its own bound from the user's tolerance.

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::amounts::{apply_slippage, bps_to_percent};
use crate::config::EngineConfig;
use crate::contracts::gateway::ChainReader;
use crate::error::{EngineError, EngineResult};
use crate::resolver::{with_timeout, AmmResolver};
use crate::types::{Route, TradeAction};

/// Point-in-time trade estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub token: Address,
    pub action: TradeAction,
    /// Native amount for buys, token amount for sells
    pub input_amount: U256,
    /// Expected tokens for buys, expected native for sells
    pub output_amount: U256,
    pub price_impact_percent: f64,
    /// Advisory slippage baked into `minimum_output`
    pub slippage_percent: f64,
    /// Rough fee estimate in wei, not a bound
    pub estimated_gas_fee: U256,
    pub route: Route,
    /// Display-only lower bound
    pub minimum_output: U256,
    /// Pool the quote was computed against
    pub pool: Address,
    /// Pool supply the quote was computed against
    pub supply_at_quote: U256,
    pub computed_at: DateTime<Utc>,
}

/// Reads pool state and turns a trade intent into a [`SwapQuote`].
pub struct QuoteEngine {
    reader: Arc<dyn ChainReader>,
    resolver: AmmResolver,
    advisory_slippage_percent: f64,
    buy_gas_units: u64,
    sell_gas_units: u64,
    fallback_gas_price: U256,
    timeout: Duration,
}

impl QuoteEngine {
    pub fn new(reader: Arc<dyn ChainReader>, resolver: AmmResolver, config: &EngineConfig) -> Self {
        Self {
            reader,
            resolver,
            advisory_slippage_percent: config.advisory_slippage_percent,
            buy_gas_units: config.buy_gas_units,
            sell_gas_units: config.sell_gas_units,
            fallback_gas_price: U256::from(config.fallback_gas_price_gwei) * U256::from(1_000_000_000u64),
            timeout: config.rpc_timeout(),
        }
    }

    /// Quote `amount` of input for `action` on `token`.
    #[instrument(skip(self), fields(token = %token, action = %action))]
    pub async fn get_swap_quote(&self, token: Address, amount: U256, action: TradeAction) -> EngineResult<SwapQuote> {
        if amount.is_zero() {
            return Err(EngineError::InvalidTradeParameters("amount must be greater than zero".to_string()));
        }

        let pool = self
            .resolver
            .resolve_pool_address(token)
            .await
            .map_err(|e| EngineError::QuoteUnavailable(e.to_string()))?;

        let unavailable = |e: crate::error::ProviderError| EngineError::QuoteUnavailable(e.to_string());

        let state = with_timeout(self.timeout, "getTradingInfo", self.reader.trading_info(pool))
            .await
            .map_err(unavailable)?;

        let output_amount = match action {
            TradeAction::Buy => {
                with_timeout(self.timeout, "quoteBuy", self.reader.quote_buy(pool, amount, state.current_supply)).await
            }
            TradeAction::Sell => {
                with_timeout(self.timeout, "quoteSell", self.reader.quote_sell(pool, amount, state.current_supply)).await
            }
        }
        .map_err(unavailable)?;

        let impact_bps = with_timeout(
            self.timeout,
            "priceImpact",
            self.reader.price_impact(pool, amount, action.is_buy()),
        )
        .await
        .map_err(unavailable)?;

        let minimum_output = apply_slippage(output_amount, self.advisory_slippage_percent)?;
        let estimated_gas_fee = self.estimate_gas_fee(action).await;

        let quote = SwapQuote {
            token,
            action,
            input_amount: amount,
            output_amount,
            price_impact_percent: bps_to_percent(impact_bps),
            slippage_percent: self.advisory_slippage_percent,
            estimated_gas_fee,
            route: state.route(),
            minimum_output,
            pool,
            supply_at_quote: state.current_supply,
            computed_at: Utc::now(),
        };

        debug!(
            "Quoted {} {} -> {} via {:?} ({:.2}% impact)",
            action, amount, output_amount, quote.route, quote.price_impact_percent
        );
        Ok(quote)
    }

    async fn estimate_gas_fee(&self, action: TradeAction) -> U256 {
        let units = match action {
            TradeAction::Buy => self.buy_gas_units,
            TradeAction::Sell => self.sell_gas_units,
        };
        let gas_price = match with_timeout(self.timeout, "eth_gasPrice", self.reader.gas_price()).await {
            Ok(price) => price,
            Err(e) => {
                warn!("Gas price unavailable ({}), using fallback", e);
                self.fallback_gas_price
            }
        };
        U256::from(units) * gas_price
    }
}

/// Result of a debounced quote request.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteOutcome {
    /// The quote for the latest request
    Fresh(SwapQuote),
    /// A newer request was issued while this one was waiting or in flight
    Superseded,
}

impl QuoteOutcome {
    pub fn into_quote(self) -> Option<SwapQuote> {
        match self {
            QuoteOutcome::Fresh(quote) => Some(quote),
            QuoteOutcome::Superseded => None,
        }
    }
}

/// Debounces quote requests driven by user input.
///
/// Each request takes a generation number. Only the request holding the latest
/// generation when its read completes yields a quote; older ones resolve to
/// [`QuoteOutcome::Superseded`] no matter when their reads finish.
#[derive(Clone)]
pub struct QuoteDebouncer {
    engine: Arc<QuoteEngine>,
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl QuoteDebouncer {
    pub fn new(engine: Arc<QuoteEngine>, delay: Duration) -> Self {
        Self {
            engine,
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Issue a request, superseding any earlier one.
    pub async fn request(&self, token: Address, amount: U256, action: TradeAction) -> EngineResult<QuoteOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.delay).await;
        if !self.is_current(generation) {
            debug!("Quote request {} superseded before it was sent", generation);
            return Ok(QuoteOutcome::Superseded);
        }

        let result = self.engine.get_swap_quote(token, amount, action).await;
        if !self.is_current(generation) {
            debug!("Quote response {} arrived after a newer request, discarding", generation);
            return Ok(QuoteOutcome::Superseded);
        }

        result.map(QuoteOutcome::Fresh)
    }

    /// Invalidate whatever is pending, e.g. when the input is cleared.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}
