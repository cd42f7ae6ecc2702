//! Core types shared across the launchpad engine.

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a trade against a token's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    /// Spend native currency for tokens
    Buy,
    /// Spend tokens for native currency
    Sell,
}

impl TradeAction {
    pub fn is_buy(&self) -> bool {
        matches!(self, TradeAction::Buy)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

/// Pricing venue that will fill a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    /// Pre-graduation pricing along the bonding curve
    BondingCurve,
    /// Post-graduation liquidity pool
    Amm,
}

impl Route {
    /// Route implied by the pool's graduation flag.
    pub fn for_graduation(is_graduated: bool) -> Self {
        if is_graduated {
            Route::Amm
        } else {
            Route::BondingCurve
        }
    }
}

/// Immutable identity of a launched token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    /// Token contract address
    pub address: Address,
    /// Chain the token lives on
    pub chain_id: u64,
    pub name: String,
    pub symbol: String,
    pub description: String,
    /// Image URL recorded at creation, empty when none was given
    pub image_url: String,
    /// Account that created the token
    pub creator: Address,
    /// Total supply in base units
    pub total_supply: U256,
    /// Unix timestamp of creation as recorded by the factory
    pub created_at: u64,
}

/// Live trading state of a pool. Always read from chain, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Circulating supply sold through the curve
    pub current_supply: U256,
    /// Current price in native base units per whole token
    pub current_price: U256,
    /// Cumulative native volume traded
    pub total_volume: U256,
    /// Progress towards graduation, 0-100
    pub graduation_progress: U256,
    pub is_graduated: bool,
}

impl PoolState {
    pub fn route(&self) -> Route {
        Route::for_graduation(self.is_graduated)
    }
}

/// Everything the UI shows on a token page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub descriptor: TokenDescriptor,
    /// Pool backing the token, when it could be resolved
    pub pool: Option<Address>,
    /// Live pool state, when the pool could be read
    pub pool_state: Option<PoolState>,
    /// When this snapshot was assembled
    pub fetched_at: DateTime<Utc>,
}

/// User supplied token creation parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenForm {
    pub name: String,
    pub symbol: String,
    pub description: String,
    /// Optional project links, stored verbatim by the factory
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
}

impl TokenForm {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            description: description.into(),
            ..Default::default()
        }
    }
}
