//! launchpad-engine - trading and deployment core for a bonding-curve token launchpad
//!
//! Quotes and executes buys and sells against a token's pool, resolves pool
//! addresses across factory generations, and deploys new tokens to one or more
//! EVM chains through a single wallet session.

pub mod amounts;
pub mod chain;
pub mod client;
pub mod config;
pub mod contracts;
pub mod deploy;
pub mod error;
pub mod quote;
pub mod resolver;
pub mod trade;
pub mod types;

// Re-export main types for convenience
pub use chain::{ChainConfig, ChainRegistry, NativeCurrency};
pub use client::{LaunchpadClient, LaunchpadClientBuilder};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use contracts::{ChainReader, ChainReaders, RpcGateway, WalletSession};
pub use deploy::{
    DeployStep, DeploymentMode, DeploymentOrchestrator, DeploymentPhase, DeploymentReport, DeploymentResult,
    DeploymentState, DeploymentStatus,
};
pub use error::{EngineError, EngineResult, ProviderError};
pub use quote::{QuoteDebouncer, QuoteEngine, QuoteOutcome, SwapQuote};
pub use resolver::{AmmResolver, PoolAddressCache};
pub use trade::{TradeExecutor, TradeIntent};
pub use types::{PoolState, Route, TokenDescriptor, TokenForm, TokenInfo, TradeAction};
