//! Error taxonomy for the trading and deployment engine.
//!
//! Gateway and wallet implementations report failures as [`ProviderError`].
//! Everything the engine hands back to callers is an [`EngineError`], a closed
//! set of kinds the UI can branch on without inspecting provider strings.

use thiserror::Error;

/// EIP-1193 code for a request the user declined in the wallet.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Failure reported by a chain gateway or wallet session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// HTTP or connection level failure
    #[error("transport error: {0}")]
    Transport(String),
    /// The request did not complete within its deadline
    #[error("request timed out")]
    Timeout,
    /// JSON-RPC error object returned by the node or the wallet
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// Response could not be decoded into the expected shape
    #[error("decode error: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Shorthand for an RPC error object.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        ProviderError::Rpc {
            code,
            message: message.into(),
        }
    }

    /// The error a wallet reports when its prompt is declined.
    pub fn user_rejected() -> Self {
        ProviderError::rpc(USER_REJECTED_CODE, "User rejected the request.")
    }

    fn lowercase_message(&self) -> String {
        self.to_string().to_lowercase()
    }
}

/// Closed set of failure kinds surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("wallet not connected")]
    WalletNotConnected,
    #[error("contracts not initialized for chain {0}")]
    ContractsNotInitialized(u64),
    #[error("no pool found for token {0}")]
    PoolNotFound(String),
    #[error("quote unavailable: {0}")]
    QuoteUnavailable(String),
    /// The transaction would most likely revert
    #[error("gas estimation failed: {0}")]
    GasEstimationFailed(String),
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("request rejected in wallet")]
    UserRejected,
    #[error("slippage tolerance exceeded: {0}")]
    SlippageExceeded(String),
    #[error("nonce conflict: {0}")]
    NonceError(String),
    #[error("no factory deployed on chain {0}")]
    ChainNotConfigured(u64),
    /// The creation transaction was mined but carried no creation event
    #[error("creation event not found in transaction {0}")]
    CreationEventNotFound(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    #[error("invalid trade parameters: {0}")]
    InvalidTradeParameters(String),
    #[error("invalid deployment transition: {0}")]
    InvalidTransition(String),
    #[error("contract error: {0}")]
    ContractError(String),
}

impl EngineError {
    /// Classify a provider failure into the engine taxonomy.
    pub fn from_provider(err: ProviderError) -> Self {
        let message = err.lowercase_message();

        if let ProviderError::Rpc { code, .. } = &err {
            if *code == USER_REJECTED_CODE {
                return EngineError::UserRejected;
            }
        }

        if message.contains("user rejected")
            || message.contains("user denied")
            || message.contains("action_rejected")
        {
            return EngineError::UserRejected;
        }
        if message.contains("insufficient funds") || message.contains("insufficient balance") {
            return EngineError::InsufficientFunds(err.to_string());
        }
        if message.contains("nonce too low")
            || message.contains("nonce has already been used")
            || message.contains("replacement transaction underpriced")
        {
            return EngineError::NonceError(err.to_string());
        }
        if message.contains("slippage")
            || message.contains("too little received")
            || message.contains("insufficient output")
        {
            return EngineError::SlippageExceeded(err.to_string());
        }

        match err {
            ProviderError::Timeout => EngineError::Timeout("provider request".to_string()),
            ProviderError::Transport(msg) => EngineError::NetworkUnavailable(msg),
            other => EngineError::ContractError(other.to_string()),
        }
    }

    /// Classify a failure raised while estimating gas. Anything that is not a
    /// more specific kind means the call would revert.
    pub fn from_estimation(err: ProviderError) -> Self {
        match EngineError::from_provider(err) {
            EngineError::ContractError(msg) => EngineError::GasEstimationFailed(msg),
            other => other,
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::SlippageExceeded(_)
                | EngineError::NonceError(_)
                | EngineError::Timeout(_)
                | EngineError::NetworkUnavailable(_)
        )
    }

    /// Short, actionable text for display.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::WalletNotConnected => "Connect your wallet to continue.".to_string(),
            EngineError::ContractsNotInitialized(_) => {
                "Contracts are still loading. Try again in a moment.".to_string()
            }
            EngineError::PoolNotFound(_) => "No trading pool exists for this token yet.".to_string(),
            EngineError::QuoteUnavailable(_) => {
                "Could not fetch a price right now. Try again.".to_string()
            }
            EngineError::GasEstimationFailed(_) => {
                "This transaction would fail. Check the amount and try again.".to_string()
            }
            EngineError::InsufficientFunds(_) => "Not enough balance for this transaction.".to_string(),
            EngineError::UserRejected => "Transaction rejected by you.".to_string(),
            EngineError::SlippageExceeded(_) => {
                "Price moved beyond your slippage tolerance. Retry or raise the tolerance.".to_string()
            }
            EngineError::NonceError(_) => "Transaction nonce conflict. Please retry.".to_string(),
            EngineError::ChainNotConfigured(chain_id) => {
                format!("Token launches are not available on chain {}.", chain_id)
            }
            EngineError::CreationEventNotFound(_) => {
                "The token was submitted but its address could not be confirmed.".to_string()
            }
            EngineError::Timeout(_) | EngineError::NetworkUnavailable(_) => {
                "Network problem. Please retry.".to_string()
            }
            EngineError::InvalidTradeParameters(msg) => format!("Invalid trade: {}.", msg),
            EngineError::InvalidTransition(_) | EngineError::ContractError(_) => {
                "The contract call failed.".to_string()
            }
        }
    }
}

impl From<ProviderError> for EngineError {
    fn from(err: ProviderError) -> Self {
        EngineError::from_provider(err)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
