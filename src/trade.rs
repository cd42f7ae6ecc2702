//! Trade execution.
//!
//! Turns an approved [`TradeIntent`] into a mined transaction. The minimum
//! output is always re-derived from the intent's slippage tolerance, gas limits
//! carry a safety buffer over the node's estimate, and sells top up the pool's
//! allowance first when it is short.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::amounts::{apply_slippage, gas_limit_with_buffer};
use crate::config::EngineConfig;
use crate::contracts::abi::{IBondingPool, IERC20};
use crate::contracts::gateway::{ChainReader, TxReceipt, TxRequest, WalletSession};
use crate::error::{EngineError, EngineResult};
use crate::quote::SwapQuote;
use crate::resolver::{with_timeout, AmmResolver};
use crate::types::TradeAction;

/// A trade the user has confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub token: Address,
    pub action: TradeAction,
    /// Native amount for buys, token amount for sells
    pub amount: U256,
    /// Maximum tolerated deviation from `expected_output`, in percent
    pub slippage_tolerance: f64,
    /// Output of the quote the user approved
    pub expected_output: U256,
    pub price_impact_percent: f64,
    pub estimated_gas_fee: U256,
}

impl TradeIntent {
    /// Carry an approved quote forward with the user's chosen tolerance.
    pub fn from_quote(quote: &SwapQuote, slippage_tolerance: f64) -> Self {
        Self {
            token: quote.token,
            action: quote.action,
            amount: quote.input_amount,
            slippage_tolerance,
            expected_output: quote.output_amount,
            price_impact_percent: quote.price_impact_percent,
            estimated_gas_fee: quote.estimated_gas_fee,
        }
    }

    /// Minimum acceptable output for execution.
    pub fn minimum_output(&self) -> EngineResult<U256> {
        apply_slippage(self.expected_output, self.slippage_tolerance)
    }

    fn validate(&self) -> EngineResult<()> {
        if self.amount.is_zero() {
            return Err(EngineError::InvalidTradeParameters("amount must be greater than zero".to_string()));
        }
        if !(0.0..100.0).contains(&self.slippage_tolerance) {
            return Err(EngineError::InvalidTradeParameters(format!(
                "slippage tolerance must be in [0, 100), got {}",
                self.slippage_tolerance
            )));
        }
        Ok(())
    }
}

/// Submits trades through the user's wallet.
pub struct TradeExecutor {
    reader: Arc<dyn ChainReader>,
    resolver: AmmResolver,
    wallet: Option<Arc<dyn WalletSession>>,
    gas_buffer_percent: u32,
    read_timeout: Duration,
    receipt_timeout: Duration,
}

impl TradeExecutor {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        resolver: AmmResolver,
        wallet: Option<Arc<dyn WalletSession>>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            reader,
            resolver,
            wallet,
            gas_buffer_percent: config.gas_buffer_percent,
            read_timeout: config.rpc_timeout(),
            receipt_timeout: config.receipt_timeout(),
        }
    }

    /// Execute a confirmed trade and return its transaction hash.
    #[instrument(skip(self, intent), fields(token = %intent.token, action = %intent.action))]
    pub async fn execute_trade(&self, intent: &TradeIntent) -> EngineResult<B256> {
        intent.validate()?;

        let wallet = self.wallet.as_ref().ok_or(EngineError::WalletNotConnected)?;
        let account = wallet.account().ok_or(EngineError::WalletNotConnected)?;
        self.ensure_wallet_chain(wallet.as_ref()).await?;

        let pool = self.resolver.resolve_pool_address(intent.token).await?;
        let min_out = intent.minimum_output()?;

        let tx_hash = match intent.action {
            TradeAction::Buy => self.buy(wallet.as_ref(), pool, intent.amount, min_out).await?,
            TradeAction::Sell => {
                self.sell(wallet.as_ref(), account, intent.token, pool, intent.amount, min_out)
                    .await?
            }
        };

        info!("{} of {} confirmed: {}", intent.action, intent.token, tx_hash);
        Ok(tx_hash)
    }

    /// Pools are per chain, so the wallet must sit on the reader's chain
    /// before anything is estimated or signed.
    async fn ensure_wallet_chain(&self, wallet: &dyn WalletSession) -> EngineResult<()> {
        let expected = self.reader.chain_id();
        let active = wallet.chain_id().await?;
        if active == expected {
            return Ok(());
        }

        info!("Wallet is on chain {}, switching to {}", active, expected);
        switch_wallet(wallet, expected).await?;

        let active = wallet.chain_id().await?;
        if active != expected {
            return Err(EngineError::NetworkUnavailable(format!(
                "wallet is on chain {} instead of {}",
                active, expected
            )));
        }
        Ok(())
    }

    async fn buy(&self, wallet: &dyn WalletSession, pool: Address, value: U256, min_tokens_out: U256) -> EngineResult<B256> {
        debug!("Buying on {} with minTokensOut {}", pool, min_tokens_out);
        let data = IBondingPool::buyCall {
            minTokensOut: min_tokens_out,
        }
        .abi_encode();
        self.submit(wallet, TxRequest::new(pool, data, value)).await
    }

    async fn sell(
        &self,
        wallet: &dyn WalletSession,
        account: Address,
        token: Address,
        pool: Address,
        amount: U256,
        min_native_out: U256,
    ) -> EngineResult<B256> {
        let balance = with_timeout(self.read_timeout, "balanceOf", self.reader.balance_of(token, account)).await?;
        if balance < amount {
            return Err(EngineError::InsufficientFunds(format!(
                "token balance {} is below sell amount {}",
                balance, amount
            )));
        }

        let allowance = with_timeout(self.read_timeout, "allowance", self.reader.allowance(token, account, pool)).await?;
        if allowance < amount {
            info!("Allowance {} below {}, approving pool {}", allowance, amount, pool);
            let data = IERC20::approveCall {
                spender: pool,
                value: amount,
            }
            .abi_encode();
            self.submit(wallet, TxRequest::new(token, data, U256::ZERO)).await?;
        }

        debug!("Selling {} on {} with minEthOut {}", amount, pool, min_native_out);
        let data = IBondingPool::sellCall {
            tokenAmount: amount,
            minEthOut: min_native_out,
        }
        .abi_encode();
        self.submit(wallet, TxRequest::new(pool, data, U256::ZERO)).await
    }

    /// Estimate, buffer, send and wait for one transaction.
    async fn submit(&self, wallet: &dyn WalletSession, tx: TxRequest) -> EngineResult<B256> {
        let estimate = wallet.estimate_gas(&tx).await.map_err(EngineError::from_estimation)?;
        let gas_limit = gas_limit_with_buffer(estimate, self.gas_buffer_percent);
        debug!("Gas estimate {} buffered to {}", estimate, gas_limit);

        let tx_hash = wallet.send_transaction(tx.with_gas_limit(gas_limit)).await?;
        let receipt = await_receipt(wallet, tx_hash, self.receipt_timeout).await?;
        if !receipt.status {
            warn!("Transaction {} reverted", tx_hash);
            return Err(EngineError::ContractError(format!("transaction {} reverted", tx_hash)));
        }
        Ok(tx_hash)
    }
}

/// Ask the wallet to attach to `chain_id`. A declined prompt stays
/// `UserRejected`; any other failure is `NetworkUnavailable`.
pub(crate) async fn switch_wallet(wallet: &dyn WalletSession, chain_id: u64) -> EngineResult<()> {
    match wallet.switch_chain(chain_id).await {
        Ok(()) => Ok(()),
        Err(e) => Err(match EngineError::from_provider(e) {
            EngineError::UserRejected => EngineError::UserRejected,
            other => EngineError::NetworkUnavailable(format!("switch to chain {} failed: {}", chain_id, other)),
        }),
    }
}

/// Wait for a receipt under a deadline. Giving up does not cancel the
/// transaction; it may still be mined later.
pub(crate) async fn await_receipt(
    wallet: &dyn WalletSession,
    tx_hash: B256,
    timeout: Duration,
) -> EngineResult<TxReceipt> {
    match tokio::time::timeout(timeout, wallet.wait_for_receipt(tx_hash)).await {
        Ok(receipt) => Ok(receipt?),
        Err(_) => {
            warn!("Stopped waiting for receipt of {} after {:?}", tx_hash, timeout);
            Err(EngineError::Timeout(format!("receipt for {}", tx_hash)))
        }
    }
}
