//! Multi-chain token deployment.
//!
//! One wallet session can only be attached to one chain at a time, so chains
//! are processed strictly one after another. A failing chain is recorded and
//! the batch moves on; the report always covers every requested attempt.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use super::state::{DeployStep, DeploymentPhase, DeploymentResult, DeploymentState};
use crate::amounts::gas_limit_with_buffer;
use crate::chain::ChainRegistry;
use crate::config::EngineConfig;
use crate::contracts::abi::ITokenFactory;
use crate::contracts::events::CREATION_DECODERS;
use crate::contracts::gateway::{ChainReader, TxRequest, WalletSession};
use crate::contracts::ChainReaders;
use crate::error::{EngineError, EngineResult};
use crate::resolver::{with_timeout, PoolAddressCache};
use crate::trade::{await_receipt, switch_wallet};
use crate::types::TokenForm;

/// Batching mode requested by the caller. Both run sequentially.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    #[default]
    Sequential,
    Parallel,
}

/// Outcome of a deployment batch, one entry per requested chain id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub attempts: Vec<DeploymentState>,
}

impl DeploymentReport {
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &DeploymentState> {
        self.attempts.iter().filter(|s| s.result().is_some())
    }

    pub fn failures(&self) -> impl Iterator<Item = &DeploymentState> {
        self.attempts.iter().filter(|s| s.error().is_some())
    }

    /// Keyed by chain id. When a chain was requested more than once the last
    /// attempt wins.
    pub fn into_map(self) -> HashMap<u64, DeploymentState> {
        self.attempts.into_iter().map(|s| (s.chain_id, s)).collect()
    }
}

/// Sequences token creation across chains.
pub struct DeploymentOrchestrator {
    registry: Arc<ChainRegistry>,
    readers: ChainReaders,
    wallet: Option<Arc<dyn WalletSession>>,
    cache: PoolAddressCache,
    gas_buffer_percent: u32,
    read_timeout: Duration,
    receipt_timeout: Duration,
    updates: watch::Sender<Vec<DeploymentState>>,
}

impl DeploymentOrchestrator {
    pub fn new(
        registry: Arc<ChainRegistry>,
        readers: ChainReaders,
        wallet: Option<Arc<dyn WalletSession>>,
        cache: PoolAddressCache,
        config: &EngineConfig,
    ) -> Self {
        let (updates, _) = watch::channel(Vec::new());
        Self {
            registry,
            readers,
            wallet,
            cache,
            gas_buffer_percent: config.gas_buffer_percent,
            read_timeout: config.rpc_timeout(),
            receipt_timeout: config.receipt_timeout(),
            updates,
        }
    }

    /// Snapshots of the running batch, published after every transition.
    pub fn subscribe(&self) -> watch::Receiver<Vec<DeploymentState>> {
        self.updates.subscribe()
    }

    fn connected_wallet(&self) -> EngineResult<(&Arc<dyn WalletSession>, Address)> {
        let wallet = self.wallet.as_ref().ok_or(EngineError::WalletNotConnected)?;
        let account = wallet.account().ok_or(EngineError::WalletNotConnected)?;
        Ok((wallet, account))
    }

    /// Deploy `form` on every chain in `chain_ids`, in order.
    #[instrument(skip(self, form, image_url), fields(chains = chain_ids.len(), symbol = %form.symbol))]
    pub async fn deploy_to_multiple_chains(
        &self,
        chain_ids: &[u64],
        form: &TokenForm,
        image_url: Option<&str>,
        mode: DeploymentMode,
    ) -> EngineResult<DeploymentReport> {
        let (wallet, _) = self.connected_wallet()?;

        if mode == DeploymentMode::Parallel {
            debug!("Parallel deployment requested; running sequentially on a single wallet session");
        }

        let mut states: Vec<DeploymentState> = chain_ids
            .iter()
            .map(|&chain_id| DeploymentState::new(chain_id, self.registry.display_name(chain_id)))
            .collect();
        self.publish(&states);

        for index in 0..states.len() {
            let chain_id = states[index].chain_id;
            info!("Deploying {} to {} ({}/{})", form.symbol, states[index].chain_name, index + 1, states.len());

            let outcome = self
                .deploy_on_chain(wallet.as_ref(), &mut states, index, form, image_url)
                .await;

            match outcome {
                Ok(result) => info!(
                    "Deployed {} on chain {}: token {} pool {}",
                    form.symbol, chain_id, result.token_address, result.pool_address
                ),
                Err(e) => {
                    error!("Deployment on chain {} failed: {}", chain_id, e);
                    states[index].fail(e.user_message());
                    self.publish(&states);
                }
            }
        }

        let succeeded = states.iter().filter(|s| s.result().is_some()).count();
        info!("Deployment batch finished: {}/{} chains succeeded", succeeded, states.len());
        Ok(DeploymentReport { attempts: states })
    }

    /// Create a token on the chain the wallet is currently attached to.
    #[instrument(skip(self, form, image_url), fields(symbol = %form.symbol))]
    pub async fn create_token(&self, form: &TokenForm, image_url: Option<&str>) -> EngineResult<DeploymentResult> {
        let (wallet, _) = self.connected_wallet()?;
        let chain_id = wallet.chain_id().await?;
        let mut no_progress = |_: DeployStep| -> EngineResult<()> { Ok(()) };
        self.create_on_active_chain(wallet.as_ref(), chain_id, form, image_url, &mut no_progress)
            .await
    }

    async fn deploy_on_chain(
        &self,
        wallet: &dyn WalletSession,
        states: &mut [DeploymentState],
        index: usize,
        form: &TokenForm,
        image_url: Option<&str>,
    ) -> EngineResult<DeploymentResult> {
        let chain_id = states[index].chain_id;

        states[index].advance(DeploymentPhase::Switching)?;
        self.publish(states);

        switch_wallet(wallet, chain_id).await?;

        let mut on_step = |step: DeployStep| -> EngineResult<()> {
            states[index].advance(DeploymentPhase::Deploying(step))?;
            self.publish(states);
            Ok(())
        };
        let result = self
            .create_on_active_chain(wallet, chain_id, form, image_url, &mut on_step)
            .await?;

        states[index].advance(DeploymentPhase::Success(result.clone()))?;
        self.publish(states);
        Ok(result)
    }

    /// Creation pipeline shared by single and multi-chain deployment.
    async fn create_on_active_chain(
        &self,
        wallet: &dyn WalletSession,
        chain_id: u64,
        form: &TokenForm,
        image_url: Option<&str>,
        on_step: &mut (dyn FnMut(DeployStep) -> EngineResult<()> + Send),
    ) -> EngineResult<DeploymentResult> {
        on_step(DeployStep::NetworkReady)?;

        let active = wallet.chain_id().await?;
        if active != chain_id {
            return Err(EngineError::NetworkUnavailable(format!(
                "wallet is on chain {} instead of {}",
                active, chain_id
            )));
        }
        let factory = self.registry.factory_for(chain_id)?;
        let reader = self.readers.get(chain_id)?;
        on_step(DeployStep::SignerReady)?;

        let fee = self.creation_fee(reader.as_ref(), chain_id).await;
        let data = ITokenFactory::createTokenCall {
            name: form.name.clone(),
            symbol: form.symbol.clone(),
            description: form.description.clone(),
            imageUrl: image_url.unwrap_or_default().to_string(),
            website: form.website.clone().unwrap_or_default(),
            twitter: form.twitter.clone().unwrap_or_default(),
            telegram: form.telegram.clone().unwrap_or_default(),
        }
        .abi_encode();
        let tx = TxRequest::new(factory, data, fee);

        let estimate = wallet.estimate_gas(&tx).await.map_err(EngineError::from_estimation)?;
        let gas_limit = gas_limit_with_buffer(estimate, self.gas_buffer_percent);
        debug!("createToken gas estimate {} buffered to {}", estimate, gas_limit);
        on_step(DeployStep::GasEstimated)?;

        let tx_hash = wallet.send_transaction(tx.with_gas_limit(gas_limit)).await?;
        on_step(DeployStep::Submitted)?;

        let receipt = await_receipt(wallet, tx_hash, self.receipt_timeout).await?;
        if !receipt.status {
            return Err(EngineError::ContractError(format!("createToken transaction {} reverted", tx_hash)));
        }

        let event = receipt
            .logs
            .iter()
            .filter(|log| log.address == factory)
            .find_map(|log| CREATION_DECODERS.iter().find_map(|decode| decode(log)))
            .ok_or_else(|| EngineError::CreationEventNotFound(tx_hash.to_string()))?;

        self.cache.insert(chain_id, event.token, event.pool).await;

        Ok(DeploymentResult {
            token_address: event.token,
            pool_address: event.pool,
            transaction_hash: tx_hash,
            block_number: receipt.block_number,
        })
    }

    /// Fee from the factory, or the registry's configured fee when the read fails.
    async fn creation_fee(&self, reader: &dyn ChainReader, chain_id: u64) -> U256 {
        match with_timeout(self.read_timeout, "creationFee", reader.creation_fee()).await {
            Ok(fee) => fee,
            Err(e) => {
                let fallback = self
                    .registry
                    .get(chain_id)
                    .and_then(|chain| chain.creation_fee)
                    .unwrap_or_default();
                warn!("creationFee unavailable on chain {} ({}), using {}", chain_id, e, fallback);
                fallback
            }
        }
    }

    fn publish(&self, states: &[DeploymentState]) {
        self.updates.send_replace(states.to_vec());
    }
}
