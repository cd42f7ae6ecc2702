//! Chain registry: RPC endpoints, native currency and factory per chain.

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

/// Native currency metadata of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// Everything the engine needs to know about one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// EIP-155 chain id
    pub chain_id: u64,
    /// Display name
    pub name: String,
    /// RPC endpoints in order of preference
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub native_currency: NativeCurrency,
    /// Token factory deployed on this chain, if any
    #[serde(default)]
    pub factory_address: Option<Address>,
    /// Creation fee to attach when the factory cannot be asked for it
    #[serde(default)]
    pub creation_fee: Option<U256>,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

impl ChainConfig {
    /// Explorer link for a transaction, if the chain has an explorer.
    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

/// Lookup of chain configurations by id.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: BTreeMap<u64, ChainConfig>,
}

impl ChainRegistry {
    pub fn new(chains: Vec<ChainConfig>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for chain in chains {
            if chain.rpc_urls.is_empty() {
                return Err(anyhow!("chain {} has no RPC endpoints", chain.chain_id));
            }
            if map.insert(chain.chain_id, chain.clone()).is_some() {
                return Err(anyhow!("chain {} is defined twice", chain.chain_id));
            }
        }
        Ok(Self { chains: map })
    }

    /// Load a JSON array of chain definitions.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chain registry {}", path.display()))?;
        let chains: Vec<ChainConfig> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse chain registry {}", path.display()))?;
        Self::new(chains)
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.get(&chain_id)
    }

    /// Factory address for a chain, or `ChainNotConfigured`.
    pub fn factory_for(&self, chain_id: u64) -> EngineResult<Address> {
        self.get(chain_id)
            .and_then(|chain| chain.factory_address)
            .filter(|address| !address.is_zero())
            .ok_or(EngineError::ChainNotConfigured(chain_id))
    }

    /// Display name, falling back to the numeric id.
    pub fn display_name(&self, chain_id: u64) -> String {
        self.get(chain_id)
            .map(|chain| chain.name.clone())
            .unwrap_or_else(|| format!("Chain {}", chain_id))
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.values()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
