//! Contract gateway: ABI definitions, the reader and wallet seams, event
//! decoding and the JSON-RPC reader.

pub mod abi;
pub mod events;
pub mod gateway;
pub mod rpc;

pub use events::{CreationEvent, CreationEventKind};
pub use gateway::{ChainReader, Erc20Metadata, FactoryTokenConfig, RawLog, TxReceipt, TxRequest, WalletSession};
pub use rpc::RpcGateway;

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::chain::ChainRegistry;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// One [`ChainReader`] per chain that has a factory.
#[derive(Clone, Default)]
pub struct ChainReaders {
    readers: HashMap<u64, Arc<dyn ChainReader>>,
}

impl ChainReaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an [`RpcGateway`] for every registry chain with a factory.
    /// Chains without one are skipped.
    pub fn from_registry(registry: &ChainRegistry, config: &EngineConfig) -> Self {
        let mut readers = Self::new();
        for chain in registry.chains() {
            match RpcGateway::new(chain, config) {
                Ok(gateway) => readers.insert(Arc::new(gateway)),
                Err(e) => warn!("Skipping reader for {} ({}): {}", chain.name, chain.chain_id, e),
            }
        }
        readers
    }

    pub fn insert(&mut self, reader: Arc<dyn ChainReader>) {
        self.readers.insert(reader.chain_id(), reader);
    }

    pub fn with_reader(mut self, reader: Arc<dyn ChainReader>) -> Self {
        self.insert(reader);
        self
    }

    /// Reader for `chain_id`, or `ChainNotConfigured`.
    pub fn get(&self, chain_id: u64) -> EngineResult<Arc<dyn ChainReader>> {
        self.readers
            .get(&chain_id)
            .cloned()
            .ok_or(EngineError::ChainNotConfigured(chain_id))
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}
