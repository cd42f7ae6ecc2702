//! Decoding of factory creation events.
//!
//! Factories have emitted two event shapes over time. Each shape gets a pure
//! decoder; callers try [`CREATION_DECODERS`] in order and keep the first hit.

use alloy_primitives::{Address, B256};
use alloy_sol_types::SolEvent;
use serde::{Deserialize, Serialize};

use super::abi::{ILegacyTokenFactory, ITokenFactory};
use super::gateway::RawLog;

/// Which event shape a creation log used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationEventKind {
    Current,
    Legacy,
}

/// Addresses carried by a creation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationEvent {
    pub token: Address,
    pub creator: Address,
    pub pool: Address,
    pub name: String,
    pub symbol: String,
    pub kind: CreationEventKind,
}

pub type CreationDecoder = fn(&RawLog) -> Option<CreationEvent>;

/// Decoders in the order they are tried.
pub const CREATION_DECODERS: &[CreationDecoder] = &[decode_current, decode_legacy];

/// Topic-0 hashes of every supported creation event.
pub fn creation_signatures() -> [B256; 2] {
    [
        ITokenFactory::TokenCreated::SIGNATURE_HASH,
        ILegacyTokenFactory::TokenCreated::SIGNATURE_HASH,
    ]
}

pub fn decode_current(log: &RawLog) -> Option<CreationEvent> {
    let event =
        ITokenFactory::TokenCreated::decode_raw_log(log.topics.iter().copied(), &log.data, true).ok()?;
    Some(CreationEvent {
        token: event.token,
        creator: event.creator,
        pool: event.amm,
        name: event.name,
        symbol: event.symbol,
        kind: CreationEventKind::Current,
    })
}

pub fn decode_legacy(log: &RawLog) -> Option<CreationEvent> {
    let event =
        ILegacyTokenFactory::TokenCreated::decode_raw_log(log.topics.iter().copied(), &log.data, true)
            .ok()?;
    Some(CreationEvent {
        token: event.token,
        creator: event.creator,
        pool: event.amm,
        name: event.name,
        symbol: event.symbol,
        kind: CreationEventKind::Legacy,
    })
}

/// Run the decoder chain over one log.
pub fn decode_creation(log: &RawLog) -> Option<CreationEvent> {
    CREATION_DECODERS.iter().find_map(|decode| decode(log))
}

/// Build raw logs for tests and simulations.
pub mod encode {
    use super::*;
    use alloy_primitives::U256;

    pub fn current_log(factory: Address, token: Address, creator: Address, pool: Address, block: u64) -> RawLog {
        let event = ITokenFactory::TokenCreated {
            token,
            creator,
            amm: pool,
            name: "Test".to_string(),
            symbol: "TST".to_string(),
            totalSupply: U256::from(1_000_000_000u64),
            timestamp: U256::from(1_700_000_000u64),
        };
        to_raw(factory, event.encode_log_data(), block)
    }

    pub fn legacy_log(factory: Address, token: Address, creator: Address, pool: Address, block: u64) -> RawLog {
        let event = ILegacyTokenFactory::TokenCreated {
            token,
            creator,
            amm: pool,
            name: "Test".to_string(),
            symbol: "TST".to_string(),
        };
        to_raw(factory, event.encode_log_data(), block)
    }

    fn to_raw(address: Address, data: alloy_primitives::LogData, block: u64) -> RawLog {
        RawLog {
            address,
            topics: data.topics().to_vec(),
            data: data.data.clone(),
            block_number: block,
            log_index: 0,
            transaction_hash: None,
        }
    }
}
