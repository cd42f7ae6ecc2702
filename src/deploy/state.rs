//! Per-chain deployment state machine.
//!
//! ```text
//! Pending -> Switching -> Deploying(NetworkReady -> SignerReady -> GasEstimated -> Submitted) -> Success
//!                 \                 \
//!                  `-> Failed        `-> Failed
//! ```
//!
//! Progress is derived from the phase, so it cannot drift from the status. A
//! failed attempt keeps the progress it had reached.

use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Steps inside the `Deploying` phase, in the order they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeployStep {
    /// Wallet reports the requested chain
    NetworkReady,
    /// Active chain confirmed and factory resolved
    SignerReady,
    GasEstimated,
    /// Creation transaction broadcast
    Submitted,
}

impl DeployStep {
    pub fn progress(&self) -> u8 {
        match self {
            DeployStep::NetworkReady => 30,
            DeployStep::SignerReady => 50,
            DeployStep::GasEstimated => 70,
            DeployStep::Submitted => 85,
        }
    }
}

/// Addresses produced by a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub token_address: Address,
    pub pool_address: Address,
    pub transaction_hash: B256,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentPhase {
    Pending,
    Switching,
    Deploying(DeployStep),
    Success(DeploymentResult),
    /// Progress is frozen at the point the attempt stopped
    Failed { message: String, progress: u8 },
}

/// Coarse status for display and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Switching,
    Deploying,
    Success,
    Error,
}

impl DeploymentPhase {
    pub fn status(&self) -> DeploymentStatus {
        match self {
            DeploymentPhase::Pending => DeploymentStatus::Pending,
            DeploymentPhase::Switching => DeploymentStatus::Switching,
            DeploymentPhase::Deploying(_) => DeploymentStatus::Deploying,
            DeploymentPhase::Success(_) => DeploymentStatus::Success,
            DeploymentPhase::Failed { .. } => DeploymentStatus::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentPhase::Success(_) | DeploymentPhase::Failed { .. })
    }

    /// Whether `next` may follow `self`.
    fn allows(&self, next: &DeploymentPhase) -> bool {
        use DeploymentPhase::*;
        match (self, next) {
            (Success(_), _) | (Failed { .. }, _) => false,
            (_, Failed { .. }) => true,
            (Pending, Switching) => true,
            (Switching, Deploying(DeployStep::NetworkReady)) => true,
            (Deploying(from), Deploying(to)) => to > from,
            (Deploying(DeployStep::Submitted), Success(_)) => true,
            _ => false,
        }
    }
}

/// Observable state of one deployment attempt on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentState {
    pub chain_id: u64,
    pub chain_name: String,
    phase: DeploymentPhase,
    pub updated_at: DateTime<Utc>,
}

impl DeploymentState {
    pub fn new(chain_id: u64, chain_name: impl Into<String>) -> Self {
        Self {
            chain_id,
            chain_name: chain_name.into(),
            phase: DeploymentPhase::Pending,
            updated_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> &DeploymentPhase {
        &self.phase
    }

    pub fn status(&self) -> DeploymentStatus {
        self.phase.status()
    }

    pub fn progress(&self) -> u8 {
        match &self.phase {
            DeploymentPhase::Pending => 0,
            DeploymentPhase::Switching => 10,
            DeploymentPhase::Deploying(step) => step.progress(),
            DeploymentPhase::Success(_) => 100,
            DeploymentPhase::Failed { progress, .. } => *progress,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            DeploymentPhase::Failed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&DeploymentResult> {
        match &self.phase {
            DeploymentPhase::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn advance(&mut self, next: DeploymentPhase) -> EngineResult<()> {
        if !self.phase.allows(&next) {
            return Err(EngineError::InvalidTransition(format!(
                "chain {}: {:?} -> {:?}",
                self.chain_id,
                self.phase.status(),
                next.status()
            )));
        }
        if let DeploymentPhase::Failed { message, .. } = next {
            self.fail(message);
            return Ok(());
        }
        self.phase = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record a failure, keeping the progress reached so far. A state that
    /// already finished keeps its outcome.
    pub fn fail(&mut self, message: impl Into<String>) {
        if !self.is_terminal() {
            let progress = self.progress();
            self.phase = DeploymentPhase::Failed {
                message: message.into(),
                progress,
            };
            self.updated_at = Utc::now();
        }
    }
}
