//! Token deployment across one or more chains.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{DeploymentMode, DeploymentOrchestrator, DeploymentReport};
pub use state::{DeployStep, DeploymentPhase, DeploymentResult, DeploymentState, DeploymentStatus};
