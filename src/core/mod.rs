pub mod abi;
pub mod artifacts;
pub mod sequencer;
pub mod steps;

pub use crate::domain::model::{StepOutput, TxReceipt, TxRequest};
pub use crate::domain::ports::{Artifact, ArtifactStore, ChainClient};
pub use crate::utils::error::Result;
