//! Error types for the I/O-bearing half of the workspace: slot discovery,
//! proof fetching and the façade that combines them with the pure verifiers
//! in `tokenproof_token`.

use thiserror::Error;
use tokenproof_types::RpcError;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Value(#[from] tokenproof_token::ValueError),
    #[error("no index slot in 0..{bound} produced the expected balance")]
    SlotNotFound { bound: u32 },
    #[error("minime checkpoint array at slot {index_slot} is empty")]
    NoCheckpoints { index_slot: u32 },
    #[error("no checkpoint at or before target block {target_block}")]
    NoCheckpointBeforeTarget { target_block: u64 },
    #[error("eth_getProof returned {found} storage results, expected {expected}")]
    UnexpectedProofShape { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum FacadeError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    MapBased(#[from] tokenproof_token::MapBasedError),
    #[error(transparent)]
    MiniMe(#[from] tokenproof_token::MiniMeError),
    #[error("a map-based handle cannot verify a minime proof bundle, and vice versa")]
    WrongBundleShape,
}
