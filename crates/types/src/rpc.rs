//! The RPC seam: a small trait abstracting the JSON-RPC methods this
//! workspace consumes, so the pure proof-verifying core never touches a
//! transport and offline (captured-proof) tests never touch a network.
//!
//! Concrete transports (`EthersRpcClient` over `reqwest`) live in
//! `tokenproof_discovery`; this crate only owns the shape of the seam.

use async_trait::async_trait;
use ethers::types::{Bytes, H160, H256};
use thiserror::Error;

use crate::StorageProof;

/// A block selector: `"latest"`, `"pending"`, or a specific height.
/// Serializes to the `0x`-prefixed minimal hex integer the RPC methods
/// expect (the single digit `"0x0"` for height zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Pending,
    Number(u64),
}

impl BlockTag {
    pub fn to_rpc_param(self) -> String {
        match self {
            BlockTag::Latest => "latest".to_string(),
            BlockTag::Pending => "pending".to_string(),
            BlockTag::Number(0) => "0x0".to_string(),
            BlockTag::Number(n) => format!("0x{n:x}"),
        }
    }
}

/// A block's identifying fields, trimmed to what this workspace's verifiers
/// need: the height and the state root that anchors trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub state_root: H256,
}

/// Transport/remote failures: `RpcFailure` and `Cancelled` are the only two
/// kinds this seam produces; everything else is a proof-verifier error
/// produced further up the stack, never here.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("RPC call failed: {0}")]
    RpcFailure(String),
    #[error("RPC call was cancelled or exceeded its deadline")]
    Cancelled,
}

/// The JSON-RPC surface this workspace consumes, named one method per call.
/// Every implementation is expected to carry its own explicit per-call
/// deadline; this trait does not impose one, since a fixture-backed test
/// double has no need for one.
#[async_trait]
pub trait EthRpcClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, RpcError>;
    async fn block_number(&self) -> Result<u64, RpcError>;
    async fn block_by_number(&self, tag: BlockTag) -> Result<BlockHeader, RpcError>;
    async fn storage_at(&self, address: H160, slot: H256, tag: BlockTag) -> Result<H256, RpcError>;
    async fn get_proof(
        &self,
        address: H160,
        slots: &[H256],
        tag: BlockTag,
    ) -> Result<StorageProof, RpcError>;
    /// ABI-encoded call to the contract (`eth_call`), for the reference
    /// CLI's balanceOf/decimals lookups. The ABI encoding itself is an
    /// external collaborator's concern; this method only carries the
    /// already-encoded request through.
    async fn call(&self, to: H160, data: Bytes, tag: BlockTag) -> Result<Bytes, RpcError>;
}

/// Convenience alias used by discovery/façade code that only needs a shared,
/// trait-object handle to whatever transport the caller constructed.
pub type SharedRpcClient = std::sync::Arc<dyn EthRpcClient>;
