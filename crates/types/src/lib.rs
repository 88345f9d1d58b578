//! Data model shared by the RLP/trie verifier core and the token engines.
//!
//! Hash, address and big-integer primitives are the `ethers` types already
//! used throughout this workspace for ABI and JSON-RPC interop, rather than
//! newtypes duplicating them.

use ethers::types::{Bytes, H160, H256, U256, U64};
use serde::{Deserialize, Serialize};

pub mod rpc;
pub use rpc::{BlockHeader, BlockTag, EthRpcClient, RpcError, SharedRpcClient};

/// The two storage layouts this system knows how to prove a balance for.
///
/// A tagged variant dispatched via a small trait (see `tokenproof_token::facade`)
/// rather than a shared base struct: the layouts share only this façade shape,
/// not their storage arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    MapBased,
    MiniMe,
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::MapBased => write!(f, "mapbased"),
            Layout::MiniMe => write!(f, "minime"),
        }
    }
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mapbased" => Ok(Layout::MapBased),
            "minime" => Ok(Layout::MiniMe),
            other => Err(format!("unknown token layout '{other}', expected mapbased or minime")),
        }
    }
}

/// ABI-getter bundle for an ERC20-style token. Fetching these values is an
/// external collaborator's job (out of scope); this is only the shape
/// `discover_slot` compares a probed storage word against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

impl TokenData {
    pub const UNKNOWN_NAME: &'static str = "unknown-name";
    pub const UNKNOWN_SYMBOL: &'static str = "unknown-symbol";
}

/// A single storage slot's EIP-1186 proof, nested inside a `StorageProof`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageResult {
    /// The raw (not hashed) storage slot key.
    pub key: H256,
    /// The 32-byte storage word, interpreted as an unsigned integer.
    pub value: U256,
    /// Ordered RLP-encoded trie nodes from `storage_hash` down to this key.
    pub proof: Vec<Bytes>,
}

/// The `eth_getProof` response shape (EIP-1186), trimmed to the fields this
/// workspace's verifiers consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProof {
    pub state_root: H256,
    pub height: u64,
    pub address: H160,
    pub account_proof: Vec<Bytes>,
    pub balance: U256,
    pub nonce: U64,
    pub code_hash: H256,
    pub storage_hash: H256,
    pub storage: Vec<StorageResult>,
}
