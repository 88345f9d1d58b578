//! RPC-backed slot discovery and proof fetching, a live `ethers`
//! transport for the `EthRpcClient` seam, a bounded-concurrency batch
//! driver, and the token façade that ties them to the pure verifiers in
//! `tokenproof_token`.

pub mod batch;
pub mod client;
pub mod discover;
pub mod error;
pub mod facade;
pub mod proof;

pub use batch::{run_batch, BatchConfig, BatchResult};
pub use client::EthersRpcClient;
pub use discover::{discover_mapbased_slot, discover_minime_slot, DEFAULT_SLOT_BOUND};
pub use error::{DiscoveryError, FacadeError};
pub use facade::{ProofBundle, TokenHandle, VerifiedBundle};
pub use proof::{fetch_mapbased_proof, fetch_minime_proof};
