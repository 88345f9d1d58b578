//! Slot discovery: probing successive index-slot candidates and comparing
//! the decoded on-chain value against a balance the caller already trusts.
//! The search is bounded at 20 candidate slots by default; callers can widen
//! it.
//!
//! Fetching `known_balance` (an ABI-encoded `balanceOf` call) is the calling
//! binary's job, not this crate's: the ABI bindings are an external
//! collaborator by design.

use ethers::types::{H160, U256};
use log::debug;
use tokenproof_types::{BlockTag, EthRpcClient};

use crate::error::DiscoveryError;

/// Default bound on the number of candidate index slots probed.
pub const DEFAULT_SLOT_BOUND: u32 = 20;

/// Probes `map_slot(holder, i)` for `i` in `0..bound`, returning the first
/// index slot whose decoded storage word equals `known_balance`.
pub async fn discover_mapbased_slot(
    client: &dyn EthRpcClient,
    contract: H160,
    holder: H160,
    known_balance: U256,
    tag: BlockTag,
    bound: u32,
) -> Result<u32, DiscoveryError> {
    for index in 0..bound {
        let slot = tokenproof_token::map_slot(holder, index);
        let word = client.storage_at(contract, slot, tag).await?;
        let candidate = tokenproof_token::decode_uint256(word.as_bytes())?;
        debug!("mapbased probe index={index} candidate={candidate}");
        if candidate == known_balance {
            return Ok(index);
        }
    }
    Err(DiscoveryError::SlotNotFound { bound })
}

/// Probes the MiniMe checkpoint-array base at `map_slot(holder, i)` for `i`
/// in `0..bound`: an empty array (length 0) is skipped, otherwise the last
/// checkpoint's balance is compared against `known_balance`.
pub async fn discover_minime_slot(
    client: &dyn EthRpcClient,
    contract: H160,
    holder: H160,
    known_balance: U256,
    tag: BlockTag,
    bound: u32,
) -> Result<u32, DiscoveryError> {
    for index in 0..bound {
        let length = minime_array_length(client, contract, holder, index, tag).await?;
        if length.is_zero() {
            continue;
        }
        let base = tokenproof_token::array_base(tokenproof_token::map_slot(holder, index));
        let last_key = tokenproof_token::array_element(base, length - U256::one());
        let word = client.storage_at(contract, last_key, tag).await?;
        let checkpoint = tokenproof_token::decode_minime(word.as_bytes())?;
        debug!(
            "minime probe index={index} last_checkpoint_balance={} from_block={}",
            checkpoint.balance, checkpoint.from_block
        );
        if checkpoint.from_block != 0
            && known_balance <= U256::from(u128::MAX)
            && checkpoint.balance == known_balance.as_u128()
        {
            return Ok(index);
        }
    }
    Err(DiscoveryError::SlotNotFound { bound })
}

/// Reads the checkpoint-array length stored directly at `map_slot(holder, index_slot)`.
pub async fn minime_array_length(
    client: &dyn EthRpcClient,
    contract: H160,
    holder: H160,
    index_slot: u32,
    tag: BlockTag,
) -> Result<U256, DiscoveryError> {
    let slot = tokenproof_token::map_slot(holder, index_slot);
    let word = client.storage_at(contract, slot, tag).await?;
    Ok(tokenproof_token::decode_uint256(word.as_bytes())?)
}
