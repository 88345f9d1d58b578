//! Fetching raw, not-yet-verified proof material for a known index slot:
//! the map-based case is a single `eth_getProof` call, the MiniMe case first
//! walks the checkpoint array (via `eth_getStorageAt`) to find the pair that
//! brackets `target_block`, then fetches both legs in one `eth_getProof`
//! call, since a single call already accepts multiple keys.

use ethers::types::{H160, U256};
use tokenproof_token::{MiniMeProof, NextCheckpoint};
use tokenproof_types::{BlockTag, EthRpcClient, StorageProof, StorageResult};

use crate::discover::minime_array_length;
use crate::error::DiscoveryError;

/// Fetches the single storage proof for a map-based balance at `index_slot`.
pub async fn fetch_mapbased_proof(
    client: &dyn EthRpcClient,
    contract: H160,
    holder: H160,
    index_slot: u32,
    tag: BlockTag,
) -> Result<(StorageProof, StorageResult), DiscoveryError> {
    let key = tokenproof_token::map_slot(holder, index_slot);
    let full = client.get_proof(contract, &[key], tag).await?;
    let result = full
        .storage
        .iter()
        .find(|r| r.key == key)
        .cloned()
        .ok_or(DiscoveryError::UnexpectedProofShape {
            expected: 1,
            found: full.storage.len(),
        })?;
    Ok((full, result))
}

/// Fetches both legs of a MiniMe proof pair bracketing `target_block`:
/// the last checkpoint with `from_block <= target_block`, and the checkpoint
/// immediately after it (or the next, still-unwritten array slot, proved
/// absent, if the bracketing checkpoint is the last one).
pub async fn fetch_minime_proof(
    client: &dyn EthRpcClient,
    contract: H160,
    holder: H160,
    index_slot: u32,
    target_block: u64,
    tag: BlockTag,
) -> Result<(StorageProof, MiniMeProof), DiscoveryError> {
    let length = minime_array_length(client, contract, holder, index_slot, tag).await?;
    if length.is_zero() {
        return Err(DiscoveryError::NoCheckpoints { index_slot });
    }

    let base = tokenproof_token::array_base(tokenproof_token::map_slot(holder, index_slot));
    let mut active_position = None;
    let mut position = length;
    while position > U256::zero() {
        position -= U256::one();
        let key = tokenproof_token::array_element(base, position);
        let word = client.storage_at(contract, key, tag).await?;
        let checkpoint = tokenproof_token::decode_minime(word.as_bytes())?;
        if checkpoint.from_block <= u128::from(target_block) {
            active_position = Some(position);
            break;
        }
    }
    let active_position = active_position.ok_or(DiscoveryError::NoCheckpointBeforeTarget {
        target_block,
    })?;

    let active_key = tokenproof_token::array_element(base, active_position);
    let next_key = tokenproof_token::array_element(base, active_position + U256::one());

    let full = client
        .get_proof(contract, &[active_key, next_key], tag)
        .await?;
    if full.storage.len() != 2 {
        return Err(DiscoveryError::UnexpectedProofShape {
            expected: 2,
            found: full.storage.len(),
        });
    }
    let active = full
        .storage
        .iter()
        .find(|r| r.key == active_key)
        .cloned()
        .ok_or(DiscoveryError::UnexpectedProofShape {
            expected: 2,
            found: full.storage.len(),
        })?;
    let next_result = full
        .storage
        .iter()
        .find(|r| r.key == next_key)
        .cloned()
        .ok_or(DiscoveryError::UnexpectedProofShape {
            expected: 2,
            found: full.storage.len(),
        })?;

    let next = if next_result.value.is_zero() {
        NextCheckpoint::Absent {
            key: next_result.key,
            proof: next_result.proof,
        }
    } else {
        NextCheckpoint::Present(next_result)
    };

    Ok((full, MiniMeProof { active, next }))
}
