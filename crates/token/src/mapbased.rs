//! The map-based proof engine: standard `mapping(address => uint256)`
//! balance layouts.

use ethers::types::{H160, H256, U256};
use thiserror::Error;
use tokenproof_types::StorageResult;

use crate::slot::map_slot;
use crate::value::{decode_uint256, ValueError};

#[derive(Debug, Error)]
pub enum MapBasedError {
    #[error("expected key {expected:#x}, result carries {found:#x}")]
    KeyMismatch { expected: H256, found: H256 },
    #[error("claimed balance {claimed} does not match proof value {found}")]
    ValueMismatch { claimed: U256, found: U256 },
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Trie(#[from] tokenproof_trie::VerifyError),
}

/// Verifies that `result` proves `holder`'s balance is `target_balance` under
/// `storage_root`, for a `mapping` declared at `index_slot`.
///
/// `target_block` is accepted for façade symmetry with the MiniMe engine but
/// is not otherwise used: a map-based balance has no history to range over.
pub fn verify_proof(
    holder: H160,
    storage_root: H256,
    result: &StorageResult,
    index_slot: u32,
    target_balance: U256,
    _target_block: Option<u64>,
) -> Result<tokenproof_trie::Verified, MapBasedError> {
    // `result.key` is an H256: the wire-shape check ("len == 32") on a raw
    // key is guaranteed statically by this type.
    let expected_key = map_slot(holder, index_slot);
    if result.key != expected_key {
        return Err(MapBasedError::KeyMismatch {
            expected: expected_key,
            found: result.key,
        });
    }

    let mut word = [0u8; 32];
    result.value.to_big_endian(&mut word);
    let proof_balance = decode_uint256(&word)?;
    if proof_balance != target_balance {
        return Err(MapBasedError::ValueMismatch {
            claimed: target_balance,
            found: proof_balance,
        });
    }

    let mut target_be = [0u8; 32];
    target_balance.to_big_endian(&mut target_be);
    let expected_value = tokenproof_rlp::encode_uint(&target_be);

    let mut root = [0u8; 32];
    root.copy_from_slice(storage_root.as_bytes());

    let proof: Vec<Vec<u8>> = result.proof.iter().map(|b| b.to_vec()).collect();
    Ok(tokenproof_trie::verify(
        root,
        result.key.as_bytes(),
        Some(&expected_value),
        &proof,
    )?)
}
