//! The MiniMe proof engine: checkpoint-array balance layouts, verified
//! as an adjacent pair of storage proofs.

use ethers::types::{Bytes, H160, H256, U256};
use thiserror::Error;
use tokenproof_types::StorageResult;

use crate::slot::{array_base, array_element, map_slot};
use crate::value::{decode_minime, decode_uint256, ValueError};

/// Caps how far `result.key` may sit past the array base, ruling out
/// adversarially large fabricated offsets while still bounding verifier work.
pub const MAX_CHECKPOINT_OFFSET: U256 = U256([1 << 16, 0, 0, 0]);

/// The second leg of a MiniMe proof pair: either the next checkpoint, or a
/// proof that no checkpoint exists past the active one.
#[derive(Debug, Clone)]
pub enum NextCheckpoint {
    Present(StorageResult),
    Absent { key: H256, proof: Vec<Bytes> },
}

impl NextCheckpoint {
    fn key(&self) -> H256 {
        match self {
            NextCheckpoint::Present(result) => result.key,
            NextCheckpoint::Absent { key, .. } => *key,
        }
    }
}

/// A MiniMe balance proof: the active checkpoint plus the checkpoint (or
/// proof-of-absence) immediately after it.
#[derive(Debug, Clone)]
pub struct MiniMeProof {
    pub active: StorageResult,
    pub next: NextCheckpoint,
}

#[derive(Debug, Error)]
pub enum MiniMeError {
    #[error("checkpoint offset {offset} from the array base exceeds the bound of 2^16")]
    RangeViolation { offset: U256 },
    #[error("next checkpoint key {next:#x} is not active key {active:#x} + 1")]
    KeyShape { active: H256, next: H256 },
    #[error("active checkpoint's fromBlock {from_block} is after target block {target_block}")]
    ActiveAfterTarget { from_block: u128, target_block: u64 },
    #[error("active checkpoint balance {found} does not match claimed balance {claimed}")]
    BalanceMismatch { claimed: U256, found: u128 },
    #[error("next checkpoint fromBlock {next_block} does not exceed active fromBlock {active_block}")]
    NonIncreasingCheckpoints { active_block: u128, next_block: u128 },
    #[error("next checkpoint fromBlock {next_block} does not exceed target block {target_block}")]
    TargetNotBeforeNext { next_block: u128, target_block: u64 },
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Trie(#[from] tokenproof_trie::VerifyError),
}

/// Verifies a MiniMe balance proof, per the ordering invariants in §4.7:
///
/// 1. `active.fromBlock <= target_block`, `active.balance == target_balance`.
/// 2. If `next` is present: `active.fromBlock < next.fromBlock` and
///    `target_block < next.fromBlock`.
/// 3. If `next` is absent: no further constraint (active is the last
///    checkpoint and stands for all blocks from its own fromBlock onward).
/// 4. Both legs verify against `storage_root` via the trie walker.
pub fn verify_proof(
    holder: H160,
    storage_root: H256,
    proof: &MiniMeProof,
    index_slot: u32,
    target_balance: U256,
    target_block: u64,
) -> Result<(tokenproof_trie::Verified, tokenproof_trie::Verified), MiniMeError> {
    let base = array_base(map_slot(holder, index_slot));
    let base_int = U256::from_big_endian(base.as_bytes());
    let active_int = U256::from_big_endian(proof.active.key.as_bytes());
    let offset = active_int.overflowing_sub(base_int).0;
    if offset >= MAX_CHECKPOINT_OFFSET {
        return Err(MiniMeError::RangeViolation { offset });
    }
    let expected_next_key = array_element(proof.active.key, U256::one());
    if proof.next.key() != expected_next_key {
        return Err(MiniMeError::KeyShape {
            active: proof.active.key,
            next: proof.next.key(),
        });
    }

    let mut active_word = [0u8; 32];
    proof.active.value.to_big_endian(&mut active_word);
    let active_checkpoint = decode_minime(&active_word)?;
    if active_checkpoint.from_block > u128::from(target_block) {
        return Err(MiniMeError::ActiveAfterTarget {
            from_block: active_checkpoint.from_block,
            target_block,
        });
    }
    if target_balance > U256::from(u128::MAX) || active_checkpoint.balance != target_balance.as_u128()
    {
        return Err(MiniMeError::BalanceMismatch {
            claimed: target_balance,
            found: active_checkpoint.balance,
        });
    }

    let active_root_value = tokenproof_rlp::encode_uint(&active_word);
    let active_proof: Vec<Vec<u8>> = proof.active.proof.iter().map(|b| b.to_vec()).collect();
    let active_verified = tokenproof_trie::verify(
        *storage_root.as_fixed_bytes(),
        proof.active.key.as_bytes(),
        Some(&active_root_value),
        &active_proof,
    )?;

    let next_verified = match &proof.next {
        NextCheckpoint::Present(next) => {
            let mut next_word = [0u8; 32];
            next.value.to_big_endian(&mut next_word);
            let next_checkpoint = decode_minime(&next_word)?;
            if next_checkpoint.from_block <= active_checkpoint.from_block {
                return Err(MiniMeError::NonIncreasingCheckpoints {
                    active_block: active_checkpoint.from_block,
                    next_block: next_checkpoint.from_block,
                });
            }
            if next_checkpoint.from_block <= u128::from(target_block) {
                return Err(MiniMeError::TargetNotBeforeNext {
                    next_block: next_checkpoint.from_block,
                    target_block,
                });
            }
            let next_root_value = tokenproof_rlp::encode_uint(&next_word);
            let next_proof: Vec<Vec<u8>> = next.proof.iter().map(|b| b.to_vec()).collect();
            tokenproof_trie::verify(
                *storage_root.as_fixed_bytes(),
                next.key.as_bytes(),
                Some(&next_root_value),
                &next_proof,
            )?
        }
        NextCheckpoint::Absent { key, proof: raw } => {
            let raw: Vec<Vec<u8>> = raw.iter().map(|b| b.to_vec()).collect();
            tokenproof_trie::verify(*storage_root.as_fixed_bytes(), key.as_bytes(), None, &raw)?
        }
    };

    Ok((active_verified, next_verified))
}

/// Convenience used by discovery: the concrete storage word for a checkpoint
/// value, for contexts that only have `decode_uint256` handy (e.g. reading
/// the array length, which is a plain integer, not a packed checkpoint).
pub fn array_length(word: &[u8]) -> Result<U256, ValueError> {
    decode_uint256(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn holder() -> H160 {
        H160::from_str("0xbd9c69654b8f3e5978dfd138b00cb0be29f28ccf").unwrap()
    }

    fn checkpoint_word(balance: u128, from_block: u128) -> U256 {
        let mut word = [0u8; 32];
        word[0..16].copy_from_slice(&balance.to_be_bytes());
        word[16..32].copy_from_slice(&from_block.to_be_bytes());
        U256::from_big_endian(&word)
    }

    fn empty_branch_proof(key: H256, root_bytes: &mut Vec<u8>) -> (H256, Vec<u8>) {
        // An empty-child branch node, itself the whole trie (it is its own root).
        let node = hex::decode("f891a097d37274c14dc79a9874f3387ef34e7dbfbbed0fb3caf668d57323f7fb152f79808080808080a0e05bb037e849d9733f2b57d5132f96c57eb2eca763a5ebbb53f52f88c4cd7abb8080808080a0f9dd0c1cfce2ce11694839a45f4beb3d5ac9af39ddd9949075c6be1223373a0ca0c7219989da6535f0fbaf34d9633adde100c81c6f3efd0b9a423fa4886245fa8c8080").unwrap();
        *root_bytes = node.clone();
        (key, node)
    }

    #[test]
    fn rejects_next_key_not_adjacent_to_active_key() {
        let active_key = map_slot(holder(), 1);
        let wrong_next_key = H256::from_low_u64_be(999);
        let proof = MiniMeProof {
            active: StorageResult {
                key: active_key,
                value: checkpoint_word(100, 10),
                proof: vec![],
            },
            next: NextCheckpoint::Absent {
                key: wrong_next_key,
                proof: vec![],
            },
        };
        let err = verify_proof(holder(), H256::zero(), &proof, 1, U256::from(100), 20)
            .unwrap_err();
        assert!(matches!(err, MiniMeError::KeyShape { .. }));
    }

    #[test]
    fn rejects_active_checkpoint_after_target_block() {
        let active_key = map_slot(holder(), 1);
        let next_key = array_element(active_key, U256::one());
        let proof = MiniMeProof {
            active: StorageResult {
                key: active_key,
                value: checkpoint_word(100, 30),
                proof: vec![],
            },
            next: NextCheckpoint::Absent {
                key: next_key,
                proof: vec![],
            },
        };
        let err = verify_proof(holder(), H256::zero(), &proof, 1, U256::from(100), 20)
            .unwrap_err();
        assert!(matches!(err, MiniMeError::ActiveAfterTarget { .. }));
    }

    #[test]
    fn rejects_next_checkpoint_not_after_active() {
        let active_key = map_slot(holder(), 1);
        let next_key = array_element(active_key, U256::one());
        let proof = MiniMeProof {
            active: StorageResult {
                key: active_key,
                value: checkpoint_word(100, 10),
                proof: vec![],
            },
            next: NextCheckpoint::Present(StorageResult {
                key: next_key,
                value: checkpoint_word(200, 10),
                proof: vec![],
            }),
        };
        let err = verify_proof(holder(), H256::zero(), &proof, 1, U256::from(100), 15)
            .unwrap_err();
        assert!(matches!(err, MiniMeError::NonIncreasingCheckpoints { .. }));
    }

    #[test]
    fn rejects_target_block_not_before_next_checkpoint() {
        let active_key = map_slot(holder(), 1);
        let next_key = array_element(active_key, U256::one());
        let proof = MiniMeProof {
            active: StorageResult {
                key: active_key,
                value: checkpoint_word(100, 10),
                proof: vec![],
            },
            next: NextCheckpoint::Present(StorageResult {
                key: next_key,
                value: checkpoint_word(200, 20),
                proof: vec![],
            }),
        };
        // target_block == next.from_block, violating the strict `<` requirement.
        let err = verify_proof(holder(), H256::zero(), &proof, 1, U256::from(100), 20)
            .unwrap_err();
        assert!(matches!(err, MiniMeError::TargetNotBeforeNext { .. }));
    }

    #[test]
    fn rejects_checkpoint_offset_beyond_bound() {
        let active_key = map_slot(holder(), 1);
        let base = array_base(map_slot(holder(), 1));
        let far_key = array_element(base, MAX_CHECKPOINT_OFFSET + U256::one());
        let next_key = array_element(far_key, U256::one());
        let proof = MiniMeProof {
            active: StorageResult {
                key: far_key,
                value: checkpoint_word(100, 10),
                proof: vec![],
            },
            next: NextCheckpoint::Absent {
                key: next_key,
                proof: vec![],
            },
        };
        let _ = active_key;
        let err = verify_proof(holder(), H256::zero(), &proof, 1, U256::from(100), 20)
            .unwrap_err();
        assert!(matches!(err, MiniMeError::RangeViolation { .. }));
    }

    #[test]
    fn verifies_last_checkpoint_with_absent_next() {
        let mut scratch = Vec::new();
        let active_key = map_slot(holder(), 1);
        let (next_key, node) = empty_branch_proof(H256::zero(), &mut scratch);
        let root = ethers::utils::keccak256(&node);
        let proof = MiniMeProof {
            active: StorageResult {
                key: active_key,
                value: checkpoint_word(100, 10),
                proof: vec![],
            },
            next: NextCheckpoint::Absent {
                key: next_key,
                proof: vec![Bytes::from(node)],
            },
        };
        // The active leg's own proof is empty here (not under test); only
        // the ordering/offset checks and the absent leg's trie walk matter.
        let err = verify_proof(holder(), H256::from(root), &proof, 1, U256::from(100), 20);
        // The active proof is empty, so the active leg fails with
        // ProofTruncated once ordering checks have passed.
        assert!(matches!(
            err,
            Err(MiniMeError::Trie(tokenproof_trie::VerifyError::ProofTruncated))
        ));
    }
}
