//! Verifying an account proof against a block's `stateRoot`: a small
//! extension of the same walker used for storage proofs, since an account's
//! RLP-list encoding under its keccak-hashed address is witnessed by exactly
//! the same kind of inclusion proof as a storage slot.
//!
//! This does not validate block headers, consensus, or signatures, only that
//! the account fields given are the ones bound to `address` under
//! `state_root`.

use ethers::types::{H160, H256, U256, U64};

use crate::{verify, Verified, VerifyError};

/// RLP-encodes an account's state as `[nonce, balance, storageHash, codeHash]`,
/// the value an Ethereum state trie leaf carries for an externally-owned or
/// contract account.
pub fn encode_account(nonce: U64, balance: U256, storage_hash: H256, code_hash: H256) -> Vec<u8> {
    let mut nonce_be = [0u8; 8];
    nonce.to_big_endian(&mut nonce_be);
    let mut balance_be = [0u8; 32];
    balance.to_big_endian(&mut balance_be);

    tokenproof_rlp::RlpItem::List(vec![
        tokenproof_rlp::RlpItem::Bytes(tokenproof_rlp::to_minimal_be(&nonce_be)),
        tokenproof_rlp::RlpItem::Bytes(tokenproof_rlp::to_minimal_be(&balance_be)),
        tokenproof_rlp::RlpItem::Bytes(storage_hash.as_bytes().to_vec()),
        tokenproof_rlp::RlpItem::Bytes(code_hash.as_bytes().to_vec()),
    ])
    .encode()
}

/// Verifies that `account_proof` witnesses the given account fields bound to
/// `address` under `state_root`. The key fed to the walker's internal
/// `keccak256` is the raw 20-byte address, per invariant 2's "for storage
/// tries the key is the slot number" generalizing uniformly to "for the
/// state trie the key is the address".
pub fn verify_account_proof(
    state_root: H256,
    address: H160,
    nonce: U64,
    balance: U256,
    storage_hash: H256,
    code_hash: H256,
    account_proof: &[Vec<u8>],
) -> Result<Verified, VerifyError> {
    let value = encode_account(nonce, balance, storage_hash, code_hash);
    verify(
        *state_root.as_fixed_bytes(),
        address.as_bytes(),
        Some(&value),
        account_proof,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::keccak256;
    use std::str::FromStr;

    /// Single-leaf account proof: the trie is exactly one leaf node that is
    /// also its own root, so the leaf's RLP encoding both hashes to the root
    /// and carries the account's own fields.
    #[test]
    fn verifies_single_leaf_account_proof() {
        let address = H160::from_str("0x0b09dea16768f0799065c475be02919503cb2a3").unwrap();
        let nonce = U64::from(4u64);
        let balance = U256::from(1_000_000_000_000_000_000u64);
        let storage_hash =
            H256::from_str("0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b42")
                .unwrap();
        let code_hash = H256::zero();

        let value = encode_account(nonce, balance, storage_hash, code_hash);
        let path_nibbles_full = keccak256(address.as_bytes());
        let leaf_path = tokenproof_path_bytes(&path_nibbles_full);
        let leaf = tokenproof_rlp::RlpItem::List(vec![
            tokenproof_rlp::RlpItem::Bytes(leaf_path),
            tokenproof_rlp::RlpItem::Bytes(value),
        ])
        .encode();
        let root = H256::from(keccak256(&leaf));

        let result = verify_account_proof(
            root,
            address,
            nonce,
            balance,
            storage_hash,
            code_hash,
            &[leaf],
        )
        .unwrap();
        assert_eq!(result, Verified::Inclusion);
    }

    fn tokenproof_path_bytes(full_path_hash: &[u8; 32]) -> Vec<u8> {
        let nibbles: Vec<u8> = full_path_hash
            .iter()
            .flat_map(|b| [b >> 4, b & 0xf])
            .collect();
        crate::path::nibbles_to_prefixed_bytes(&nibbles, crate::path::TargetNodeEncoding::Leaf)
            .unwrap()
    }

    #[test]
    fn wrong_account_fields_are_rejected() {
        let address = H160::zero();
        let nonce = U64::from(1u64);
        let balance = U256::from(5u64);
        let storage_hash = H256::zero();
        let code_hash = H256::zero();
        let value = encode_account(nonce, balance, storage_hash, code_hash);
        let path_nibbles_full = keccak256(address.as_bytes());
        let leaf_path = tokenproof_path_bytes(&path_nibbles_full);
        let leaf = tokenproof_rlp::RlpItem::List(vec![
            tokenproof_rlp::RlpItem::Bytes(leaf_path),
            tokenproof_rlp::RlpItem::Bytes(value),
        ])
        .encode();
        let root = H256::from(keccak256(&leaf));

        let err = verify_account_proof(
            root,
            address,
            nonce,
            U256::from(6u64), // wrong balance
            storage_hash,
            code_hash,
            &[leaf],
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::ValueMismatch { .. }));
    }
}
