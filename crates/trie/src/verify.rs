//! The pure Merkle Patricia Trie proof verifier.
//!
//! `verify` is total: every malformed or mismatching input produces an
//! `Err`, none of its failure modes panic.

use ethers::utils::keccak256;
use thiserror::Error;

use crate::{
    node::{NodeError, NodeKind, NodeRef, Outcome, TerminalShape},
    utils::hex_encode,
};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed RLP input: {0}")]
    MalformedRlp(#[from] tokenproof_rlp::RlpError),
    #[error("node {index} is not a valid trie node: {source}")]
    MalformedNode { index: usize, source: NodeError },
    #[error("node {index} hash does not match the reference in its parent (computed {computed}, expected {expected})")]
    HashMismatch {
        index: usize,
        computed: String,
        expected: String,
    },
    #[error("node {index}: proved value ({found}) does not match the claimed value ({claimed})")]
    ValueMismatch {
        index: usize,
        claimed: String,
        found: String,
    },
    #[error("proof exhausted before the walk terminated")]
    ProofTruncated,
}

/// The result of a verified walk: the key is bound to the claimed value
/// (`Inclusion`), or the walk proved that no value is bound to it (`Exclusion`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verified {
    Inclusion,
    Exclusion,
}

/// Verifies that `proof` witnesses `key -> expected_value` (or the key's
/// absence, when `expected_value` is `None`) under `root`.
///
/// `key` is the raw pre-image; this function computes `keccak256(key)` and
/// walks it as a nibble sequence. `expected_value`, when present, must
/// already be RLP-encoded (e.g. the minimal big-endian encoding of a balance).
pub fn verify(
    root: [u8; 32],
    key: &[u8],
    expected_value: Option<&[u8]>,
    proof: &[Vec<u8>],
) -> Result<Verified, VerifyError> {
    if proof.is_empty() {
        return Err(VerifyError::ProofTruncated);
    }

    let mut traversal = crate::path::NibblePath::init(&keccak256(key));
    let mut expected_ref = NodeRef::Hash(root);

    for (index, node_bytes) in proof.iter().enumerate() {
        check_ref(node_bytes, &expected_ref, index)?;

        let items = tokenproof_rlp::decode_list_of_byte_strings(node_bytes)?;
        let kind = NodeKind::deduce(&items).map_err(|source| VerifyError::MalformedNode { index, source })?;
        let outcome = kind
            .traverse(items, &mut traversal)
            .map_err(|source| VerifyError::MalformedNode { index, source })?;

        match outcome {
            Outcome::Pending(next_ref) => expected_ref = next_ref,
            Outcome::Terminal(shape) => return resolve(shape, expected_value, index),
        }
    }
    Err(VerifyError::ProofTruncated)
}

/// Checks that a node's reference from its parent is honored: a 32-byte hash
/// reference requires `keccak256(node) == reference`; an inlined (<32 byte)
/// reference requires the node's own bytes equal the reference exactly. The
/// root is always compared by hash (the first node's `expected_ref` is always
/// `NodeRef::Hash`), matching the tie-break in §4.3.
fn check_ref(node_bytes: &[u8], expected_ref: &NodeRef, index: usize) -> Result<(), VerifyError> {
    match expected_ref {
        NodeRef::Hash(expected) => {
            let computed = keccak256(node_bytes);
            if &computed != expected {
                return Err(VerifyError::HashMismatch {
                    index,
                    computed: hex_encode(computed),
                    expected: hex_encode(expected),
                });
            }
        }
        NodeRef::Inline(expected) => {
            if node_bytes != expected.as_slice() {
                return Err(VerifyError::HashMismatch {
                    index,
                    computed: hex_encode(node_bytes),
                    expected: hex_encode(expected),
                });
            }
        }
    }
    Ok(())
}

/// Compares the terminal node's shape against the claimed value. Per §4.3,
/// "no value" (absence asserted by the caller) is distinct from a value that
/// happens to RLP-encode to the empty byte sequence (zero); this never
/// collapses the two.
fn resolve(
    shape: TerminalShape,
    expected_value: Option<&[u8]>,
    index: usize,
) -> Result<Verified, VerifyError> {
    match shape {
        TerminalShape::LeafMatches(value) | TerminalShape::BranchValueSlot(value) => {
            match expected_value {
                Some(expected) if expected == value.as_slice() => Ok(Verified::Inclusion),
                Some(expected) => Err(VerifyError::ValueMismatch {
                    index,
                    claimed: hex_encode(expected),
                    found: hex_encode(&value),
                }),
                None => Err(VerifyError::ValueMismatch {
                    index,
                    claimed: "<absence expected>".to_string(),
                    found: hex_encode(&value),
                }),
            }
        }
        TerminalShape::LeafDiverges | TerminalShape::ExtensionDiverges | TerminalShape::BranchEmptyChild => {
            match expected_value {
                None => Ok(Verified::Exclusion),
                Some(expected) => Err(VerifyError::ValueMismatch {
                    index,
                    claimed: hex_encode(expected),
                    found: "<absent>".to_string(),
                }),
            }
        }
    }
}
