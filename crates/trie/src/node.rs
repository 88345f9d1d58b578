//! Classifies and walks a single decoded Merkle Patricia Trie node.

use thiserror::Error;

use crate::path::{NibblePath, PathError, PathNature, PrefixEncoding};

#[derive(Debug, Error, Eq, PartialEq)]
pub enum NodeError {
    #[error("branch node (non-terminal) has a value in its 17th slot")]
    BranchNodeHasValue,
    #[error("branch node has fewer than 17 items")]
    BranchMissingValueSlot,
    #[error("branch child reference is longer than 32 bytes")]
    BranchChildTooLong,
    #[error("extension node has no child reference")]
    ExtensionMissingChild,
    #[error("extension child reference is longer than 32 bytes")]
    ExtensionChildTooLong,
    #[error("node has {0} items, expected 2 or 17")]
    InvalidNodeItemCount(usize),
    #[error("node has no items")]
    NodeEmpty,
    #[error("node's first item carries no HP encoding byte")]
    NoEncoding,
    #[error("leaf node has no value item")]
    LeafHasNoValue,
    #[error("leaf node has no path item")]
    LeafHasNoPath,
    #[error("a full 32-byte path traversal cannot end on an extension node")]
    TraversalEndsAtExtension,
    #[error(transparent)]
    PathError(#[from] PathError),
}

/// A reference to the next node to visit: either its 32-byte keccak256 hash,
/// or (per invariant 1) the RLP encoding of the node itself, inlined, when
/// that encoding is shorter than 32 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Hash([u8; 32]),
    Inline(Vec<u8>),
}

impl NodeRef {
    pub fn from_item(item: &[u8]) -> Result<Self, NodeError> {
        if item.len() == 32 {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(item);
            Ok(NodeRef::Hash(hash))
        } else if item.len() < 32 {
            Ok(NodeRef::Inline(item.to_vec()))
        } else {
            Err(NodeError::BranchChildTooLong)
        }
    }
}

/// Description of a decoded node's shape.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Branch,
    Extension,
    Leaf,
}

impl NodeKind {
    pub fn deduce(node: &[Vec<u8>]) -> Result<NodeKind, NodeError> {
        match node.len() {
            17 => Ok(NodeKind::Branch),
            2 => {
                let partial_path = node.first().ok_or(NodeError::NodeEmpty)?;
                let header = partial_path.first().ok_or(NodeError::NoEncoding)?;
                Ok(match PrefixEncoding::try_from(header)? {
                    PrefixEncoding::ExtensionEven | PrefixEncoding::ExtensionOdd(_) => {
                        NodeKind::Extension
                    }
                    PrefixEncoding::LeafEven | PrefixEncoding::LeafOdd(_) => NodeKind::Leaf,
                })
            }
            other => Err(NodeError::InvalidNodeItemCount(other)),
        }
    }

    /// Advances the walk through this node. Returns the outcome: either the
    /// walk should continue to a child ([`Outcome::Pending`]), or the proof
    /// has resolved to inclusion or exclusion of the target key.
    pub fn traverse(
        &self,
        node: Vec<Vec<u8>>,
        traversal: &mut NibblePath,
    ) -> Result<Outcome, NodeError> {
        match self {
            NodeKind::Branch => {
                let final_item = node.get(16).ok_or(NodeError::BranchMissingValueSlot)?;
                if traversal.visiting_index() == 64 {
                    return Ok(Outcome::Terminal(TerminalShape::BranchValueSlot(
                        final_item.clone(),
                    )));
                }
                if !final_item.is_empty() {
                    return Err(NodeError::BranchNodeHasValue);
                }
                let path_nibble = traversal.visit_path_nibble()?;
                let item = node
                    .get(path_nibble as usize)
                    .ok_or(NodeError::BranchMissingValueSlot)?;
                if item.is_empty() {
                    return Ok(Outcome::Terminal(TerminalShape::BranchEmptyChild));
                }
                let next_ref = NodeRef::from_item(item)?;
                Ok(Outcome::Pending(next_ref))
            }
            NodeKind::Extension => {
                let extension = node.first().ok_or(NodeError::ExtensionMissingChild)?;
                let next_node = node.get(1).ok_or(NodeError::ExtensionMissingChild)?;
                match traversal.match_or_mismatch(extension)? {
                    PathNature::SubPathMatches => {
                        if next_node.is_empty() {
                            return Err(NodeError::ExtensionMissingChild);
                        }
                        traversal.skip_extension_node_nibbles(extension)?;
                        let next_ref = NodeRef::from_item(next_node)
                            .map_err(|_| NodeError::ExtensionChildTooLong)?;
                        Ok(Outcome::Pending(next_ref))
                    }
                    PathNature::SubPathDiverges(_) | PathNature::FullPathDiverges(_) => {
                        Ok(Outcome::Terminal(TerminalShape::ExtensionDiverges))
                    }
                    PathNature::FullPathMatches => Err(NodeError::TraversalEndsAtExtension),
                }
            }
            NodeKind::Leaf => {
                let path = node.first().ok_or(NodeError::LeafHasNoPath)?;
                let value = node.get(1).ok_or(NodeError::LeafHasNoValue)?;
                match traversal.match_or_mismatch(path)? {
                    PathNature::FullPathMatches => {
                        Ok(Outcome::Terminal(TerminalShape::LeafMatches(value.clone())))
                    }
                    PathNature::FullPathDiverges(_) | PathNature::SubPathDiverges(_) => {
                        Ok(Outcome::Terminal(TerminalShape::LeafDiverges))
                    }
                    PathNature::SubPathMatches => Err(NodeError::LeafHasNoValue),
                }
            }
        }
    }
}

/// The result of walking through one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Continue the walk at the given child reference.
    Pending(NodeRef),
    /// The walk has resolved; a caller decides inclusion/exclusion from the shape.
    Terminal(TerminalShape),
}

/// The shape of the node where the walk resolved. Kept distinct from
/// `Verified` (trie-level inclusion/exclusion) because the caller must
/// additionally compare against the claimed value before deciding which.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalShape {
    LeafMatches(Vec<u8>),
    LeafDiverges,
    ExtensionDiverges,
    BranchEmptyChild,
    BranchValueSlot(Vec<u8>),
}
