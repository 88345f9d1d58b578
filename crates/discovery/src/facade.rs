//! The token façade: one small surface combining slot discovery, proof
//! fetching, and the pure per-layout verifiers in `tokenproof_token`, so a
//! caller holding nothing but a contract address, a holder address and a
//! layout kind can go from "nothing known" to "verified balance".
//!
//! Placed here rather than in `tokenproof_token` itself: discovery and
//! fetching are inherently I/O, and the verifying core must stay free of
//! transport concerns so it is trivially testable offline.

use ethers::types::{H160, U256};
use tokenproof_trie::Verified;
use tokenproof_types::{BlockTag, EthRpcClient, Layout, StorageProof, StorageResult};

use crate::discover::{discover_mapbased_slot, discover_minime_slot, DEFAULT_SLOT_BOUND};
use crate::error::{DiscoveryError, FacadeError};
use crate::proof::{fetch_mapbased_proof, fetch_minime_proof};

/// Either shape of fetched-but-not-yet-verified proof material, tagged by
/// the layout it was fetched for.
#[derive(Debug, Clone)]
pub enum ProofBundle {
    MapBased(StorageResult),
    MiniMe(tokenproof_token::MiniMeProof),
}

/// The verification outcome, shaped like `ProofBundle`: a map-based proof
/// yields one verdict, a MiniMe pair yields one per leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifiedBundle {
    MapBased(Verified),
    MiniMe(Verified, Verified),
}

/// A resolved index slot for one `(contract, layout)` pair, ready to fetch
/// and verify proofs for any holder without re-discovering the slot.
pub struct TokenHandle {
    pub contract: H160,
    pub layout: Layout,
    pub index_slot: u32,
}

impl TokenHandle {
    pub fn new(contract: H160, layout: Layout, index_slot: u32) -> Self {
        TokenHandle {
            contract,
            layout,
            index_slot,
        }
    }

    /// Runs C8 for `holder` against `known_balance`, then wraps the result
    /// in a handle that can fetch and verify proofs for that holder (and,
    /// since a token declares one slot for all holders, for any other).
    pub async fn discover(
        client: &dyn EthRpcClient,
        contract: H160,
        layout: Layout,
        holder: H160,
        known_balance: U256,
        tag: BlockTag,
    ) -> Result<Self, DiscoveryError> {
        Self::discover_with_bound(client, contract, layout, holder, known_balance, tag, DEFAULT_SLOT_BOUND).await
    }

    pub async fn discover_with_bound(
        client: &dyn EthRpcClient,
        contract: H160,
        layout: Layout,
        holder: H160,
        known_balance: U256,
        tag: BlockTag,
        bound: u32,
    ) -> Result<Self, DiscoveryError> {
        let index_slot = match layout {
            Layout::MapBased => {
                discover_mapbased_slot(client, contract, holder, known_balance, tag, bound).await?
            }
            Layout::MiniMe => {
                discover_minime_slot(client, contract, holder, known_balance, tag, bound).await?
            }
        };
        Ok(Self::new(contract, layout, index_slot))
    }

    /// Fetches raw proof material for `holder`: `target_block` is only
    /// consulted for a MiniMe handle, since a map-based balance has no
    /// history to range over.
    pub async fn get_proof(
        &self,
        client: &dyn EthRpcClient,
        holder: H160,
        target_block: u64,
        tag: BlockTag,
    ) -> Result<(StorageProof, ProofBundle), DiscoveryError> {
        match self.layout {
            Layout::MapBased => {
                let (full, result) =
                    fetch_mapbased_proof(client, self.contract, holder, self.index_slot, tag).await?;
                Ok((full, ProofBundle::MapBased(result)))
            }
            Layout::MiniMe => {
                let (full, proof) = fetch_minime_proof(
                    client,
                    self.contract,
                    holder,
                    self.index_slot,
                    target_block,
                    tag,
                )
                .await?;
                Ok((full, ProofBundle::MiniMe(proof)))
            }
        }
    }

    /// Verifies a previously-fetched bundle against `storage_root`, per
    /// §4.6 (map-based) or §4.7 (MiniMe). Rejects a bundle fetched for the
    /// other layout rather than silently reinterpreting its bytes.
    pub fn verify(
        &self,
        holder: H160,
        storage_root: ethers::types::H256,
        bundle: &ProofBundle,
        target_balance: U256,
        target_block: u64,
    ) -> Result<VerifiedBundle, FacadeError> {
        match (self.layout, bundle) {
            (Layout::MapBased, ProofBundle::MapBased(result)) => {
                let verified = tokenproof_token::mapbased::verify_proof(
                    holder,
                    storage_root,
                    result,
                    self.index_slot,
                    target_balance,
                    Some(target_block),
                )?;
                Ok(VerifiedBundle::MapBased(verified))
            }
            (Layout::MiniMe, ProofBundle::MiniMe(proof)) => {
                let (active, next) = tokenproof_token::minime::verify_proof(
                    holder,
                    storage_root,
                    proof,
                    self.index_slot,
                    target_balance,
                    target_block,
                )?;
                Ok(VerifiedBundle::MiniMe(active, next))
            }
            _ => Err(FacadeError::WrongBundleShape),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ethers::types::{Bytes, H256};
    use std::collections::HashMap;
    use std::str::FromStr;
    use tokenproof_types::{BlockHeader, RpcError};

    /// An in-memory `EthRpcClient` double over a single leaf-node trie: the
    /// leaf is its own root, so one fabricated node exercises discovery,
    /// fetching and verification without a network.
    struct FixtureClient {
        storage: HashMap<(H160, H256), H256>,
        account_proof: Vec<Bytes>,
        storage_root: H256,
        state_root: H256,
        height: u64,
        balance: U256,
        nonce: ethers::types::U64,
        code_hash: H256,
    }

    #[async_trait]
    impl EthRpcClient for FixtureClient {
        async fn chain_id(&self) -> Result<u64, RpcError> {
            Ok(1)
        }

        async fn block_number(&self) -> Result<u64, RpcError> {
            Ok(self.height)
        }

        async fn block_by_number(&self, _tag: BlockTag) -> Result<BlockHeader, RpcError> {
            Ok(BlockHeader {
                number: self.height,
                state_root: self.state_root,
            })
        }

        async fn storage_at(&self, address: H160, slot: H256, _tag: BlockTag) -> Result<H256, RpcError> {
            Ok(self
                .storage
                .get(&(address, slot))
                .copied()
                .unwrap_or_default())
        }

        async fn get_proof(
            &self,
            address: H160,
            slots: &[H256],
            _tag: BlockTag,
        ) -> Result<StorageProof, RpcError> {
            let storage = slots
                .iter()
                .map(|&key| StorageResult {
                    key,
                    value: self
                        .storage
                        .get(&(address, key))
                        .map(|word| U256::from_big_endian(word.as_bytes()))
                        .unwrap_or_default(),
                    proof: vec![Bytes::from(single_leaf_proof_node(self, address, key))],
                })
                .collect();
            Ok(StorageProof {
                state_root: self.state_root,
                height: self.height,
                address,
                account_proof: self.account_proof.clone(),
                balance: self.balance,
                nonce: self.nonce,
                code_hash: self.code_hash,
                storage_hash: self.storage_root,
                storage,
            })
        }

        async fn call(&self, _to: H160, _data: Bytes, _tag: BlockTag) -> Result<Bytes, RpcError> {
            unimplemented!("not exercised by the facade")
        }
    }

    /// The fixture always stores exactly one slot, so its storage trie is a
    /// single leaf that is also the root; the proof for any key is just that
    /// leaf re-encoded, regardless of which key was asked for (the verifier
    /// rejects key mismatches on its own if the fixture is ever misused).
    fn single_leaf_proof_node(client: &FixtureClient, address: H160, key: H256) -> Vec<u8> {
        let value = client
            .storage
            .get(&(address, key))
            .map(|word| U256::from_big_endian(word.as_bytes()))
            .unwrap_or_default();
        let mut value_be = [0u8; 32];
        value.to_big_endian(&mut value_be);
        let rlp_value = tokenproof_rlp::encode_uint(&value_be);

        let full_path = ethers::utils::keccak256(key.as_bytes());
        let nibbles: Vec<u8> = full_path.iter().flat_map(|b| [b >> 4, b & 0xf]).collect();
        let leaf_path = tokenproof_trie::path::nibbles_to_prefixed_bytes(
            &nibbles,
            tokenproof_trie::path::TargetNodeEncoding::Leaf,
        )
        .unwrap();
        tokenproof_rlp::RlpItem::List(vec![
            tokenproof_rlp::RlpItem::Bytes(leaf_path),
            tokenproof_rlp::RlpItem::Bytes(rlp_value),
        ])
        .encode()
    }

    fn build_fixture(holder: H160, index_slot: u32, balance: U256) -> FixtureClient {
        let contract = H160::from_str("0x1111111111111111111111111111111111111111").unwrap();
        let key = tokenproof_token::map_slot(holder, index_slot);
        let mut word = [0u8; 32];
        balance.to_big_endian(&mut word);

        let mut storage = HashMap::new();
        storage.insert((contract, key), H256::from(word));

        // Compute the root over a throwaway client first, then thread it
        // through: the leaf node only depends on `key`/`value`, not on the
        // root, so this two-step build is just bookkeeping.
        let scratch = FixtureClient {
            storage: storage.clone(),
            account_proof: vec![],
            storage_root: H256::zero(),
            state_root: H256::zero(),
            height: 18_000_000,
            balance: U256::zero(),
            nonce: ethers::types::U64::zero(),
            code_hash: H256::zero(),
        };
        let node = single_leaf_proof_node(&scratch, contract, key);
        let root = H256::from(ethers::utils::keccak256(&node));

        FixtureClient {
            storage,
            account_proof: vec![],
            storage_root: root,
            state_root: root,
            height: 18_000_000,
            balance: U256::zero(),
            nonce: ethers::types::U64::zero(),
            code_hash: H256::zero(),
        }
    }

    #[tokio::test]
    async fn discovers_fetches_and_verifies_a_mapbased_balance_end_to_end() {
        let holder = H160::from_str("0xbd9c69654b8f3e5978dfd138b00cb0be29f28ccf").unwrap();
        let balance = U256::from(1_000_000u64);
        let client = build_fixture(holder, 3, balance);

        let handle = TokenHandle::discover(
            &client,
            H160::from_str("0x1111111111111111111111111111111111111111").unwrap(),
            Layout::MapBased,
            holder,
            balance,
            BlockTag::Number(18_000_000),
        )
        .await
        .unwrap();
        assert_eq!(handle.index_slot, 3);

        let (full, bundle) = handle
            .get_proof(&client, holder, 18_000_000, BlockTag::Number(18_000_000))
            .await
            .unwrap();

        let verified = handle
            .verify(holder, full.storage_hash, &bundle, balance, 18_000_000)
            .unwrap();
        assert_eq!(verified, VerifiedBundle::MapBased(Verified::Inclusion));
    }
}
