//! Storage slot derivation for Solidity `mapping` and dynamic-array layouts.

use ethers::{
    types::{H160, H256, U256},
    utils::keccak256,
};

/// `mapping(address => V)` declared at index slot `index`: the value for
/// `holder` lives at `keccak256(pad32(holder) || pad32(index))`.
pub fn map_slot(holder: H160, index: u32) -> H256 {
    let mut preimage = [0u8; 64];
    preimage[12..32].copy_from_slice(holder.as_bytes());
    U256::from(index).to_big_endian(&mut preimage[32..64]);
    H256::from(keccak256(preimage))
}

/// A dynamic array declared at index slot `p` stores its elements starting
/// at `keccak256(pad32(p))`.
pub fn array_base(map_slot_result: H256) -> H256 {
    H256::from(keccak256(map_slot_result.as_bytes()))
}

/// Element `position` of an array whose elements start at `base`, with
/// 256-bit modular (wrapping) addition.
pub fn array_element(base: H256, position: U256) -> H256 {
    let base_int = U256::from_big_endian(base.as_bytes());
    let (sum, _) = base_int.overflowing_add(position);
    let mut out = [0u8; 32];
    sum.to_big_endian(&mut out);
    H256::from(out)
}
