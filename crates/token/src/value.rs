//! Decoding 32-byte storage words into balances and MiniMe checkpoints.

use ethers::types::U256;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ValueError {
    #[error("storage word is {0} bytes, expected at most 32")]
    WordTooLong(usize),
}

/// Left-pads a possibly left-zero-stripped storage word out to 32 bytes.
fn pad32(word: &[u8]) -> Result<[u8; 32], ValueError> {
    if word.len() > 32 {
        return Err(ValueError::WordTooLong(word.len()));
    }
    let mut padded = [0u8; 32];
    padded[32 - word.len()..].copy_from_slice(word);
    Ok(padded)
}

/// Big-endian unsigned interpretation of a storage word.
pub fn decode_uint256(word: &[u8]) -> Result<U256, ValueError> {
    let padded = pad32(word)?;
    Ok(U256::from_big_endian(&padded))
}

/// A MiniMe checkpoint: high 128 bits of the word are the balance, low 128
/// bits are the block number it became effective at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub from_block: u128,
    pub balance: u128,
}

/// Splits a packed checkpoint word: bytes `[0..16)` are the balance, bytes
/// `[16..32)` are the block number.
pub fn decode_minime(word: &[u8]) -> Result<Checkpoint, ValueError> {
    let padded = pad32(word)?;
    let mut balance_bytes = [0u8; 16];
    balance_bytes.copy_from_slice(&padded[0..16]);
    let mut block_bytes = [0u8; 16];
    block_bytes.copy_from_slice(&padded[16..32]);
    Ok(Checkpoint {
        from_block: u128::from_be_bytes(block_bytes),
        balance: u128::from_be_bytes(balance_bytes),
    })
}

/// Renders an exact-integer balance at `decimals` precision as a decimal
/// string, via exact integer division/remainder rather than floating point.
pub fn to_decimal_string(balance: U256, decimals: u8) -> String {
    let divisor = U256::from(10).pow(U256::from(decimals));
    let whole = balance / divisor;
    let frac = balance % divisor;
    if decimals == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:0>width$}", frac, width = decimals as usize);
    format!("{whole}.{frac_str}")
}
