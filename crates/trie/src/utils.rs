//! Small hex helpers shared by this crate's error messages and tests.

/// Converts bytes to a `0x`-prefixed hex string.
pub fn hex_encode<T: AsRef<[u8]>>(bytes: T) -> String {
    format!("0x{}", hex::encode(bytes))
}
