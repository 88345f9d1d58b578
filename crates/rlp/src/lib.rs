//! Recursive Length Prefix encoding/decoding.
//!
//! This is hand-rolled rather than delegated to the `rlp` crate: the codec
//! itself, including the trie-node item-count rules, is core logic for the
//! proof verifier this workspace builds.

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RlpError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("length prefix has a leading zero byte")]
    LeadingZeroLength,
    #[error("encoded length exceeds usize range")]
    LengthOverflow,
    #[error("{0} trailing byte(s) after decoded item")]
    TrailingBytes(usize),
    #[error("expected a byte string, found a list")]
    ExpectedBytes,
    #[error("expected a list, found a byte string")]
    ExpectedList,
    #[error("list item is not a byte string")]
    NestedListNotAllowed,
}

/// A decoded RLP item: either a byte string or an ordered list of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            RlpItem::Bytes(bytes) => encode_bytes(bytes),
            RlpItem::List(items) => {
                let mut payload = Vec::new();
                for item in items {
                    payload.extend(item.encode());
                }
                let mut out = Vec::new();
                encode_length(0xc0, 0xf7, payload.len(), &mut out);
                out.extend(payload);
                out
            }
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], RlpError> {
        match self {
            RlpItem::Bytes(b) => Ok(b),
            RlpItem::List(_) => Err(RlpError::ExpectedBytes),
        }
    }

    pub fn as_list(&self) -> Result<&[RlpItem], RlpError> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::Bytes(_) => Err(RlpError::ExpectedList),
        }
    }
}

/// Encodes a single byte string per the rules in §4.1:
/// - a lone byte in 0x00..=0x7f encodes as itself
/// - length <= 55 -> 0x80+len, payload
/// - length > 55 -> 0xb7+len(be(len)), be(len), payload
fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() == 1 && bytes[0] <= 0x7f {
        return vec![bytes[0]];
    }
    let mut out = Vec::new();
    encode_length(0x80, 0xb7, bytes.len(), &mut out);
    out.extend_from_slice(bytes);
    out
}

fn encode_length(short_base: u8, long_base: u8, len: usize, out: &mut Vec<u8>) {
    if len <= 55 {
        out.push(short_base + len as u8);
    } else {
        let be = len.to_be_bytes();
        let first_nonzero = be.iter().position(|b| *b != 0).unwrap_or(be.len() - 1);
        let be_trimmed = &be[first_nonzero..];
        out.push(long_base + be_trimmed.len() as u8);
        out.extend_from_slice(be_trimmed);
    }
}

/// Decodes exactly one RLP item, rejecting any trailing bytes.
pub fn decode(input: &[u8]) -> Result<RlpItem, RlpError> {
    let (item, rest) = decode_item(input)?;
    if !rest.is_empty() {
        return Err(RlpError::TrailingBytes(rest.len()));
    }
    Ok(item)
}

/// Decodes the outer list of an RLP-encoded trie node into its raw byte-string
/// items, matching the `rlp::decode_list::<Vec<u8>>` convenience the `rlp`
/// crate provides. Nested lists inside a node item are rejected: every real
/// trie node item is either a path/value/terminal byte string or a 32-byte
/// hash, never a further list.
pub fn decode_list_of_byte_strings(input: &[u8]) -> Result<Vec<Vec<u8>>, RlpError> {
    let item = decode(input)?;
    let list = item.as_list()?;
    list.iter()
        .map(|entry| match entry {
            RlpItem::Bytes(b) => Ok(b.clone()),
            RlpItem::List(_) => Err(RlpError::NestedListNotAllowed),
        })
        .collect()
}

fn decode_item(input: &[u8]) -> Result<(RlpItem, &[u8]), RlpError> {
    let first = *input.first().ok_or(RlpError::UnexpectedEof)?;
    match first {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![first]), &input[1..])),
        0x80..=0xb7 => {
            let len = (first - 0x80) as usize;
            let (payload, rest) = split_checked(&input[1..], len)?;
            Ok((RlpItem::Bytes(payload.to_vec()), rest))
        }
        0xb8..=0xbf => {
            let len_of_len = (first - 0xb7) as usize;
            let len = decode_length(&input[1..], len_of_len)?;
            let (payload, rest) = split_checked(&input[1 + len_of_len..], len)?;
            Ok((RlpItem::Bytes(payload.to_vec()), rest))
        }
        0xc0..=0xf7 => {
            let len = (first - 0xc0) as usize;
            let (payload, rest) = split_checked(&input[1..], len)?;
            Ok((RlpItem::List(decode_all(payload)?), rest))
        }
        0xf8..=0xff => {
            let len_of_len = (first - 0xf7) as usize;
            let len = decode_length(&input[1..], len_of_len)?;
            let (payload, rest) = split_checked(&input[1 + len_of_len..], len)?;
            Ok((RlpItem::List(decode_all(payload)?), rest))
        }
    }
}

fn decode_all(mut input: &[u8]) -> Result<Vec<RlpItem>, RlpError> {
    let mut items = Vec::new();
    while !input.is_empty() {
        let (item, rest) = decode_item(input)?;
        items.push(item);
        input = rest;
    }
    Ok(items)
}

fn decode_length(input: &[u8], len_of_len: usize) -> Result<usize, RlpError> {
    let be = input.get(..len_of_len).ok_or(RlpError::UnexpectedEof)?;
    if be.first() == Some(&0) {
        return Err(RlpError::LeadingZeroLength);
    }
    if be.len() > std::mem::size_of::<usize>() {
        return Err(RlpError::LengthOverflow);
    }
    let mut buf = [0u8; std::mem::size_of::<usize>()];
    buf[std::mem::size_of::<usize>() - be.len()..].copy_from_slice(be);
    Ok(usize::from_be_bytes(buf))
}

fn split_checked(input: &[u8], len: usize) -> Result<(&[u8], &[u8]), RlpError> {
    if input.len() < len {
        return Err(RlpError::UnexpectedEof);
    }
    Ok(input.split_at(len))
}

/// Strips leading zero bytes from a big-endian integer encoding. Zero itself
/// becomes the empty byte sequence, per §4.1's asymmetry that matters for
/// non-existence proofs.
pub fn to_minimal_be(bytes: &[u8]) -> Vec<u8> {
    let first_nonzero = bytes.iter().position(|b| *b != 0);
    match first_nonzero {
        Some(index) => bytes[index..].to_vec(),
        None => Vec::new(),
    }
}

/// RLP-encodes an unsigned big integer given as big-endian bytes (may carry
/// leading zeros; they are stripped first).
pub fn encode_uint(be_bytes: &[u8]) -> Vec<u8> {
    encode_bytes(&to_minimal_be(be_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 17-item merkle patricia trie node.
    const BRANCH_NODE: &str = "f90151a0bf5e7a6355d2aae16870034397bcb78fb7f3677302857c4e3f0f11b2ad183ddaa0441a130e5b3344a0c6d4e01e69cdd8c3d54c9427c22df1c21e823bd5238bcedc80a0de4a8735f0afe745a73341f09b2641b136c4c6ceb33a4c04f868b8c0ae0c572da0616b1953ab56f21db0e3e0a8f04422bbdce75bd530e049560426deb7548c9324a0df7498a408a3cb6f416a60eb97bc61cdd31f9f9c1e3d9f2e131c476cca1a64aaa0b4b838d595815f1af27bc520f9054bbe7b8f1ae901d58ceba455a93a02b38fe3a088c2648a34b76ec09c67666bf1b2ff917c97a960dbebd2c8d56ec2b89c5f5d7ba080f002d80dc9f4e682660964f02c4f70fdfb5aeeee5f5651fca75c06f810c37980a0f6d68b8a203434af63aefd6acbce4e627b80e03c11d9c64334d48655f842ee24a02991191455c868799650d6cd4009a21443c9ac2aebedb76d55d9a01811d59a9c8080808080";

    #[test]
    fn short_string_round_trip() {
        let input = RlpItem::Bytes(b"dog".to_vec());
        let encoded = input.encode();
        assert_eq!(encoded, vec![0x83, b'd', b'o', b'g']);
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn single_byte_below_0x80_encodes_as_itself() {
        let input = RlpItem::Bytes(vec![0x00]);
        assert_eq!(input.encode(), vec![0x00]);
        let input = RlpItem::Bytes(vec![0x7f]);
        assert_eq!(input.encode(), vec![0x7f]);
    }

    #[test]
    fn single_byte_at_or_above_0x80_uses_length_prefix() {
        let input = RlpItem::Bytes(vec![0x80]);
        assert_eq!(input.encode(), vec![0x81, 0x80]);
    }

    #[test]
    fn empty_string_is_0x80() {
        let input = RlpItem::Bytes(vec![]);
        assert_eq!(input.encode(), vec![0x80]);
    }

    #[test]
    fn long_string_round_trip() {
        let payload = vec![b'a'; 60];
        let input = RlpItem::Bytes(payload.clone());
        let encoded = input.encode();
        assert_eq!(encoded[0], 0xb7 + 1);
        assert_eq!(encoded[1], 60);
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn list_round_trip() {
        let input = RlpItem::List(vec![
            RlpItem::Bytes(b"cat".to_vec()),
            RlpItem::Bytes(b"dog".to_vec()),
        ]);
        let encoded = input.encode();
        assert_eq!(encoded, vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']);
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn nested_list_round_trip() {
        let input = RlpItem::List(vec![
            RlpItem::List(vec![]),
            RlpItem::List(vec![RlpItem::Bytes(vec![])]),
            RlpItem::Bytes(vec![1, 2, 3]),
        ]);
        let encoded = input.encode();
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn decode_branch_node_has_17_items() {
        let data = hex::decode(BRANCH_NODE).unwrap();
        let items = decode_list_of_byte_strings(&data).unwrap();
        assert_eq!(items.len(), 17);
        assert_eq!(
            items[0],
            hex::decode("bf5e7a6355d2aae16870034397bcb78fb7f3677302857c4e3f0f11b2ad183dda")
                .unwrap()
        );
        assert!(items[16].is_empty());
    }

    #[test]
    fn truncated_input_is_rejected() {
        let data = vec![0x83, b'd', b'o']; // claims 3 bytes, only 2 present
        assert_eq!(decode(&data), Err(RlpError::UnexpectedEof));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let data = vec![0x83, b'd', b'o', b'g', 0xff];
        assert_eq!(decode(&data), Err(RlpError::TrailingBytes(1)));
    }

    #[test]
    fn leading_zero_in_long_length_is_rejected() {
        // length-of-length = 1, but the length byte itself is 0x00.
        let data = vec![0xb8, 0x00];
        assert_eq!(decode(&data), Err(RlpError::LeadingZeroLength));
    }

    #[test]
    fn zero_encodes_as_empty_string() {
        assert_eq!(to_minimal_be(&[0, 0, 0]), Vec::<u8>::new());
        assert_eq!(encode_uint(&[0, 0, 0]), vec![0x80]);
    }

    #[test]
    fn minimal_encoding_strips_leading_zeros() {
        assert_eq!(to_minimal_be(&[0x00, 0x01, 0x02]), vec![0x01, 0x02]);
    }

    #[test]
    fn encode_uint_small_value_is_single_byte() {
        assert_eq!(encode_uint(&[0x00, 0x05]), vec![0x05]);
    }
}
