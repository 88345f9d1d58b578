//! The pure proof-verification core for both ERC20 storage layouts:
//! slot derivation, storage-word decoding, the map-based engine and the
//! MiniMe engine. No module here touches a network or a clock; every
//! function takes the bytes it needs and returns a verdict.

pub mod mapbased;
pub mod minime;
pub mod slot;
pub mod value;

pub use mapbased::MapBasedError;
pub use minime::{MiniMeError, MiniMeProof, NextCheckpoint, MAX_CHECKPOINT_OFFSET};
pub use slot::{array_base, array_element, map_slot};
pub use value::{decode_minime, decode_uint256, to_decimal_string, Checkpoint, ValueError};
