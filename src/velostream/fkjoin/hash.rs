//! Content hash of the primary-side value
//!
//! The hash travels with a subscription and comes back in the response, letting the
//! primary side drop responses computed against a value that has since changed.

use std::fmt;
use xxhash_rust::xxh3::xxh3_128;

pub const VALUE_HASH_LEN: usize = 16;

/// 128-bit hash of a serialized value
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueHash([u8; VALUE_HASH_LEN]);

impl ValueHash {
    /// Hash the serialized form of a value
    pub fn of(serialized_value: &[u8]) -> Self {
        Self(xxh3_128(serialized_value).to_be_bytes())
    }

    pub fn from_bytes(bytes: [u8; VALUE_HASH_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; VALUE_HASH_LEN] {
        &self.0
    }
}

impl fmt::Display for ValueHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ValueHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueHash({})", self)
    }
}
