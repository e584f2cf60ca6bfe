//! Content hashing for frame bytes using SHA-512
//!
//! The digest is truncated to its first 256 bits. SHA-512 runs faster than SHA-256
//! on 64-bit hardware, and 256 bits are plenty for content identity.

use crate::types::Hash;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512};
use std::fmt;
use std::str::FromStr;

const PREFIX: &str = "SHA-512/256:";

/// Truncated SHA-512 content hash, displayed as `SHA-512/256:<hex>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(Hash);

impl ContentHash {
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// Lowercase hex of the digest, without the algorithm prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Hash raw bytes.
pub fn content_hash(data: &[u8]) -> ContentHash {
    let digest = Sha512::digest(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest[..32]);
    ContentHash(hash)
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex_part = s.strip_prefix(PREFIX).unwrap_or(s);
        let bytes = hex::decode(hex_part).map_err(|e| format!("invalid hash hex: {}", e))?;
        let hash: Hash = bytes
            .try_into()
            .map_err(|v: Vec<u8>| format!("expected 32 hash bytes, got {}", v.len()))?;
        Ok(ContentHash(hash))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
