//! # Data Commitments
//!
//! A [`DataHash`] is the only trace of the protected documents that ever
//! reaches the vault. The encrypted payload lives in an off-chain store; the
//! hash held by the vault is a tamper-proof anchor pointing at it.
//!
//! The all-zero value is reserved: a vault holding [`DataHash::ZERO`] has not
//! been locked yet, so no commitment function here can legitimately be asked
//! to produce it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::{domain_separated_hash, sha256_array};
use crate::config::{COMMITMENT_CONTEXT, HASH_OUTPUT_LENGTH};

/// Errors parsing a commitment from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitmentError {
    #[error("data hash is not valid hex: {0}")]
    InvalidHex(String),

    #[error("data hash must be {expected} bytes, got {got}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Length of the decoded input.
        got: usize,
    },
}

/// A 256-bit commitment to encrypted material held elsewhere.
///
/// Rendered as 64 lowercase hex characters with a `0x` prefix. Parsing
/// accepts the prefix optionally.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DataHash([u8; HASH_OUTPUT_LENGTH]);

impl DataHash {
    /// The "not yet locked" sentinel.
    pub const ZERO: DataHash = DataHash([0u8; HASH_OUTPUT_LENGTH]);

    /// Wrap raw bytes.
    pub const fn from_bytes(bytes: [u8; HASH_OUTPUT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Commit to a document with domain-separated BLAKE3.
    ///
    /// # Example
    ///
    /// ```
    /// use willvault_protocol::crypto::DataHash;
    ///
    /// let h = DataHash::commit(b"ciphertext of the will");
    /// assert!(!h.is_zero());
    /// assert_eq!(h, DataHash::commit(b"ciphertext of the will"));
    /// ```
    pub fn commit(document: &[u8]) -> Self {
        Self(domain_separated_hash(COMMITMENT_CONTEXT, document))
    }

    /// Commit with plain SHA-256, for stores that address content that way.
    pub fn commit_sha256(document: &[u8]) -> Self {
        Self(sha256_array(document))
    }

    /// Whether this is the reserved all-zero value.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_OUTPUT_LENGTH]
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_OUTPUT_LENGTH] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for DataHash {
    type Err = CommitmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| CommitmentError::InvalidHex(e.to_string()))?;
        let arr: [u8; HASH_OUTPUT_LENGTH] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CommitmentError::InvalidLength {
                    expected: HASH_OUTPUT_LENGTH,
                    got: bytes.len(),
                })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for DataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for DataHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataHash({})", self.to_hex())
    }
}

impl Serialize for DataHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DataHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
