//! # Hashing Utilities
//!
//! Two hash functions, no more:
//!
//! - **BLAKE3**: the default. Used in `derive_key` mode so that a commitment,
//!   an address, and a signed-call digest can never collide with each other
//!   even over identical input bytes.
//!
//! - **SHA-256**: for interoperability with external content stores that
//!   already address documents by their SHA-256 digest.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash and return a fixed-size array.
///
/// # Example
///
/// ```
/// use willvault_protocol::crypto::sha256_array;
///
/// let hash = sha256_array(b"encrypted will v3");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute a domain-separated hash using BLAKE3 with a context string.
///
/// `domain_separated_hash("a", data)` and `domain_separated_hash("b", data)`
/// never collide. BLAKE3's `derive_key` mode mixes the context into the IV,
/// so there is no tag to prepend by hand.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Domain-separated BLAKE3 over several slices, fed sequentially.
///
/// Equivalent to [`domain_separated_hash`] over the concatenation, without
/// allocating the concatenation.
pub fn domain_separated_hash_multi(context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}
