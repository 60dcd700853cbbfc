//! # Cryptographic Primitives for WillVault
//!
//! Thin, type-safe wrappers around audited implementations:
//!
//! - **Ed25519** for caller signatures.
//! - **BLAKE3** for commitments and address derivation, always in
//!   `derive_key` mode with a context from [`crate::config`].
//! - **SHA-256** for commitments that must match an external content store.
//!
//! Nothing here encrypts. Encryption of the protected documents happens
//! before they ever reach us, and only the commitment comes back.

pub mod commitment;
pub mod hash;
pub mod keys;

pub use commitment::{CommitmentError, DataHash};
pub use hash::{domain_separated_hash, domain_separated_hash_multi, sha256_array};
pub use keys::{KeyError, PublicKey, Signature, VaultKeypair};
