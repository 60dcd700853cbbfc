//! # Protocol Configuration & Constants
//!
//! Every magic number in WillVault lives here. Lengths are fixed by the
//! primitives we picked; contexts are fixed forever once a vault exists,
//! because changing one silently changes every address and commitment
//! derived from it.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full version string of the vault protocol.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 for caller authentication.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Signing key length in bytes. Ed25519 secret keys are 32 bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Length of a data commitment. 256 bits, whichever hash produced it.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Length of an address in bytes. 20 bytes, rendered as `0x` + 40 hex digits.
pub const ADDRESS_LENGTH: usize = 20;

/// Prefix used when rendering addresses and accepted when parsing them.
pub const ADDRESS_PREFIX: &str = "0x";

// ---------------------------------------------------------------------------
// Domain Separation
// ---------------------------------------------------------------------------

/// BLAKE3 `derive_key` context for document commitments.
pub const COMMITMENT_CONTEXT: &str = "willvault 2026-01 document commitment v1";

/// BLAKE3 `derive_key` context for deriving an address from a public key.
pub const ADDRESS_CONTEXT: &str = "willvault 2026-01 address v1";

/// BLAKE3 `derive_key` context for the digest a caller signs.
pub const CALL_SIGNING_CONTEXT: &str = "willvault 2026-01 signed call v1";

// ---------------------------------------------------------------------------
// Node Parameters
// ---------------------------------------------------------------------------

/// Default HTTP API port.
pub const DEFAULT_RPC_PORT: u16 = 9841;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

/// Broadcast channel capacity for vault event subscribers. Three events is
/// the most a single vault ever emits per call, so 256 only fills up when a
/// subscriber stops reading.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_are_distinct() {
        assert_ne!(COMMITMENT_CONTEXT, ADDRESS_CONTEXT);
        assert_ne!(COMMITMENT_CONTEXT, CALL_SIGNING_CONTEXT);
        assert_ne!(ADDRESS_CONTEXT, CALL_SIGNING_CONTEXT);
    }

    #[test]
    fn test_ports_are_distinct() {
        assert_ne!(DEFAULT_RPC_PORT, DEFAULT_METRICS_PORT);
    }

    #[test]
    fn test_crypto_parameter_sizes() {
        assert_eq!(SIGNING_KEY_LENGTH, 32);
        assert_eq!(VERIFYING_KEY_LENGTH, 32);
        assert_eq!(SIGNATURE_LENGTH, 64);
        assert_eq!(HASH_OUTPUT_LENGTH, 32);
        // An address is a truncated hash, never longer than one.
        assert!(ADDRESS_LENGTH < HASH_OUTPUT_LENGTH);
    }
}
