//! # Signed Calls
//!
//! The authentication layer in front of a vault. A participant signs a
//! [`VaultCall`] together with the id of the vault it targets; the host
//! checks the signature and derives the caller's [`Address`] from the
//! embedded public key.
//!
//! ## Signed digest
//!
//! ```text
//! BLAKE3-derive-key(CALL_SIGNING_CONTEXT,
//!     vault_id || 0x00 || 0x01 || data_hash   // Lock
//!     vault_id || 0x00 || 0x02                // Confirm
//! )
//! ```
//!
//! Binding the vault id stops a signature for one vault from being replayed
//! against another. Replaying against the same vault gains nothing: both
//! mutations are one-shot and the replay is rejected by the vault itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::address::Address;
use crate::config::CALL_SIGNING_CONTEXT;
use crate::crypto::commitment::DataHash;
use crate::crypto::hash::domain_separated_hash_multi;
use crate::crypto::keys::{PublicKey, Signature, VaultKeypair};

const TAG_LOCK: u8 = 0x01;
const TAG_CONFIRM: u8 = 0x02;

/// Authentication failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The call was signed for a different vault.
    #[error("call targets vault {got}, expected {expected}")]
    WrongVault {
        /// The vault this host serves.
        expected: String,
        /// The vault named in the call.
        got: String,
    },

    /// The signature does not verify under the embedded public key.
    #[error("signature verification failed")]
    InvalidSignature,
}

/// A vault operation, before authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum VaultCall {
    /// Commit the data hash. Owner only.
    Lock {
        /// The commitment to lock in.
        data_hash: DataHash,
    },
    /// Confirm release. Guardians only.
    Confirm,
}

impl VaultCall {
    /// Canonical byte encoding fed into the signed digest.
    fn encode(&self) -> Vec<u8> {
        match self {
            VaultCall::Lock { data_hash } => {
                let mut out = Vec::with_capacity(1 + data_hash.as_bytes().len());
                out.push(TAG_LOCK);
                out.extend_from_slice(data_hash.as_bytes());
                out
            }
            VaultCall::Confirm => vec![TAG_CONFIRM],
        }
    }

    /// Short operation name for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            VaultCall::Lock { .. } => "lock",
            VaultCall::Confirm => "confirm",
        }
    }
}

/// A [`VaultCall`] signed by its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall {
    /// Id of the vault this call is meant for.
    pub vault_id: String,
    /// The requested operation.
    pub call: VaultCall,
    /// The caller's public key. The caller's address is derived from it.
    pub public_key: PublicKey,
    /// Signature over [`SignedCall::signing_digest`].
    pub signature: Signature,
}

impl SignedCall {
    /// Sign `call` for `vault_id` with `keypair`.
    ///
    /// ```
    /// use willvault_protocol::crypto::VaultKeypair;
    /// use willvault_protocol::identity::{SignedCall, VaultCall};
    ///
    /// let guardian = VaultKeypair::generate();
    /// let signed = SignedCall::sign(&guardian, "vault-1", VaultCall::Confirm);
    /// assert_eq!(signed.authenticate("vault-1").unwrap(), guardian.address());
    /// ```
    pub fn sign(keypair: &VaultKeypair, vault_id: &str, call: VaultCall) -> Self {
        let digest = Self::signing_digest(vault_id, &call);
        Self {
            vault_id: vault_id.to_string(),
            call,
            public_key: keypair.public_key(),
            signature: keypair.sign(&digest),
        }
    }

    /// The 32-byte digest a caller signs.
    pub fn signing_digest(vault_id: &str, call: &VaultCall) -> [u8; 32] {
        let encoded = call.encode();
        let parts: [&[u8]; 3] = [vault_id.as_bytes(), &[0x00], &encoded];
        domain_separated_hash_multi(CALL_SIGNING_CONTEXT, &parts)
    }

    /// Check the vault id and signature, returning the verified caller.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WrongVault`] if the call names another vault.
    /// Returns [`AuthError::InvalidSignature`] if the signature does not verify.
    pub fn authenticate(&self, expected_vault_id: &str) -> Result<Address, AuthError> {
        if self.vault_id != expected_vault_id {
            return Err(AuthError::WrongVault {
                expected: expected_vault_id.to_string(),
                got: self.vault_id.clone(),
            });
        }

        let digest = Self::signing_digest(&self.vault_id, &self.call);
        if !self.public_key.verify(&digest, &self.signature) {
            return Err(AuthError::InvalidSignature);
        }

        Ok(self.public_key.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_call() -> VaultCall {
        VaultCall::Lock {
            data_hash: DataHash::commit(b"will.pdf.enc"),
        }
    }

    #[test]
    fn authenticate_returns_signer_address() {
        let owner = VaultKeypair::generate();
        let signed = SignedCall::sign(&owner, "vault-a", lock_call());
        assert_eq!(signed.authenticate("vault-a").unwrap(), owner.address());
    }

    #[test]
    fn wrong_vault_rejected() {
        let owner = VaultKeypair::generate();
        let signed = SignedCall::sign(&owner, "vault-a", lock_call());
        assert!(matches!(
            signed.authenticate("vault-b"),
            Err(AuthError::WrongVault { .. })
        ));
    }

    #[test]
    fn retargeted_vault_id_breaks_signature() {
        let owner = VaultKeypair::generate();
        let mut signed = SignedCall::sign(&owner, "vault-a", lock_call());
        signed.vault_id = "vault-b".into();
        assert_eq!(
            signed.authenticate("vault-b"),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn swapped_call_breaks_signature() {
        let guardian = VaultKeypair::generate();
        let mut signed = SignedCall::sign(&guardian, "vault-a", VaultCall::Confirm);
        signed.call = lock_call();
        assert_eq!(
            signed.authenticate("vault-a"),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn substituted_public_key_breaks_signature() {
        let guardian = VaultKeypair::generate();
        let impostor = VaultKeypair::generate();
        let mut signed = SignedCall::sign(&guardian, "vault-a", VaultCall::Confirm);
        signed.public_key = impostor.public_key();
        assert_eq!(
            signed.authenticate("vault-a"),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn lock_digests_depend_on_hash() {
        let a = SignedCall::signing_digest(
            "v",
            &VaultCall::Lock {
                data_hash: DataHash::commit(b"a"),
            },
        );
        let b = SignedCall::signing_digest(
            "v",
            &VaultCall::Lock {
                data_hash: DataHash::commit(b"b"),
            },
        );
        assert_ne!(a, b);
    }

    #[test]
    fn json_shape() {
        let guardian = VaultKeypair::from_seed(&[3u8; 32]);
        let signed = SignedCall::sign(&guardian, "vault-a", VaultCall::Confirm);
        let value = serde_json::to_value(&signed).unwrap();
        assert_eq!(value["vault_id"], "vault-a");
        assert_eq!(value["call"]["op"], "confirm");
        let back: SignedCall = serde_json::from_value(value).unwrap();
        assert_eq!(back, signed);
    }
}
