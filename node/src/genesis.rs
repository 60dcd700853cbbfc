//! # Genesis File
//!
//! The JSON document a node boots its vault from:
//!
//! ```json
//! {
//!   "vault_id": "6f1c...",
//!   "owner": "0x...",
//!   "guardians": ["0x...", "0x...", "0x..."],
//!   "threshold": 2
//! }
//! ```
//!
//! `vault_id` is also what every [`SignedCall`] must name, so a signature
//! for one vault cannot be replayed against another.
//!
//! [`SignedCall`]: willvault_protocol::identity::SignedCall

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use willvault_contracts::will_vault::{VaultError, WillVault};
use willvault_protocol::identity::Address;

/// Vault construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    /// Identifier signed calls must carry.
    pub vault_id: String,
    /// The only address allowed to lock.
    pub owner: Address,
    /// Guardians, in order.
    pub guardians: Vec<Address>,
    /// Confirmations required for release.
    pub threshold: u32,
}

impl Genesis {
    /// Read and validate a genesis file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read genesis file {}", path.display()))?;
        let genesis: Genesis = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse genesis file {}", path.display()))?;
        genesis
            .validate()
            .with_context(|| format!("invalid genesis file {}", path.display()))?;
        Ok(genesis)
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to encode genesis")?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write genesis file {}", path.display()))
    }

    /// Check that the parameters would produce a vault.
    pub fn validate(&self) -> Result<()> {
        if self.vault_id.trim().is_empty() {
            bail!("vault_id must not be empty");
        }
        self.build_vault()?;
        Ok(())
    }

    /// Construct the vault described by this file.
    pub fn build_vault(&self) -> Result<WillVault, VaultError> {
        WillVault::new(self.guardians.clone(), self.threshold, self.owner)
    }
}
