//! Notifications emitted by successful vault mutations.
//!
//! Every committed event is appended to the vault's event log as an
//! [`EventRecord`] with a gap-free sequence number starting at zero, so an
//! observer that missed live delivery can replay from the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use willvault_protocol::crypto::DataHash;
use willvault_protocol::identity::Address;

/// A vault notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultEvent {
    /// The owner committed the data hash.
    Locked {
        /// The commitment now held by the vault.
        data_hash: DataHash,
    },
    /// A guardian confirmed release.
    Confirmed {
        /// The confirming guardian.
        guardian: Address,
    },
    /// The threshold was reached. Terminal.
    Released,
}

impl VaultEvent {
    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::Locked { .. } => "locked",
            VaultEvent::Confirmed { .. } => "confirmed",
            VaultEvent::Released => "released",
        }
    }
}

/// An event as recorded in the vault's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the event log, starting at 0.
    pub sequence: u64,
    /// What happened.
    pub event: VaultEvent,
    /// When the mutation that produced it committed.
    pub timestamp: DateTime<Utc>,
}
