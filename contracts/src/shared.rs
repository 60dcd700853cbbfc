//! # Shared Vault
//!
//! [`WillVault`] is a plain value; this module makes it a shared resource.
//! Every mutation takes one write lock for its whole run, so mutations form
//! a single total order and never observe each other half-done. Queries take
//! the read lock and may run in parallel, always seeing a committed state.
//!
//! Committed events are published on a `tokio::sync::broadcast` channel
//! while the write lock is still held, so subscribers receive them in log
//! order. Each mutator also returns the [`ReleaseStatus`] read under that
//! same guard, so a caller never sees a later call's effects attributed to
//! its own.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use willvault_protocol::crypto::DataHash;
use willvault_protocol::identity::Address;

use crate::events::EventRecord;
use crate::will_vault::{ReleaseStatus, VaultError, VaultPhase, WillVault};

/// What one successful mutation committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    /// Events appended by the call, in log order.
    pub records: Vec<EventRecord>,
    /// Release status immediately after the call.
    pub status: ReleaseStatus,
}

/// Cloneable, thread-safe handle to a single vault.
#[derive(Clone)]
pub struct SharedVault {
    vault: Arc<RwLock<WillVault>>,
    events: broadcast::Sender<EventRecord>,
}

impl SharedVault {
    /// Wrap `vault`, buffering up to `channel_capacity` events per subscriber.
    pub fn new(vault: WillVault, channel_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            vault: Arc::new(RwLock::new(vault)),
            events,
        }
    }

    /// Receive events committed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events.subscribe()
    }

    /// See [`WillVault::lock_vault`].
    ///
    /// # Errors
    ///
    /// Propagates the vault's rejection unchanged.
    pub fn lock_vault(
        &self,
        caller: &Address,
        data_hash: DataHash,
    ) -> Result<Committed, VaultError> {
        let mut vault = self.vault.write();
        match vault.lock_vault(caller, data_hash) {
            Ok(records) => {
                info!(%caller, %data_hash, "vault locked");
                self.publish(&records);
                Ok(Committed {
                    records,
                    status: vault.release_status(),
                })
            }
            Err(e) => {
                warn!(%caller, code = e.code(), "lock rejected: {}", e);
                Err(e)
            }
        }
    }

    /// See [`WillVault::confirm_release`].
    ///
    /// # Errors
    ///
    /// Propagates the vault's rejection unchanged.
    pub fn confirm_release(&self, caller: &Address) -> Result<Committed, VaultError> {
        let mut vault = self.vault.write();
        match vault.confirm_release(caller) {
            Ok(records) => {
                info!(
                    guardian = %caller,
                    confirmations = vault.current_confirmations(),
                    needed = vault.confirmations_needed(),
                    "release confirmed"
                );
                if vault.is_released() {
                    info!(data_hash = %vault.data_hash(), "vault released");
                }
                self.publish(&records);
                Ok(Committed {
                    records,
                    status: vault.release_status(),
                })
            }
            Err(e) => {
                warn!(%caller, code = e.code(), "confirmation rejected: {}", e);
                Err(e)
            }
        }
    }

    // -- queries ------------------------------------------------------------

    /// Run `f` against one consistent committed state.
    pub fn read<R>(&self, f: impl FnOnce(&WillVault) -> R) -> R {
        f(&self.vault.read())
    }

    pub fn is_guardian(&self, identity: &Address) -> bool {
        self.vault.read().is_guardian(identity)
    }

    pub fn is_confirmed(&self, identity: &Address) -> bool {
        self.vault.read().is_confirmed(identity)
    }

    pub fn guardians(&self) -> Vec<Address> {
        self.vault.read().guardians().to_vec()
    }

    pub fn release_status(&self) -> ReleaseStatus {
        self.vault.read().release_status()
    }

    pub fn owner(&self) -> Address {
        *self.vault.read().owner()
    }

    pub fn phase(&self) -> VaultPhase {
        self.vault.read().phase()
    }

    pub fn remaining_confirmations(&self) -> u32 {
        self.vault.read().remaining_confirmations()
    }

    /// Events with `sequence >= from`, oldest first.
    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        let vault = self.vault.read();
        let start = usize::try_from(from).unwrap_or(usize::MAX);
        vault.event_log().iter().skip(start).cloned().collect()
    }

    /// A full copy of the committed vault.
    pub fn snapshot(&self) -> WillVault {
        self.vault.read().clone()
    }

    fn publish(&self, records: &[EventRecord]) {
        for record in records {
            // Fails only when nobody is subscribed.
            if self.events.send(record.clone()).is_err() {
                debug!(
                    sequence = record.sequence,
                    event = record.event.name(),
                    "no event subscribers"
                );
            }
        }
    }
}

impl std::fmt::Debug for SharedVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedVault")
            .field("vault", &*self.vault.read())
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VaultEvent;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn shared() -> SharedVault {
        let vault = WillVault::new(vec![addr(1), addr(2), addr(3)], 2, addr(0xAA)).unwrap();
        SharedVault::new(vault, 16)
    }

    #[test]
    fn clones_share_state() {
        let a = shared();
        let b = a.clone();
        a.lock_vault(&addr(0xAA), DataHash::commit(b"doc")).unwrap();
        assert!(matches!(b.phase(), VaultPhase::Locked { .. }));
    }

    #[test]
    fn snapshot_is_detached() {
        let v = shared();
        let before = v.snapshot();
        v.lock_vault(&addr(0xAA), DataHash::commit(b"doc")).unwrap();
        assert_eq!(before.phase(), VaultPhase::Unlocked);
        assert_ne!(v.snapshot(), before);
    }

    #[test]
    fn events_since_filters_by_sequence() {
        let v = shared();
        v.lock_vault(&addr(0xAA), DataHash::commit(b"doc")).unwrap();
        v.confirm_release(&addr(1)).unwrap();
        v.confirm_release(&addr(2)).unwrap();

        assert_eq!(v.events_since(0).len(), 4);
        let tail = v.events_since(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].event, VaultEvent::Confirmed { guardian: addr(2) });
        assert_eq!(tail[1].event, VaultEvent::Released);
        assert!(v.events_since(99).is_empty());
    }

    #[test]
    fn committed_status_belongs_to_the_call() {
        let v = shared();
        let locked = v.lock_vault(&addr(0xAA), DataHash::commit(b"doc")).unwrap();
        assert_eq!(locked.status.current_confirmations, 0);
        assert!(!locked.status.released);

        let first = v.confirm_release(&addr(1)).unwrap();
        assert_eq!(first.records.len(), 1);
        assert_eq!(first.status.current_confirmations, 1);
        assert!(!first.status.released);

        let second = v.confirm_release(&addr(3)).unwrap();
        assert_eq!(second.records.len(), 2);
        assert_eq!(second.status.current_confirmations, 2);
        assert!(second.status.released);

        // The earlier outcome is a value, not a view.
        assert!(!first.status.released);
    }

    #[test]
    fn rejection_publishes_nothing() {
        let v = shared();
        let mut rx = v.subscribe();
        assert!(v.confirm_release(&addr(1)).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let v = shared();
        assert!(v.lock_vault(&addr(0xAA), DataHash::commit(b"doc")).is_ok());
    }
}
