//! # Will Vault
//!
//! A single owner registers an ordered, duplicate-free set of guardians and a
//! threshold when the vault is created. Later the owner locks in a
//! [`DataHash`] committing to encrypted material held off-site. Once
//! `confirmations_needed` distinct guardians have confirmed, the vault is
//! released and the material may be handed out.
//!
//! ## Lifecycle
//!
//! ```text
//!  Unlocked ──lock_vault──▶ Locked ──confirm_release (count < threshold)──▶ Locked
//!                              │
//!                              └──confirm_release (count == threshold)──▶ Released
//! ```
//!
//! `Released` is terminal. `lock_vault` succeeds at most once in a vault's
//! life, and the committed hash never changes afterwards.
//!
//! ## Atomicity
//!
//! Every mutating method runs all of its guards before the first write. A
//! rejected call returns an error and leaves the vault untouched. The
//! confirmation that reaches the threshold flips the phase to `Released`
//! within the same `&mut self` borrow, so no caller can observe a met
//! threshold on a vault that is still `Locked`.
//!
//! Serializing concurrent callers is the host's job; see
//! [`SharedVault`](crate::shared::SharedVault).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use willvault_protocol::crypto::DataHash;
use willvault_protocol::identity::Address;

use crate::events::{EventRecord, VaultEvent};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by vault operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VaultError {
    /// Construction arguments, a lock hash, or a restored snapshot failed
    /// validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The caller is not the owner.
    #[error("unauthorized: {caller} is not the vault owner")]
    Unauthorized {
        /// The address that attempted the operation.
        caller: Address,
    },

    /// The vault has already been locked.
    #[error("vault is already locked")]
    AlreadyLocked,

    /// The vault has not been locked yet.
    #[error("vault is not locked")]
    NotLocked,

    /// The caller is not one of the registered guardians.
    #[error("{caller} is not a guardian of this vault")]
    NotGuardian {
        /// The address that attempted the operation.
        caller: Address,
    },

    /// The threshold has already been reached.
    #[error("vault has already been released")]
    AlreadyReleased,

    /// The guardian has already confirmed release.
    #[error("guardian {guardian} has already confirmed")]
    AlreadyConfirmed {
        /// The repeat caller.
        guardian: Address,
    },
}

/// Coarse error category, one per distinct user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultErrorKind {
    /// Bad arguments.
    InvalidInput,
    /// Caller lacks the role for the mutation.
    Unauthorized,
    /// Operation not valid in the current lifecycle phase.
    InvalidState,
    /// Caller is outside the guardian set.
    NotGuardian,
    /// Guardian already contributed.
    AlreadyConfirmed,
}

impl VaultError {
    /// The category this error falls under.
    pub fn kind(&self) -> VaultErrorKind {
        match self {
            VaultError::InvalidInput(_) => VaultErrorKind::InvalidInput,
            VaultError::Unauthorized { .. } => VaultErrorKind::Unauthorized,
            VaultError::AlreadyLocked | VaultError::NotLocked | VaultError::AlreadyReleased => {
                VaultErrorKind::InvalidState
            }
            VaultError::NotGuardian { .. } => VaultErrorKind::NotGuardian,
            VaultError::AlreadyConfirmed { .. } => VaultErrorKind::AlreadyConfirmed,
        }
    }

    /// Stable machine-readable code, used in API bodies and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::InvalidInput(_) => "INVALID_INPUT",
            VaultError::Unauthorized { .. } => "UNAUTHORIZED",
            VaultError::AlreadyLocked => "ALREADY_LOCKED",
            VaultError::NotLocked => "NOT_LOCKED",
            VaultError::NotGuardian { .. } => "NOT_GUARDIAN",
            VaultError::AlreadyReleased => "ALREADY_RELEASED",
            VaultError::AlreadyConfirmed { .. } => "ALREADY_CONFIRMED",
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle phase. Only locked and released vaults carry a commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VaultPhase {
    /// Created, no commitment yet.
    Unlocked,
    /// Commitment locked, collecting confirmations.
    Locked {
        /// The locked commitment.
        data_hash: DataHash,
    },
    /// Threshold reached. Terminal.
    Released {
        /// The locked commitment.
        data_hash: DataHash,
    },
}

impl VaultPhase {
    /// The committed hash, or [`DataHash::ZERO`] while unlocked.
    pub fn data_hash(&self) -> DataHash {
        match self {
            VaultPhase::Unlocked => DataHash::ZERO,
            VaultPhase::Locked { data_hash } | VaultPhase::Released { data_hash } => *data_hash,
        }
    }

    /// The phase without its payload.
    pub fn state(&self) -> VaultState {
        match self {
            VaultPhase::Unlocked => VaultState::Unlocked,
            VaultPhase::Locked { .. } => VaultState::Locked,
            VaultPhase::Released { .. } => VaultState::Released,
        }
    }
}

impl std::fmt::Display for VaultPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.state().fmt(f)
    }
}

/// Payload-free phase label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultState {
    /// No commitment yet.
    Unlocked,
    /// Collecting confirmations.
    Locked,
    /// Threshold reached.
    Released,
}

impl std::fmt::Display for VaultState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultState::Unlocked => write!(f, "Unlocked"),
            VaultState::Locked => write!(f, "Locked"),
            VaultState::Released => write!(f, "Released"),
        }
    }
}

/// Snapshot returned by [`WillVault::release_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStatus {
    /// The committed hash, zero while unlocked.
    pub data_hash: DataHash,
    /// The threshold.
    pub confirmations_needed: u32,
    /// Distinct guardians that have confirmed so far.
    pub current_confirmations: u32,
    /// Whether the threshold has been reached.
    pub released: bool,
}

/// The Vault Authority.
///
/// Registry fields (`owner`, `guardians`, `confirmations_needed`) are fixed
/// at construction. Release state (`phase`, `confirmed`,
/// `current_confirmations`) only moves forward. `confirmed[i]` belongs to
/// `guardians[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VaultRecord")]
pub struct WillVault {
    owner: Address,
    guardians: Vec<Address>,
    confirmations_needed: u32,
    phase: VaultPhase,
    confirmed: Vec<bool>,
    current_confirmations: u32,
    event_log: Vec<EventRecord>,
}

/// Unvalidated wire form of a [`WillVault`].
#[derive(Deserialize)]
struct VaultRecord {
    owner: Address,
    guardians: Vec<Address>,
    confirmations_needed: u32,
    phase: VaultPhase,
    confirmed: Vec<bool>,
    current_confirmations: u32,
    event_log: Vec<EventRecord>,
}

impl TryFrom<VaultRecord> for WillVault {
    type Error = VaultError;

    fn try_from(record: VaultRecord) -> Result<Self, Self::Error> {
        let vault = WillVault {
            owner: record.owner,
            guardians: record.guardians,
            confirmations_needed: record.confirmations_needed,
            phase: record.phase,
            confirmed: record.confirmed,
            current_confirmations: record.current_confirmations,
            event_log: record.event_log,
        };
        vault.check_invariants()?;
        Ok(vault)
    }
}

// ---------------------------------------------------------------------------
// Implementation
// ---------------------------------------------------------------------------

impl WillVault {
    /// Create a vault owned by `owner`.
    ///
    /// Guardian order is preserved. The owner may also appear as a guardian.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidInput`] if `guardians` is empty or has
    /// duplicates, or if `confirmations_needed` is outside
    /// `1..=guardians.len()`.
    pub fn new(
        guardians: Vec<Address>,
        confirmations_needed: u32,
        owner: Address,
    ) -> Result<Self, VaultError> {
        validate_registry(&guardians, confirmations_needed)?;

        let confirmed = vec![false; guardians.len()];
        Ok(Self {
            owner,
            guardians,
            confirmations_needed,
            phase: VaultPhase::Unlocked,
            confirmed,
            current_confirmations: 0,
            event_log: Vec::new(),
        })
    }

    /// Commit `data_hash`. Owner only, once.
    ///
    /// Returns the event records appended by this call.
    ///
    /// # Errors
    ///
    /// Checked in order:
    /// - [`VaultError::Unauthorized`] if `caller` is not the owner.
    /// - [`VaultError::AlreadyLocked`] if the vault is locked or released,
    ///   whether or not `data_hash` matches the stored one.
    /// - [`VaultError::InvalidInput`] if `data_hash` is the zero value.
    pub fn lock_vault(
        &mut self,
        caller: &Address,
        data_hash: DataHash,
    ) -> Result<Vec<EventRecord>, VaultError> {
        if *caller != self.owner {
            return Err(VaultError::Unauthorized { caller: *caller });
        }
        if self.phase != VaultPhase::Unlocked {
            return Err(VaultError::AlreadyLocked);
        }
        // Zero means "unlocked"; accepting it would leave the vault locked
        // with no visible commitment.
        if data_hash.is_zero() {
            return Err(VaultError::InvalidInput(
                "data hash must not be the zero value".into(),
            ));
        }

        self.phase = VaultPhase::Locked { data_hash };
        let records = vec![self.append_event(VaultEvent::Locked { data_hash })];

        debug_assert!(self.check_invariants().is_ok());
        Ok(records)
    }

    /// Record `caller`'s confirmation, releasing the vault if this one
    /// reaches the threshold.
    ///
    /// Returns the appended records: `Confirmed`, followed by `Released`
    /// when the threshold is met.
    ///
    /// # Errors
    ///
    /// Checked in order, first failure wins:
    /// 1. [`VaultError::NotLocked`] before any successful lock.
    /// 2. [`VaultError::NotGuardian`] if `caller` is not a guardian.
    /// 3. [`VaultError::AlreadyReleased`] once the threshold has been met.
    /// 4. [`VaultError::AlreadyConfirmed`] on a guardian's second call.
    pub fn confirm_release(&mut self, caller: &Address) -> Result<Vec<EventRecord>, VaultError> {
        let data_hash = match self.phase {
            VaultPhase::Unlocked => return Err(VaultError::NotLocked),
            VaultPhase::Locked { data_hash } | VaultPhase::Released { data_hash } => data_hash,
        };
        let index = self
            .guardian_index(caller)
            .ok_or(VaultError::NotGuardian { caller: *caller })?;
        if matches!(self.phase, VaultPhase::Released { .. }) {
            return Err(VaultError::AlreadyReleased);
        }
        if self.confirmed[index] {
            return Err(VaultError::AlreadyConfirmed { guardian: *caller });
        }

        // Bounded by guardians.len(), which validate_registry keeps within u32.
        let confirmations = self.current_confirmations + 1;
        self.confirmed[index] = true;
        self.current_confirmations = confirmations;

        let mut records = Vec::with_capacity(2);
        records.push(self.append_event(VaultEvent::Confirmed { guardian: *caller }));
        if confirmations >= self.confirmations_needed {
            self.phase = VaultPhase::Released { data_hash };
            records.push(self.append_event(VaultEvent::Released));
        }

        debug_assert!(self.check_invariants().is_ok());
        Ok(records)
    }

    // -- queries ------------------------------------------------------------

    /// Whether `identity` is a registered guardian.
    pub fn is_guardian(&self, identity: &Address) -> bool {
        self.guardian_index(identity).is_some()
    }

    /// Whether `identity` has confirmed. False for non-guardians and for
    /// every identity while the vault is unlocked.
    pub fn is_confirmed(&self, identity: &Address) -> bool {
        if self.phase == VaultPhase::Unlocked {
            return false;
        }
        self.guardian_index(identity)
            .map(|i| self.confirmed[i])
            .unwrap_or(false)
    }

    /// Guardians in registration order.
    pub fn guardians(&self) -> &[Address] {
        &self.guardians
    }

    /// `(data_hash, confirmations_needed, current_confirmations, released)`.
    pub fn release_status(&self) -> ReleaseStatus {
        ReleaseStatus {
            data_hash: self.phase.data_hash(),
            confirmations_needed: self.confirmations_needed,
            current_confirmations: self.current_confirmations,
            released: self.is_released(),
        }
    }

    /// The owner fixed at construction.
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn phase(&self) -> VaultPhase {
        self.phase
    }

    pub fn vault_state(&self) -> VaultState {
        self.phase.state()
    }

    pub fn data_hash(&self) -> DataHash {
        self.phase.data_hash()
    }

    pub fn confirmations_needed(&self) -> u32 {
        self.confirmations_needed
    }

    pub fn current_confirmations(&self) -> u32 {
        self.current_confirmations
    }

    pub fn is_released(&self) -> bool {
        matches!(self.phase, VaultPhase::Released { .. })
    }

    /// Confirmations still missing before release. Zero once released.
    pub fn remaining_confirmations(&self) -> u32 {
        self.confirmations_needed
            .saturating_sub(self.current_confirmations)
    }

    /// Every event this vault has emitted, oldest first.
    pub fn event_log(&self) -> &[EventRecord] {
        &self.event_log
    }

    /// Verify every structural invariant.
    ///
    /// Always holds for a vault built through [`WillVault::new`]; used to
    /// vet vaults restored from serialized form.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidInput`] naming the first violated rule.
    pub fn check_invariants(&self) -> Result<(), VaultError> {
        validate_registry(&self.guardians, self.confirmations_needed)?;

        if self.confirmed.len() != self.guardians.len() {
            return Err(invalid(format!(
                "{} confirmation flags for {} guardians",
                self.confirmed.len(),
                self.guardians.len()
            )));
        }

        let flagged = self.confirmed.iter().filter(|c| **c).count();
        if flagged != self.current_confirmations as usize {
            return Err(invalid(format!(
                "confirmation count {} does not match {} confirmed guardians",
                self.current_confirmations, flagged
            )));
        }

        match self.phase {
            VaultPhase::Unlocked => {
                if self.current_confirmations != 0 {
                    return Err(invalid("unlocked vault has confirmations".into()));
                }
            }
            VaultPhase::Locked { data_hash } => {
                if data_hash.is_zero() {
                    return Err(invalid("locked vault has a zero data hash".into()));
                }
                if self.current_confirmations >= self.confirmations_needed {
                    return Err(invalid("threshold met but vault not released".into()));
                }
            }
            VaultPhase::Released { data_hash } => {
                if data_hash.is_zero() {
                    return Err(invalid("released vault has a zero data hash".into()));
                }
                if self.current_confirmations < self.confirmations_needed {
                    return Err(invalid("vault released below threshold".into()));
                }
            }
        }

        self.check_event_log()
    }

    // -- internals ----------------------------------------------------------

    fn guardian_index(&self, identity: &Address) -> Option<usize> {
        self.guardians.iter().position(|g| g == identity)
    }

    fn append_event(&mut self, event: VaultEvent) -> EventRecord {
        let record = EventRecord {
            sequence: self.event_log.len() as u64,
            event,
            timestamp: Utc::now(),
        };
        self.event_log.push(record.clone());
        record
    }

    /// The log must number events from zero and agree with the release state.
    fn check_event_log(&self) -> Result<(), VaultError> {
        let mut locks = 0usize;
        let mut releases = 0usize;
        let mut confirmed = HashSet::new();

        for (i, record) in self.event_log.iter().enumerate() {
            if record.sequence != i as u64 {
                return Err(invalid(format!(
                    "event {} has sequence {}",
                    i, record.sequence
                )));
            }
            match record.event {
                VaultEvent::Locked { data_hash } => {
                    if i != 0 || data_hash != self.phase.data_hash() {
                        return Err(invalid("lock event does not match vault".into()));
                    }
                    locks += 1;
                }
                VaultEvent::Confirmed { guardian } => {
                    if !self.is_confirmed(&guardian) || !confirmed.insert(guardian) {
                        return Err(invalid(format!(
                            "confirmation event for {guardian} does not match vault"
                        )));
                    }
                }
                VaultEvent::Released => {
                    if i + 1 != self.event_log.len() {
                        return Err(invalid("events recorded after release".into()));
                    }
                    releases += 1;
                }
            }
        }

        let expected_locks = usize::from(self.phase != VaultPhase::Unlocked);
        let expected_releases = usize::from(self.is_released());
        if locks != expected_locks
            || releases != expected_releases
            || confirmed.len() != self.current_confirmations as usize
        {
            return Err(invalid("event log does not match vault state".into()));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> VaultError {
    VaultError::InvalidInput(reason)
}

fn validate_registry(guardians: &[Address], confirmations_needed: u32) -> Result<(), VaultError> {
    if guardians.is_empty() {
        return Err(invalid("guardian list must not be empty".into()));
    }

    let mut seen = HashSet::with_capacity(guardians.len());
    for guardian in guardians {
        if !seen.insert(guardian) {
            return Err(invalid(format!("duplicate guardian {guardian}")));
        }
    }

    let count = u32::try_from(guardians.len())
        .map_err(|_| invalid(format!("too many guardians: {}", guardians.len())))?;
    if confirmations_needed == 0 || confirmations_needed > count {
        return Err(invalid(format!(
            "threshold must be between 1 and {count}, got {confirmations_needed}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn owner() -> Address {
        addr(0xAA)
    }

    fn hash() -> DataHash {
        DataHash::commit(b"encrypted will")
    }

    fn vault(guardians: u8, threshold: u32) -> WillVault {
        let list = (1..=guardians).map(addr).collect();
        WillVault::new(list, threshold, owner()).unwrap()
    }

    fn locked(guardians: u8, threshold: u32) -> WillVault {
        let mut v = vault(guardians, threshold);
        v.lock_vault(&owner(), hash()).unwrap();
        v
    }

    // -- construction -------------------------------------------------------

    #[test]
    fn new_vault_starts_unlocked() {
        let v = vault(3, 2);
        assert_eq!(v.owner(), &owner());
        assert_eq!(v.guardians(), &[addr(1), addr(2), addr(3)]);
        assert_eq!(v.phase(), VaultPhase::Unlocked);
        assert_eq!(
            v.release_status(),
            ReleaseStatus {
                data_hash: DataHash::ZERO,
                confirmations_needed: 2,
                current_confirmations: 0,
                released: false,
            }
        );
        assert!(v.event_log().is_empty());
    }

    #[test]
    fn new_rejects_bad_registry() {
        let empty = WillVault::new(vec![], 1, owner());
        assert!(matches!(empty, Err(VaultError::InvalidInput(_))));

        let dup = WillVault::new(vec![addr(1), addr(2), addr(1)], 1, owner());
        assert!(matches!(dup, Err(VaultError::InvalidInput(_))));

        let zero = WillVault::new(vec![addr(1)], 0, owner());
        assert!(matches!(zero, Err(VaultError::InvalidInput(_))));

        let high = WillVault::new(vec![addr(1), addr(2)], 3, owner());
        assert!(matches!(high, Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn threshold_bounds_are_inclusive() {
        assert!(WillVault::new(vec![addr(1), addr(2)], 1, owner()).is_ok());
        assert!(WillVault::new(vec![addr(1), addr(2)], 2, owner()).is_ok());
    }

    #[test]
    fn owner_may_be_guardian() {
        let v = WillVault::new(vec![owner(), addr(1)], 1, owner()).unwrap();
        assert!(v.is_guardian(&owner()));
    }

    // -- lock ---------------------------------------------------------------

    #[test]
    fn lock_by_owner() {
        let mut v = vault(3, 2);
        let records = v.lock_vault(&owner(), hash()).unwrap();

        assert_eq!(v.phase(), VaultPhase::Locked { data_hash: hash() });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, 0);
        assert_eq!(records[0].event, VaultEvent::Locked { data_hash: hash() });
    }

    #[test]
    fn lock_by_stranger_is_unauthorized() {
        let mut v = vault(3, 2);
        let before = v.clone();
        let err = v.lock_vault(&addr(1), hash()).unwrap_err();
        assert_eq!(err, VaultError::Unauthorized { caller: addr(1) });
        assert_eq!(v, before);
    }

    #[test]
    fn second_lock_fails_same_or_different_hash() {
        let mut v = locked(3, 2);
        let before = v.clone();

        assert_eq!(v.lock_vault(&owner(), hash()), Err(VaultError::AlreadyLocked));
        assert_eq!(
            v.lock_vault(&owner(), DataHash::commit(b"other")),
            Err(VaultError::AlreadyLocked)
        );
        assert_eq!(v, before);
    }

    #[test]
    fn owner_check_precedes_phase_check() {
        let mut v = locked(3, 2);
        assert!(matches!(
            v.lock_vault(&addr(9), hash()),
            Err(VaultError::Unauthorized { .. })
        ));
    }

    #[test]
    fn zero_hash_rejected() {
        let mut v = vault(3, 2);
        assert!(matches!(
            v.lock_vault(&owner(), DataHash::ZERO),
            Err(VaultError::InvalidInput(_))
        ));
        assert_eq!(v.phase(), VaultPhase::Unlocked);
    }

    #[test]
    fn lock_after_release_fails() {
        let mut v = locked(1, 1);
        v.confirm_release(&addr(1)).unwrap();
        assert_eq!(v.lock_vault(&owner(), hash()), Err(VaultError::AlreadyLocked));
    }

    // -- confirm ------------------------------------------------------------

    #[test]
    fn confirm_before_lock_fails() {
        let mut v = vault(3, 2);
        assert_eq!(v.confirm_release(&addr(1)), Err(VaultError::NotLocked));
    }

    #[test]
    fn not_locked_wins_over_not_guardian() {
        let mut v = vault(3, 2);
        assert_eq!(v.confirm_release(&addr(9)), Err(VaultError::NotLocked));
    }

    #[test]
    fn not_guardian_wins_over_already_released() {
        let mut v = locked(1, 1);
        v.confirm_release(&addr(1)).unwrap();
        assert_eq!(
            v.confirm_release(&addr(9)),
            Err(VaultError::NotGuardian { caller: addr(9) })
        );
    }

    #[test]
    fn already_released_wins_over_already_confirmed() {
        let mut v = locked(2, 1);
        v.confirm_release(&addr(1)).unwrap();
        assert_eq!(v.confirm_release(&addr(1)), Err(VaultError::AlreadyReleased));
    }

    #[test]
    fn double_confirm_rejected() {
        let mut v = locked(3, 2);
        v.confirm_release(&addr(1)).unwrap();
        let before = v.clone();

        assert_eq!(
            v.confirm_release(&addr(1)),
            Err(VaultError::AlreadyConfirmed { guardian: addr(1) })
        );
        assert_eq!(v, before);
    }

    #[test]
    fn threshold_releases_atomically() {
        let mut v = locked(3, 2);

        let first = v.confirm_release(&addr(1)).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(v.vault_state(), VaultState::Locked);
        assert_eq!(v.remaining_confirmations(), 1);

        let second = v.confirm_release(&addr(2)).unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].event, VaultEvent::Confirmed { guardian: addr(2) });
        assert_eq!(second[1].event, VaultEvent::Released);
        assert_eq!(v.phase(), VaultPhase::Released { data_hash: hash() });
        assert_eq!(v.remaining_confirmations(), 0);
    }

    #[test]
    fn is_confirmed_tracks_flags() {
        let mut v = locked(3, 3);
        assert!(!v.is_confirmed(&addr(1)));
        v.confirm_release(&addr(1)).unwrap();
        assert!(v.is_confirmed(&addr(1)));
        assert!(!v.is_confirmed(&addr(2)));
        assert!(!v.is_confirmed(&addr(9)));
    }

    // -- errors -------------------------------------------------------------

    #[test]
    fn error_kinds_and_codes() {
        assert_eq!(VaultError::AlreadyLocked.kind(), VaultErrorKind::InvalidState);
        assert_eq!(VaultError::NotLocked.kind(), VaultErrorKind::InvalidState);
        assert_eq!(VaultError::AlreadyReleased.kind(), VaultErrorKind::InvalidState);
        assert_eq!(
            VaultError::NotGuardian { caller: addr(1) }.kind(),
            VaultErrorKind::NotGuardian
        );
        assert_eq!(VaultError::NotLocked.code(), "NOT_LOCKED");
        assert_eq!(
            VaultError::AlreadyConfirmed { guardian: addr(1) }.code(),
            "ALREADY_CONFIRMED"
        );
    }

    #[test]
    fn phase_display() {
        assert_eq!(VaultPhase::Unlocked.to_string(), "Unlocked");
        assert_eq!(
            VaultPhase::Released { data_hash: hash() }.to_string(),
            "Released"
        );
    }

    // -- invariants ---------------------------------------------------------

    #[test]
    fn invariants_hold_through_lifecycle() {
        let mut v = vault(4, 3);
        assert!(v.check_invariants().is_ok());
        v.lock_vault(&owner(), hash()).unwrap();
        assert!(v.check_invariants().is_ok());
        for g in 1..=3 {
            v.confirm_release(&addr(g)).unwrap();
            assert!(v.check_invariants().is_ok());
        }
        assert!(v.is_released());
    }

    #[test]
    fn invariants_catch_tampering() {
        let mut v = locked(3, 2);
        v.confirm_release(&addr(1)).unwrap();

        let mut bad_count = v.clone();
        bad_count.current_confirmations = 2;
        assert!(bad_count.check_invariants().is_err());

        let mut bad_flags = v.clone();
        bad_flags.confirmed.pop();
        assert!(bad_flags.check_invariants().is_err());

        let mut bad_log = v.clone();
        bad_log.event_log[1].sequence = 7;
        assert!(bad_log.check_invariants().is_err());
    }
}
