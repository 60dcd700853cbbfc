//! # WillVault Contracts
//!
//! The Vault Authority: an owner registers a fixed set of guardians and a
//! threshold, later locks in a commitment to encrypted material, and the
//! material becomes releasable once enough distinct guardians confirm.
//!
//! - **Will Vault**: the state machine itself ([`will_vault::WillVault`]).
//!   Pure, synchronous, no I/O.
//! - **Events**: the `Locked` / `Confirmed` / `Released` notifications each
//!   successful mutation emits.
//! - **Shared**: a cloneable handle that serializes every mutation behind a
//!   single write lock and fans committed events out to subscribers.
//!
//! ## Design Principles
//!
//! 1. Reject before mutate. Every guard runs before the first write, so a
//!    failed call leaves the vault byte-for-byte unchanged.
//! 2. State transitions are explicit: enum variants, not boolean flags. An
//!    unlocked vault has no hash to carry; a released one can never go back.
//! 3. Callers arrive pre-authenticated as an
//!    [`Address`](willvault_protocol::identity::Address). Signature checks
//!    live one layer up.
//! 4. Every public type is serializable (serde), and deserializing a vault
//!    re-checks every invariant.

pub mod events;
pub mod shared;
pub mod will_vault;

pub use events::{EventRecord, VaultEvent};
pub use shared::{Committed, SharedVault};
pub use will_vault::{ReleaseStatus, VaultError, VaultErrorKind, VaultPhase, VaultState, WillVault};
