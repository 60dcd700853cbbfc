//! Integration tests for the shared vault handle.
//!
//! Exercises serialization of concurrent mutations across threads and the
//! ordering of events delivered to subscribers.

use std::sync::{Arc, Barrier};
use std::thread;

use willvault_contracts::events::VaultEvent;
use willvault_contracts::shared::SharedVault;
use willvault_contracts::will_vault::{VaultError, WillVault};
use willvault_protocol::crypto::{DataHash, VaultKeypair};
use willvault_protocol::identity::Address;

fn identities(n: u8) -> Vec<Address> {
    (0..n)
        .map(|i| VaultKeypair::from_seed(&[i.wrapping_add(10); 32]).address())
        .collect()
}

fn owner() -> Address {
    VaultKeypair::from_seed(&[1u8; 32]).address()
}

// ---------------------------------------------------------------------------
// Concurrency Tests
// ---------------------------------------------------------------------------

#[test]
fn concurrent_confirmations_release_exactly_once() {
    let guardians = identities(8);
    let vault = WillVault::new(guardians.clone(), 5, owner()).unwrap();
    let shared = SharedVault::new(vault, 64);
    shared
        .lock_vault(&owner(), DataHash::commit(b"doc"))
        .unwrap();

    let barrier = Arc::new(Barrier::new(guardians.len()));
    let handles: Vec<_> = guardians
        .iter()
        .copied()
        .map(|g| {
            let shared = shared.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                shared.confirm_release(&g)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let late = results
        .iter()
        .filter(|r| matches!(r, Err(VaultError::AlreadyReleased)))
        .count();

    assert_eq!(accepted, 5);
    assert_eq!(late, 3);

    let status = shared.release_status();
    assert!(status.released);
    assert_eq!(status.current_confirmations, 5);

    let log = shared.events_since(0);
    let releases = log
        .iter()
        .filter(|r| r.event == VaultEvent::Released)
        .count();
    assert_eq!(releases, 1);
    assert_eq!(log.last().map(|r| r.event), Some(VaultEvent::Released));
}

#[test]
fn concurrent_outcomes_report_their_own_status() {
    let guardians = identities(8);
    let vault = WillVault::new(guardians.clone(), 8, owner()).unwrap();
    let shared = SharedVault::new(vault, 64);
    shared
        .lock_vault(&owner(), DataHash::commit(b"doc"))
        .unwrap();

    let barrier = Arc::new(Barrier::new(guardians.len()));
    let handles: Vec<_> = guardians
        .iter()
        .copied()
        .map(|g| {
            let shared = shared.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                shared.confirm_release(&g)
            })
        })
        .collect();

    let mut outcomes: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    outcomes.sort_by_key(|o| o.status.current_confirmations);

    let counts: Vec<u32> = outcomes
        .iter()
        .map(|o| o.status.current_confirmations)
        .collect();
    assert_eq!(counts, (1..=8).collect::<Vec<u32>>());

    // Only the call that reached the threshold sees the release.
    for outcome in &outcomes {
        let releasing = outcome.status.current_confirmations == 8;
        assert_eq!(outcome.status.released, releasing);
        assert_eq!(outcome.records.len(), if releasing { 2 } else { 1 });
    }
}

#[test]
fn concurrent_duplicate_confirmation_counts_once() {
    let guardians = identities(3);
    let vault = WillVault::new(guardians.clone(), 3, owner()).unwrap();
    let shared = SharedVault::new(vault, 64);
    shared
        .lock_vault(&owner(), DataHash::commit(b"doc"))
        .unwrap();

    let g = guardians[0];
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || shared.confirm_release(&g))
        })
        .collect();
    let ok = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|r| r.is_ok())
        .count();

    assert_eq!(ok, 1);
    assert_eq!(shared.release_status().current_confirmations, 1);
    assert!(shared.is_confirmed(&g));
}

// ---------------------------------------------------------------------------
// Broadcast Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn subscribers_receive_events_in_log_order() {
    let guardians = identities(2);
    let vault = WillVault::new(guardians.clone(), 2, owner()).unwrap();
    let shared = SharedVault::new(vault, 16);
    let mut rx = shared.subscribe();

    shared
        .lock_vault(&owner(), DataHash::commit(b"doc"))
        .unwrap();
    shared.confirm_release(&guardians[1]).unwrap();
    shared.confirm_release(&guardians[0]).unwrap();

    let mut received = Vec::new();
    for _ in 0..4 {
        received.push(rx.recv().await.unwrap());
    }
    assert_eq!(received, shared.events_since(0));
    assert_eq!(received[3].event, VaultEvent::Released);
}

#[tokio::test]
async fn rejected_calls_are_not_broadcast() {
    let guardians = identities(2);
    let vault = WillVault::new(guardians.clone(), 1, owner()).unwrap();
    let shared = SharedVault::new(vault, 16);
    let mut rx = shared.subscribe();

    assert!(shared.lock_vault(&guardians[0], DataHash::commit(b"doc")).is_err());
    shared
        .lock_vault(&owner(), DataHash::commit(b"doc"))
        .unwrap();

    let first = rx.recv().await.unwrap();
    assert_eq!(first.sequence, 0);
    assert!(matches!(first.event, VaultEvent::Locked { .. }));
}
