// Vault benchmarks for WillVault.
//
// Covers the lock path and a full confirmation run up to release, across
// guardian-set sizes, for both the bare vault and the shared handle.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use willvault_contracts::shared::SharedVault;
use willvault_contracts::will_vault::WillVault;
use willvault_protocol::crypto::DataHash;
use willvault_protocol::identity::Address;

fn guardians(n: usize) -> Vec<Address> {
    (0..n)
        .map(|i| {
            let mut bytes = [0u8; 20];
            bytes[..8].copy_from_slice(&(i as u64 + 1).to_be_bytes());
            Address::from_bytes(bytes)
        })
        .collect()
}

const OWNER: Address = Address::from_bytes([0xAA; 20]);

fn bench_lock(c: &mut Criterion) {
    let hash = DataHash::commit(b"bench document");
    let vault = WillVault::new(guardians(5), 3, OWNER).unwrap();

    c.bench_function("vault/lock", |b| {
        b.iter(|| {
            let mut v = vault.clone();
            v.lock_vault(&OWNER, hash).unwrap()
        });
    });
}

fn bench_confirm_to_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/confirm_to_release");
    let hash = DataHash::commit(b"bench document");

    for n in [3usize, 10, 50] {
        let list = guardians(n);
        let threshold = (n as u32 / 2) + 1;
        let mut locked = WillVault::new(list.clone(), threshold, OWNER).unwrap();
        locked.lock_vault(&OWNER, hash).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut v = locked.clone();
                for g in list.iter().take(threshold as usize) {
                    v.confirm_release(g).unwrap();
                }
                v
            });
        });
    }
    group.finish();
}

fn bench_shared_confirm(c: &mut Criterion) {
    let hash = DataHash::commit(b"bench document");
    let list = guardians(10);

    c.bench_function("shared/confirm_to_release", |b| {
        b.iter(|| {
            let vault = WillVault::new(list.clone(), 10, OWNER).unwrap();
            let shared = SharedVault::new(vault, 32);
            shared.lock_vault(&OWNER, hash).unwrap();
            for g in &list {
                shared.confirm_release(g).unwrap();
            }
            shared.release_status()
        });
    });
}

criterion_group!(benches, bench_lock, bench_confirm_to_release, bench_shared_confirm);
criterion_main!(benches);
