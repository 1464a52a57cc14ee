//! The authoritative inventory ledger.
//!
//! Grant pipeline, all under one exclusive lock:
//!
//! ```text
//! GrantShares
//!   ↓
//! 1. Decide (pure availability check, produces a GrantRecord)
//!   ↓
//! 2. Append the record's snapshot to the log
//!   ↓
//! 3. Apply the record to in-memory state
//! ```
//!
//! A failed append leaves memory untouched, so a crash or IO error before
//! step 2 completes is indistinguishable from the grant never happening.
//! The lock is a plain `std::sync::Mutex` and the critical section never
//! awaits, so concurrent requests cannot both pass the check against stale
//! state.

use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, info};

use stockcert_core::{Aggregate, GrantDenial, ShareClassCode};
use stockcert_inventory::{GrantRecord, GrantShares, Inventory, Snapshot};

use crate::snapshot_log::{SnapshotLog, SnapshotLogError};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The grant was refused (unknown class, not enough shares).
    #[error(transparent)]
    Denied(#[from] GrantDenial),

    /// Persisting or recovering the snapshot log failed.
    #[error(transparent)]
    Log(#[from] SnapshotLogError),

    #[error("ledger lock poisoned")]
    Poisoned,
}

impl LedgerError {
    pub fn is_denial(&self) -> bool {
        matches!(self, LedgerError::Denied(_))
    }
}

#[derive(Debug)]
struct LedgerState<L> {
    inventory: Inventory,
    log: L,
}

/// Share inventory plus its durable log, behind one lock.
#[derive(Debug)]
pub struct InventoryLedger<L> {
    state: Mutex<LedgerState<L>>,
}

impl<L: SnapshotLog> InventoryLedger<L> {
    /// Replay the log and build the ledger from its last complete record.
    ///
    /// Classes that never appeared in a persisted grant are supplied by
    /// `register` afterwards.
    pub fn load(mut log: L) -> Result<Self, LedgerError> {
        let inventory = match log.load()? {
            Some(snapshot) => Inventory::from_snapshot(snapshot),
            None => Inventory::new(),
        };
        Ok(Self {
            state: Mutex::new(LedgerState { inventory, log }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState<L>>, LedgerError> {
        self.state.lock().map_err(|_| LedgerError::Poisoned)
    }

    /// Seed a share class. No-op (returns `false`) when the class is known.
    pub fn register(
        &self,
        share_class: ShareClassCode,
        authorized_amount: u64,
    ) -> Result<bool, LedgerError> {
        let mut state = self.lock()?;
        let inserted = state.inventory.register(share_class.clone(), authorized_amount);
        if inserted {
            info!(%share_class, authorized_amount, "share class registered");
        } else {
            debug!(%share_class, "share class already known; keeping persisted state");
        }
        Ok(inserted)
    }

    /// Allocate shares and return the committed record.
    ///
    /// `record.sequence` is the certificate sequence number for the class.
    pub fn grant(
        &self,
        share_class: ShareClassCode,
        amount: u64,
    ) -> Result<GrantRecord, LedgerError> {
        let mut state = self.lock()?;
        let LedgerState { inventory, log } = &mut *state;

        let record = match inventory.handle(&GrantShares { share_class, amount }) {
            Ok(record) => record,
            Err(denial) => {
                debug!(%denial, "grant denied");
                return Err(denial.into());
            }
        };

        log.append(&record.snapshot)?;
        inventory.apply(&record);

        info!(
            share_class = %record.share_class,
            sequence = record.sequence,
            amount = record.amount,
            remaining = inventory.remaining(&record.share_class).unwrap_or(0),
            "grant committed"
        );
        Ok(record)
    }

    /// Copy of the current in-memory state.
    pub fn snapshot(&self) -> Result<Snapshot, LedgerError> {
        Ok(self.lock()?.inventory.snapshot().clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::snapshot_log::{FileSnapshotLog, InMemorySnapshotLog};
    use stockcert_inventory::ShareClassState;

    fn cs() -> ShareClassCode {
        ShareClassCode::new("CS").unwrap()
    }

    fn ps() -> ShareClassCode {
        ShareClassCode::new("PS").unwrap()
    }

    #[test]
    fn scenario_grants_and_denials() {
        let ledger = InventoryLedger::load(InMemorySnapshotLog::new()).unwrap();
        ledger.register(cs(), 100).unwrap();

        assert_eq!(ledger.grant(cs(), 60).unwrap().sequence, 1);
        assert_eq!(ledger.snapshot().unwrap().get(&cs()).unwrap().remaining_shares, 40);

        assert!(matches!(
            ledger.grant(cs(), 50),
            Err(LedgerError::Denied(GrantDenial::InsufficientShares { .. }))
        ));

        assert_eq!(ledger.grant(cs(), 40).unwrap().sequence, 2);
        assert_eq!(ledger.snapshot().unwrap().get(&cs()).unwrap().remaining_shares, 0);

        assert!(ledger.grant(cs(), 1).unwrap_err().is_denial());
    }

    #[test]
    fn every_grant_appends_a_full_snapshot() {
        let log = InMemorySnapshotLog::new();
        let ledger = InventoryLedger::load(log.clone()).unwrap();
        ledger.register(cs(), 100).unwrap();
        ledger.register(ps(), 50).unwrap();

        ledger.grant(cs(), 10).unwrap();
        ledger.grant(ps(), 5).unwrap();
        let _ = ledger.grant(ps(), 500);

        assert_eq!(log.lines(), vec!["|CS:90:1|PS:50:0\n", "|CS:90:1|PS:45:1\n"]);
    }

    #[test]
    fn failed_append_commits_nothing() {
        let log = InMemorySnapshotLog::new();
        let ledger = InventoryLedger::load(log.clone()).unwrap();
        ledger.register(cs(), 100).unwrap();
        ledger.grant(cs(), 10).unwrap();

        log.set_fail_appends(true);
        assert!(matches!(ledger.grant(cs(), 10), Err(LedgerError::Log(_))));
        assert_eq!(
            ledger.snapshot().unwrap().get(&cs()),
            Some(ShareClassState { remaining_shares: 90, issued_certificates: 1 })
        );

        log.set_fail_appends(false);
        assert_eq!(ledger.grant(cs(), 10).unwrap().sequence, 2);
    }

    #[test]
    fn restart_continues_sequence_and_ignores_reregistration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.log");

        {
            let ledger = InventoryLedger::load(FileSnapshotLog::open(&path, false).unwrap()).unwrap();
            ledger.register(cs(), 100).unwrap();
            assert_eq!(ledger.grant(cs(), 30).unwrap().sequence, 1);
            assert_eq!(ledger.grant(cs(), 30).unwrap().sequence, 2);
        }

        // Simulated crash: restart from disk, registration must not reset state.
        let ledger = InventoryLedger::load(FileSnapshotLog::open(&path, false).unwrap()).unwrap();
        assert!(!ledger.register(cs(), 100).unwrap());
        assert_eq!(ledger.snapshot().unwrap().get(&cs()).unwrap().remaining_shares, 40);
        assert_eq!(ledger.grant(cs(), 40).unwrap().sequence, 3);
    }

    #[test]
    fn crash_mid_append_rolls_back_to_last_complete_grant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.log");

        {
            let ledger = InventoryLedger::load(FileSnapshotLog::open(&path, false).unwrap()).unwrap();
            ledger.register(cs(), 100).unwrap();
            ledger.grant(cs(), 10).unwrap();
            ledger.grant(cs(), 10).unwrap();
        }
        // Torn write of a third record.
        {
            use std::io::Write;
            let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(b"|CS:7").unwrap();
        }

        let ledger = InventoryLedger::load(FileSnapshotLog::open(&path, false).unwrap()).unwrap();
        ledger.register(cs(), 100).unwrap();
        assert_eq!(
            ledger.snapshot().unwrap().get(&cs()),
            Some(ShareClassState { remaining_shares: 80, issued_certificates: 2 })
        );
        assert_eq!(ledger.grant(cs(), 10).unwrap().sequence, 3);
    }

    #[test]
    fn classes_missing_from_log_come_from_register() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.log");
        std::fs::write(&path, "|CS:5:9\n").unwrap();

        let ledger = InventoryLedger::load(FileSnapshotLog::open(&path, false).unwrap()).unwrap();
        ledger.register(cs(), 1_000).unwrap();
        ledger.register(ps(), 20).unwrap();

        let snap = ledger.snapshot().unwrap();
        assert_eq!(snap.get(&cs()), Some(ShareClassState { remaining_shares: 5, issued_certificates: 9 }));
        assert_eq!(snap.get(&ps()), Some(ShareClassState::authorized(20)));
    }

    #[test]
    fn concurrent_grants_never_oversell() {
        let ledger = Arc::new(InventoryLedger::load(InMemorySnapshotLog::new()).unwrap());
        ledger.register(cs(), 1_000).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    let mut sequences = Vec::new();
                    for _ in 0..50 {
                        if let Ok(record) = ledger.grant(cs(), 7) {
                            sequences.push(record.sequence);
                        }
                    }
                    sequences
                })
            })
            .collect();

        let mut sequences: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        sequences.sort_unstable();

        // 1000 / 7 = 142 grants fit; every sequence number is used exactly once.
        assert_eq!(sequences, (1..=142).collect::<Vec<_>>());
        assert_eq!(ledger.snapshot().unwrap().get(&cs()).unwrap().remaining_shares, 1_000 - 142 * 7);
    }
}
