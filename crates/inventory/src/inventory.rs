use stockcert_core::{Aggregate, GrantDenial, ShareClassCode};

use crate::snapshot::{ShareClassState, Snapshot};

/// Command: allocate `amount` shares from `share_class`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantShares {
    pub share_class: ShareClassCode,
    pub amount: u64,
}

/// Event: one committed grant.
///
/// `sequence` is the granted class's `issued_certificates` after the grant;
/// `snapshot` is the full post-grant state of every class. This is the unit
/// written to the durable log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRecord {
    pub share_class: ShareClassCode,
    pub amount: u64,
    pub sequence: u64,
    pub snapshot: Snapshot,
}

/// Aggregate root: the share inventory of the (single) company.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    state: Snapshot,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from the last persisted snapshot.
    pub fn from_snapshot(state: Snapshot) -> Self {
        Self { state }
    }

    /// Seed a share class with its authorized total.
    ///
    /// First registration wins: if the class is already known (restored from
    /// the log or registered earlier) this is a no-op and returns `false`.
    pub fn register(&mut self, share_class: ShareClassCode, authorized_amount: u64) -> bool {
        self.state
            .insert_if_absent(share_class, ShareClassState::authorized(authorized_amount))
    }

    pub fn get(&self, share_class: &ShareClassCode) -> Option<ShareClassState> {
        self.state.get(share_class)
    }

    pub fn remaining(&self, share_class: &ShareClassCode) -> Option<u64> {
        self.get(share_class).map(|s| s.remaining_shares)
    }

    pub fn issued(&self, share_class: &ShareClassCode) -> Option<u64> {
        self.get(share_class).map(|s| s.issued_certificates)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }
}

impl Aggregate for Inventory {
    type Command = GrantShares;
    type Event = GrantRecord;
    type Error = GrantDenial;

    fn apply(&mut self, event: &Self::Event) {
        // The record carries the complete post-grant state.
        self.state = event.snapshot.clone();
    }

    fn handle(&self, command: &Self::Command) -> Result<Self::Event, Self::Error> {
        if command.amount == 0 {
            return Err(GrantDenial::ZeroAmount);
        }

        let mut next = self.state.clone();
        let class = next
            .get_mut(&command.share_class)
            .ok_or_else(|| GrantDenial::UnknownShareClass(command.share_class.clone()))?;

        if command.amount > class.remaining_shares {
            return Err(GrantDenial::InsufficientShares {
                share_class: command.share_class.clone(),
                requested: command.amount,
                remaining: class.remaining_shares,
            });
        }

        class.remaining_shares -= command.amount;
        class.issued_certificates += 1;
        let sequence = class.issued_certificates;

        Ok(GrantRecord {
            share_class: command.share_class.clone(),
            amount: command.amount,
            sequence,
            snapshot: next,
        })
    }
}
