//! The coordinator's idempotency registry (section 4.1): one entry per
//! `txid`, mirroring exactly what has been decided so a retried
//! `transfer` call with the same `txid` can be answered without
//! re-running 2PC.

use dashmap::DashMap;
use gateway_common::error::PrepareFailure;
use gateway_common::TxId;
use serde::{Deserialize, Serialize};

/// One side of a transfer: a bank name plus the account on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub bank: String,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoState {
    InFlight,
    Committed,
    Aborted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Decision {
    Committed,
    Aborted(PrepareFailure),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorEntry {
    pub txid: TxId,
    pub state: CoState,
    pub src: Party,
    pub dst: Party,
    pub amount: u64,
    pub started_at: u64,
    pub decision: Option<Decision>,
}

/// `DashMap<TxId, CoordinatorEntry>`, matching the teacher's use of
/// `dashmap` throughout the daemon for concurrent maps.
#[derive(Default)]
pub struct TransactionRegistry {
    entries: DashMap<TxId, CoordinatorEntry>,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, txid: TxId) -> Option<CoordinatorEntry> {
        self.entries.get(&txid).map(|e| e.value().clone())
    }

    pub fn insert(&self, entry: CoordinatorEntry) {
        self.entries.insert(entry.txid, entry);
    }

    pub fn mark_decided(&self, txid: TxId, state: CoState, decision: Decision) {
        if let Some(mut entry) = self.entries.get_mut(&txid) {
            entry.state = state;
            entry.decision = Some(decision);
        }
    }
}
