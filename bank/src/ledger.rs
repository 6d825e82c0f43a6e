//! Per-account ledger: balances, holds, and the prepare/commit/abort
//! state machine from section 4.2. Each account is guarded by its own
//! `tokio::sync::Mutex` so unrelated accounts never block each other -
//! only the `DashMap` lookup itself is briefly synchronous, grounded on
//! the teacher's per-resource locking style rather than one global write
//! lock for the whole ledger.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::{DashMap, DashSet};
use gateway_common::error::{Direction, DomainError, HoldKind};
use gateway_common::model::TransactionRecord;
use gateway_common::time::get_current_time_in_seconds;
use gateway_common::TxId;
use tokio::sync::Mutex;

use crate::storage::{BankState, PersistedUser};

/// A live hold against an account, per section 3. Holds are never
/// persisted - on restart, any in-flight 2PC is implicitly abandoned by
/// the coordinator's own crash-sweep (section 4.1), so the bank only
/// needs to remember *completed* transactions across a restart.
#[derive(Debug, Clone)]
struct AccountHold {
    txid: TxId,
    kind: HoldKind,
    amount: u64,
    deadline: Instant,
}

struct AccountState {
    password_hash: String,
    balance: u64,
    holds: Vec<AccountHold>,
    history: Vec<TransactionRecord>,
}

impl AccountState {
    fn held_debit(&self) -> u64 {
        self.holds
            .iter()
            .filter(|h| h.kind == HoldKind::Debit)
            .map(|h| h.amount)
            .sum()
    }

    fn find_hold(&self, txid: TxId, kind: HoldKind) -> Option<&AccountHold> {
        self.holds.iter().find(|h| h.txid == txid && h.kind == kind)
    }

    fn take_hold(&mut self, txid: TxId, kind: HoldKind) -> Option<AccountHold> {
        let idx = self
            .holds
            .iter()
            .position(|h| h.txid == txid && h.kind == kind)?;
        Some(self.holds.remove(idx))
    }
}

/// Owns every account on this bank. Constructed once at startup from
/// persisted state or credential bootstrap, shared behind an `Arc`
/// across the RPC handlers and the hold-expiry sweep task.
pub struct Ledger {
    accounts: DashMap<String, Arc<Mutex<AccountState>>>,
    completed_txids: DashSet<TxId>,
    hold_ttl: Duration,
}

impl Ledger {
    pub fn from_state(state: BankState, hold_ttl: Duration) -> Self {
        let accounts = DashMap::new();
        for (username, user) in state.users {
            accounts.insert(
                username,
                Arc::new(Mutex::new(AccountState {
                    password_hash: user.password_hash,
                    balance: user.balance,
                    holds: Vec::new(),
                    history: user.history,
                })),
            );
        }
        let completed_txids = DashSet::new();
        for txid in state.completed_txids {
            completed_txids.insert(txid);
        }
        Self {
            accounts,
            completed_txids,
            hold_ttl,
        }
    }

    fn account(&self, username: &str) -> Result<Arc<Mutex<AccountState>>, DomainError> {
        self.accounts
            .get(username)
            .map(|e| e.value().clone())
            .ok_or_else(|| DomainError::UnknownUser(username.to_string()))
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool, DomainError> {
        let account = self.account(username)?;
        let account = account.lock().await;
        Ok(crate::auth::verify_password(password, &account.password_hash))
    }

    pub async fn balance(&self, username: &str) -> Result<u64, DomainError> {
        let account = self.account(username)?;
        let account = account.lock().await;
        Ok(account.balance)
    }

    pub async fn history(&self, username: &str) -> Result<Vec<TransactionRecord>, DomainError> {
        let account = self.account(username)?;
        let account = account.lock().await;
        Ok(account.history.clone())
    }

    async fn prepare(
        &self,
        kind: HoldKind,
        txid: TxId,
        username: &str,
        amount: u64,
    ) -> Result<(), DomainError> {
        let account = self.account(username)?;
        let mut account = account.lock().await;

        if account.find_hold(txid, kind).is_some() {
            return Ok(());
        }

        if kind == HoldKind::Debit {
            if account
                .holds
                .iter()
                .any(|h| h.kind == HoldKind::Debit && h.txid != txid)
            {
                return Err(DomainError::ConflictingHold);
            }
            let available = account.balance.saturating_sub(account.held_debit());
            if available < amount {
                return Err(DomainError::InsufficientFunds {
                    need: amount,
                    have: available,
                });
            }
        }

        account.holds.push(AccountHold {
            txid,
            kind,
            amount,
            deadline: Instant::now() + self.hold_ttl,
        });
        Ok(())
    }

    pub async fn prepare_debit(
        &self,
        txid: TxId,
        username: &str,
        amount: u64,
    ) -> Result<(), DomainError> {
        self.prepare(HoldKind::Debit, txid, username, amount).await
    }

    pub async fn prepare_credit(
        &self,
        txid: TxId,
        username: &str,
        amount: u64,
    ) -> Result<(), DomainError> {
        self.prepare(HoldKind::Credit, txid, username, amount)
            .await
    }

    async fn commit(
        &self,
        kind: HoldKind,
        txid: TxId,
        username: &str,
        counterparty_bank: &str,
        counterparty_user: &str,
    ) -> Result<(), DomainError> {
        let account = self.account(username)?;
        let mut account = account.lock().await;

        let hold = match account.take_hold(txid, kind) {
            Some(hold) => hold,
            None if self.completed_txids.contains(&txid) => return Ok(()),
            None => return Err(DomainError::NotPrepared),
        };

        match kind {
            HoldKind::Debit => account.balance = account.balance.saturating_sub(hold.amount),
            HoldKind::Credit => account.balance += hold.amount,
        }

        account.history.push(TransactionRecord {
            txid,
            counterparty_bank: counterparty_bank.to_string(),
            counterparty_user: counterparty_user.to_string(),
            direction: match kind {
                HoldKind::Debit => Direction::Sent,
                HoldKind::Credit => Direction::Received,
            },
            amount: hold.amount,
            timestamp: get_current_time_in_seconds(),
        });

        self.completed_txids.insert(txid);
        Ok(())
    }

    pub async fn commit_debit(
        &self,
        txid: TxId,
        username: &str,
        counterparty_bank: &str,
        counterparty_user: &str,
    ) -> Result<(), DomainError> {
        self.commit(
            HoldKind::Debit,
            txid,
            username,
            counterparty_bank,
            counterparty_user,
        )
        .await
    }

    pub async fn commit_credit(
        &self,
        txid: TxId,
        username: &str,
        counterparty_bank: &str,
        counterparty_user: &str,
    ) -> Result<(), DomainError> {
        self.commit(
            HoldKind::Credit,
            txid,
            username,
            counterparty_bank,
            counterparty_user,
        )
        .await
    }

    /// Always succeeds, including for a `txid` this account never held -
    /// section 4.2's `abort_*` contract.
    async fn abort(&self, kind: HoldKind, txid: TxId, username: &str) {
        if let Ok(account) = self.account(username) {
            let mut account = account.lock().await;
            account.take_hold(txid, kind);
        }
    }

    pub async fn abort_debit(&self, txid: TxId, username: &str) {
        self.abort(HoldKind::Debit, txid, username).await
    }

    pub async fn abort_credit(&self, txid: TxId, username: &str) {
        self.abort(HoldKind::Credit, txid, username).await
    }

    /// Removes holds whose deadline has passed - the implicit abort
    /// described in section 4.2, run periodically by a background task.
    /// Returns the number of holds swept, for logging.
    pub async fn sweep_expired_holds(&self) -> usize {
        let now = Instant::now();
        let mut swept = 0;
        for entry in self.accounts.iter() {
            let mut account = entry.value().lock().await;
            let before = account.holds.len();
            account.holds.retain(|h| h.deadline > now);
            swept += before - account.holds.len();
        }
        swept
    }

    /// Sweep interval for expired holds - a quarter of the configured
    /// hold TTL, matching the teacher's periodic-task style for e.g.
    /// mempool pruning.
    pub fn sweep_interval(&self) -> Duration {
        self.hold_ttl / 4
    }

    /// Snapshot the ledger for persistence on graceful shutdown (section
    /// 6.3) - holds are deliberately not included.
    pub async fn snapshot(&self) -> BankState {
        let mut users = HashMap::new();
        for entry in self.accounts.iter() {
            let account = entry.value().lock().await;
            users.insert(
                entry.key().clone(),
                PersistedUser {
                    password_hash: account.password_hash.clone(),
                    balance: account.balance,
                    history: account.history.clone(),
                },
            );
        }
        BankState {
            users,
            completed_txids: self.completed_txids.iter().map(|t| *t).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PersistedUser;

    fn test_ledger() -> Ledger {
        let mut users = HashMap::new();
        users.insert(
            "alice".to_string(),
            PersistedUser {
                password_hash: crate::auth::hash_password("secret"),
                balance: 100,
                history: Vec::new(),
            },
        );
        Ledger::from_state(
            BankState {
                users,
                completed_txids: Vec::new(),
            },
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn prepare_debit_then_commit_moves_balance() {
        let ledger = test_ledger();
        let txid = TxId::generate();
        ledger.prepare_debit(txid, "alice", 40).await.unwrap();
        ledger
            .commit_debit(txid, "alice", "bank_b", "bob")
            .await
            .unwrap();
        assert_eq!(ledger.balance("alice").await.unwrap(), 60);
    }

    #[tokio::test]
    async fn insufficient_funds_is_rejected() {
        let ledger = test_ledger();
        let txid = TxId::generate();
        let err = ledger
            .prepare_debit(txid, "alice", 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientFunds { .. }));
    }

    #[tokio::test]
    async fn second_debit_hold_conflicts() {
        let ledger = test_ledger();
        let first = TxId::generate();
        let second = TxId::generate();
        ledger.prepare_debit(first, "alice", 10).await.unwrap();
        let err = ledger
            .prepare_debit(second, "alice", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ConflictingHold));
    }

    #[tokio::test]
    async fn re_prepare_with_same_txid_is_idempotent() {
        let ledger = test_ledger();
        let txid = TxId::generate();
        ledger.prepare_debit(txid, "alice", 10).await.unwrap();
        ledger.prepare_debit(txid, "alice", 10).await.unwrap();
    }

    #[tokio::test]
    async fn abort_is_always_ok_even_for_unknown_txid() {
        let ledger = test_ledger();
        ledger.abort_debit(TxId::generate(), "alice").await;
    }

    #[tokio::test]
    async fn commit_after_restart_is_idempotent_via_completed_txids() {
        let txid = TxId::generate();
        let mut users = HashMap::new();
        users.insert(
            "alice".to_string(),
            PersistedUser {
                password_hash: crate::auth::hash_password("secret"),
                balance: 60,
                history: Vec::new(),
            },
        );
        let ledger = Ledger::from_state(
            BankState {
                users,
                completed_txids: vec![txid],
            },
            Duration::from_secs(10),
        );
        // No live hold exists (process restarted after the hold was
        // already consumed), but the commit must still report success.
        ledger
            .commit_debit(txid, "alice", "bank_b", "bob")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn commit_without_prepare_and_without_history_is_not_prepared() {
        let ledger = test_ledger();
        let err = ledger
            .commit_debit(TxId::generate(), "alice", "bank_b", "bob")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotPrepared));
    }

    #[tokio::test]
    async fn expired_hold_is_swept() {
        let ledger = test_ledger();
        let txid = TxId::generate();
        ledger.prepare_debit(txid, "alice", 10).await.unwrap();
        {
            let account = ledger.account("alice").unwrap();
            let mut account = account.lock().await;
            account.holds[0].deadline = Instant::now() - Duration::from_secs(1);
        }
        assert_eq!(ledger.sweep_expired_holds().await, 1);
        let err = ledger
            .commit_debit(txid, "alice", "bank_b", "bob")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotPrepared));
    }
}
