//! Wire types for the CO -> BP surface (section 4.2's public contract
//! table): `authenticate`, `prepare_debit`/`prepare_credit`,
//! `commit_debit`/`commit_credit`, `abort_debit`/`abort_credit`,
//! `balance`, `history`.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, HoldKind};
use crate::model::TransactionRecord;
use crate::txid::TxId;

/// Everything a bank needs to append a `TransactionRecord` on commit,
/// carried in the commit params themselves rather than looked up
/// elsewhere - the bank never talks to the other participant directly
/// (section 10, "participant is a capability set").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterparty {
    pub bank: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateParams {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticateResult {
    pub authenticated: bool,
}

/// Shared shape for `prepare_debit` and `prepare_credit` - the `kind`
/// is implied by which RPC method is called, not carried in the params,
/// but is useful on the `Ledger` side so it is kept here too for
/// handlers that share one code path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareParams {
    pub txid: TxId,
    pub username: String,
    pub amount: u64,
}

/// Outcome of a prepare call. A duplicate in-flight or already-decided
/// `txid` is reported as `Prepared`/`Rejected` consistently with its
/// prior decision rather than a separate variant, per section 4.2 rule
/// 1 ("idempotent re-prepare").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PrepareResult {
    Prepared,
    Rejected(DomainError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitParams {
    pub txid: TxId,
    pub username: String,
    pub counterparty: Counterparty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbortParams {
    pub txid: TxId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResult {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceParams {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResult {
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryParams {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResult {
    pub records: Vec<TransactionRecord>,
}

/// Helper so call sites don't need to spell out which RPC method name
/// goes with which `HoldKind` - used by the coordinator's
/// `ParticipantClient` to pick `prepare_debit` vs `prepare_credit` etc.
/// from a single generic code path.
pub fn prepare_method(kind: HoldKind) -> &'static str {
    match kind {
        HoldKind::Debit => "prepare_debit",
        HoldKind::Credit => "prepare_credit",
    }
}

pub fn commit_method(kind: HoldKind) -> &'static str {
    match kind {
        HoldKind::Debit => "commit_debit",
        HoldKind::Credit => "commit_credit",
    }
}

pub fn abort_method(kind: HoldKind) -> &'static str {
    match kind {
        HoldKind::Debit => "abort_debit",
        HoldKind::Credit => "abort_credit",
    }
}
