//! Wire types for the CL -> CO surface (section 4.1's public contract
//! table): `login`, `transfer`, `balance`, `history`, `ping`.

use serde::{Deserialize, Serialize};

use crate::error::{PrepareFailure, TxState};
use crate::model::TransactionRecord;
use crate::txid::TxId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginParams {
    pub bank: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferParams {
    pub token: String,
    pub txid: TxId,
    pub dst_bank: String,
    pub dst_user: String,
    pub amount: u64,
}

/// The three shapes a `transfer` call can return, matching section 4.1's
/// idempotency rules: a fresh call decides `Committed` or `Aborted`, and
/// a retry of an already-terminal `txid` returns that exact same result
/// rather than a distinct "duplicate" shape. `Duplicate` is reserved for
/// a retry that lands while the original call is still in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransferOutcome {
    Committed,
    Aborted { reason: PrepareFailure },
    Duplicate(TxState),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceParams {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResult {
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryParams {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResult {
    pub records: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PingParams {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResult {
    pub ok: bool,
}
