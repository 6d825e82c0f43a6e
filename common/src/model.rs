//! Shared data-model types (section 3) that cross the wire as part of
//! more than one RPC result - currently just the transaction record a
//! bank participant keeps per user and echoes back via `history`.

use serde::{Deserialize, Serialize};

use crate::error::Direction;
use crate::txid::TxId;

/// One committed transfer as recorded on a single account. Appended only
/// on commit, per section 3 - a transaction is never recorded until it
/// is final.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txid: TxId,
    pub counterparty_bank: String,
    pub counterparty_user: String,
    pub direction: Direction,
    pub amount: u64,
    pub timestamp: u64,
}
