//! The error taxonomy from section 7 of the specification, shared by the
//! coordinator and bank participant RPC surfaces.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::txid::TxId;

/// Hold kind on a bank account (section 3, Account hold).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldKind {
    Debit,
    Credit,
}

/// Direction of a committed transfer from one user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Sent,
    Received,
}

/// Terminal (or in-flight) state of a transaction, as observed by either
/// side of the protocol. Used both for the coordinator registry and for
/// reporting `duplicate_txid(state)` from a bank participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxState {
    InFlight,
    Prepared,
    Committed,
    Aborted,
}

/// Domain error taxonomy (section 7). Every RPC response that is not a
/// success carries one of these, mapped to a JSON-RPC error code by
/// `crate::rpc::error`.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum DomainError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("authentication failed")]
    AuthFailed,
    #[error("unknown bank: {0}")]
    UnknownBank(String),
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("insufficient funds: need {need}, have {have}")]
    InsufficientFunds { need: u64, have: u64 },
    #[error("duplicate transaction, prior state: {0:?}")]
    DuplicateTxid(TxState),
    #[error("conflicting hold on account")]
    ConflictingHold,
    #[error("operation timed out")]
    Timeout,
    #[error("participant unavailable")]
    Unavailable,
    #[error("hold not prepared or already expired")]
    NotPrepared,
    #[error("unknown transaction: {0}")]
    UnknownTxid(TxId),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why a `Transfer`'s prepare phase failed, surfaced to the client as
/// `aborted(prepare_failed: <reason>)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PrepareFailure {
    Rejected(DomainError),
    Timeout,
    Unavailable,
}

impl std::fmt::Display for PrepareFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrepareFailure::Rejected(e) => write!(f, "{e}"),
            PrepareFailure::Timeout => write!(f, "timeout"),
            PrepareFailure::Unavailable => write!(f, "unavailable"),
        }
    }
}
