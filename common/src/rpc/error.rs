//! JSON-RPC error envelope, grounded line-for-line on the teacher's
//! `InternalRpcError`/`RpcResponseError` pair in `tos_common::rpc::error`:
//! standard JSON-RPC codes for transport/protocol errors, then a
//! `-32000..-32099` server-error band carrying our domain errors.

use actix_web::{HttpResponse, ResponseError};
use serde_json::Value;
use thiserror::Error;

use crate::error::DomainError;
use crate::rpc::JSON_RPC_VERSION;

/// Code for `DomainError::Unauthorized`, exposed so RPC clients can
/// detect it specifically (e.g. to trigger a re-authentication flow)
/// without matching on the error message text.
pub const UNAUTHORIZED_CODE: i32 = -32000;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid JSON request")]
    InvalidJsonRequest,
    #[error("method '{0}' was not found")]
    MethodNotFound(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl RpcError {
    pub fn code(&self) -> i32 {
        match self {
            RpcError::InvalidJsonRequest => -32600,
            RpcError::MethodNotFound(_) => -32601,
            RpcError::InvalidParams(_) => -32602,
            RpcError::Domain(e) => domain_error_code(e),
        }
    }
}

/// Maps each domain error onto the -32000..-32099 server-error band,
/// reserved by the JSON-RPC spec for implementation-defined errors.
fn domain_error_code(err: &DomainError) -> i32 {
    match err {
        DomainError::Unauthorized => UNAUTHORIZED_CODE,
        DomainError::AuthFailed => -32001,
        DomainError::UnknownBank(_) => -32002,
        DomainError::UnknownUser(_) => -32003,
        DomainError::InsufficientFunds { .. } => -32004,
        DomainError::DuplicateTxid(_) => -32005,
        DomainError::ConflictingHold => -32006,
        DomainError::Timeout => -32007,
        DomainError::Unavailable => -32008,
        DomainError::NotPrepared => -32009,
        DomainError::UnknownTxid(_) => -32010,
        DomainError::Internal(_) => -32099,
    }
}

/// A JSON-RPC error response, ready to serialize.
#[derive(Debug)]
pub struct RpcResponseError {
    id: Option<Value>,
    error: RpcError,
}

impl RpcResponseError {
    pub fn new(id: Option<Value>, error: impl Into<RpcError>) -> Self {
        Self {
            id,
            error: error.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "jsonrpc": JSON_RPC_VERSION,
            "id": self.id.clone().unwrap_or(Value::Null),
            "error": {
                "code": self.error.code(),
                "message": self.error.to_string(),
            }
        })
    }
}

impl std::fmt::Display for RpcResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RpcResponseError[{}]", self.error)
    }
}

impl ResponseError for RpcResponseError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::Ok().json(self.to_json())
    }
}
