use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// A JSON-RPC 2.0 success response envelope.
#[derive(Debug, Serialize)]
pub struct RpcSuccess {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub result: Value,
}

impl RpcSuccess {
    pub fn new(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: super::JSON_RPC_VERSION,
            id: id.unwrap_or(Value::Null),
            result,
        }
    }
}
