//! A minimal JSON-RPC client over plain HTTP request/response, grounded
//! on the shape of the teacher's `DaemonAPI::call`/`call_with` methods
//! (request/response only - no websocket, since section 1 explicitly
//! treats the transport as "reliable-while-connected request/response").

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientRpcError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server returned malformed response")]
    MalformedResponse,
    #[error("rpc error {code}: {message}")]
    Rpc { code: i32, message: String },
}

impl ClientRpcError {
    /// True for errors where the participant never got a chance to act
    /// on the request (connection refused, timed out, DNS failure, ...).
    /// The coordinator treats these as `DomainError::Unavailable`.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientRpcError::Transport(_))
    }
}

pub struct JsonRpcClient {
    endpoint: String,
    http: reqwest::Client,
}

impl JsonRpcClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("reqwest client with a fixed timeout always builds"),
        }
    }

    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, ClientRpcError> {
        let body = serde_json::json!({
            "jsonrpc": super::JSON_RPC_VERSION,
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientRpcError::Transport(e.to_string()))?;

        let value: Value = response
            .json()
            .await
            .map_err(|e| ClientRpcError::Transport(e.to_string()))?;

        if let Some(error) = value.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0) as i32;
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(ClientRpcError::Rpc { code, message });
        }

        let result = value
            .get("result")
            .cloned()
            .ok_or(ClientRpcError::MalformedResponse)?;
        serde_json::from_value(result).map_err(|_| ClientRpcError::MalformedResponse)
    }
}
