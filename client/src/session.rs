//! The client's authenticated view of the coordinator: a thin RPC client
//! plus the credentials needed to re-login after a token expires or after
//! the coordinator restarts with a new signing key (section 4.3's
//! "re-authenticate and resume" requirement).

use gateway_common::api::coordinator::{
    BalanceParams, BalanceResult, HistoryParams, HistoryResult, LoginParams, LoginResult,
    PingParams, PingResult, TransferOutcome, TransferParams,
};
use gateway_common::error::DomainError;
use gateway_common::model::TransactionRecord;
use gateway_common::rpc::client::{ClientRpcError, JsonRpcClient};
use gateway_common::rpc::error::UNAUTHORIZED_CODE;
use gateway_common::TxId;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("coordinator unavailable: {0}")]
    Unavailable(String),
    /// The coordinator rejected our token outright. Distinct from a
    /// transport failure or any other domain error: the caller must
    /// re-authenticate with fresh credentials rather than simply retry
    /// (section 4.3's `ReauthRequired` flow).
    #[error("coordinator rejected our token")]
    Unauthorized,
    #[error(transparent)]
    Domain(#[from] DomainError),
}

fn map_rpc_err(err: ClientRpcError) -> SessionError {
    match err {
        ClientRpcError::Rpc { code, .. } if code == UNAUTHORIZED_CODE => SessionError::Unauthorized,
        _ if err.is_transport() => SessionError::Unavailable(err.to_string()),
        _ => SessionError::Domain(DomainError::Internal(err.to_string())),
    }
}

/// Holds one bearer token and re-mints it on demand. Login credentials
/// are kept in memory only for the lifetime of the process - never
/// persisted to the offline queue or durable log.
pub struct Session {
    rpc: JsonRpcClient,
    bank: String,
    username: String,
    password: String,
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new(coordinator_endpoint: impl Into<String>, bank: String, username: String, password: String) -> Self {
        Self {
            rpc: JsonRpcClient::new(coordinator_endpoint),
            bank,
            username,
            password,
            token: RwLock::new(None),
        }
    }

    /// Authenticate against the coordinator and cache the resulting
    /// token. Called once at startup and again any time a call comes
    /// back `Unauthorized`.
    pub async fn login(&self) -> Result<(), SessionError> {
        let result: LoginResult = self
            .rpc
            .call(
                "login",
                &LoginParams {
                    bank: self.bank.clone(),
                    username: self.username.clone(),
                    password: self.password.clone(),
                },
            )
            .await
            .map_err(map_rpc_err)?;
        *self.token.write().await = Some(result.token);
        Ok(())
    }

    async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Submit a transfer. If the coordinator rejects our token outright,
    /// the cached token is cleared and `SessionError::Unauthorized` is
    /// returned without retrying - re-authenticating with the same stale
    /// password would just fail again or, worse, silently paper over a
    /// real credential problem. The caller (the queue worker) surfaces
    /// this as `Event::ReauthRequired` and stops until fresh credentials
    /// arrive (section 4.3).
    pub async fn transfer(
        &self,
        txid: TxId,
        dst_bank: String,
        dst_user: String,
        amount: u64,
    ) -> Result<TransferOutcome, SessionError> {
        self.login_if_needed().await?;

        let token = self.token().await.expect("logged in above");
        match self.send_transfer(token, txid, &dst_bank, &dst_user, amount).await {
            Ok(outcome) => Ok(outcome),
            Err(ClientRpcError::Rpc { code, .. }) if code == UNAUTHORIZED_CODE => {
                *self.token.write().await = None;
                Err(SessionError::Unauthorized)
            }
            Err(e) => Err(map_rpc_err(e)),
        }
    }

    async fn send_transfer(
        &self,
        token: String,
        txid: TxId,
        dst_bank: &str,
        dst_user: &str,
        amount: u64,
    ) -> Result<TransferOutcome, ClientRpcError> {
        self.rpc
            .call(
                "transfer",
                &TransferParams {
                    token,
                    txid,
                    dst_bank: dst_bank.to_string(),
                    dst_user: dst_user.to_string(),
                    amount,
                },
            )
            .await
    }

    pub async fn balance(&self) -> Result<u64, SessionError> {
        self.login_if_needed().await?;
        let token = self.token().await.expect("logged in above");
        let result: BalanceResult = self
            .rpc
            .call("balance", &BalanceParams { token })
            .await
            .map_err(map_rpc_err)?;
        Ok(result.balance)
    }

    pub async fn history(&self) -> Result<Vec<TransactionRecord>, SessionError> {
        self.login_if_needed().await?;
        let token = self.token().await.expect("logged in above");
        let result: HistoryResult = self
            .rpc
            .call("history", &HistoryParams { token })
            .await
            .map_err(map_rpc_err)?;
        Ok(result.records)
    }

    /// Cheap reachability probe the queue worker polls while offline
    /// (section 4.3).
    pub async fn ping(&self) -> bool {
        self.rpc
            .call::<_, PingResult>("ping", &PingParams::default())
            .await
            .map(|r| r.ok)
            .unwrap_or(false)
    }

    async fn login_if_needed(&self) -> Result<(), SessionError> {
        if self.token().await.is_none() {
            self.login().await?;
        }
        Ok(())
    }
}
