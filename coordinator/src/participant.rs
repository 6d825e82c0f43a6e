//! The coordinator's view of a bank participant: a thin RPC client plus
//! a registry-backed directory that resolves a bank name to one,
//! grounded on the teacher's `DaemonAPI`'s own connection caching in the
//! wallet (`wallet::daemon_api`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gateway_common::api::bank::{
    AbortParams, AuthenticateParams, AuthenticateResult, BalanceParams, BalanceResult,
    CommitParams, Counterparty, HistoryParams, HistoryResult, OkResult, PrepareParams,
    PrepareResult,
};
use gateway_common::api::bank::{abort_method, commit_method, prepare_method};
use gateway_common::error::{DomainError, HoldKind, PrepareFailure};
use gateway_common::model::TransactionRecord;
use gateway_common::registry_client::ServiceRegistry;
use gateway_common::rpc::client::{ClientRpcError, JsonRpcClient};
use gateway_common::TxId;
use tokio::sync::RwLock;

/// Capability set the coordinator needs against a bank participant -
/// "participant" names a set of operations, not a source/destination
/// distinction (section 10's design note).
#[async_trait]
pub trait ParticipantClient: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<bool, DomainError>;
    async fn prepare(
        &self,
        kind: HoldKind,
        txid: TxId,
        username: &str,
        amount: u64,
    ) -> Result<(), PrepareFailure>;
    async fn commit(
        &self,
        kind: HoldKind,
        txid: TxId,
        username: &str,
        counterparty: Counterparty,
    ) -> Result<(), DomainError>;
    async fn abort(&self, kind: HoldKind, txid: TxId, username: &str);
    async fn balance(&self, username: &str) -> Result<u64, DomainError>;
    async fn history(&self, username: &str) -> Result<Vec<TransactionRecord>, DomainError>;
}

/// `ParticipantClient` over `POST /json_rpc`, used in production; tests
/// substitute a plain in-process test double instead (section 9).
pub struct HttpParticipantClient {
    rpc: JsonRpcClient,
}

impl HttpParticipantClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            rpc: JsonRpcClient::new(endpoint),
        }
    }
}

fn client_err_to_domain(err: ClientRpcError) -> DomainError {
    if err.is_transport() {
        DomainError::Unavailable
    } else {
        DomainError::Internal(err.to_string())
    }
}

#[async_trait]
impl ParticipantClient for HttpParticipantClient {
    async fn authenticate(&self, username: &str, password: &str) -> Result<bool, DomainError> {
        let result: AuthenticateResult = self
            .rpc
            .call(
                "authenticate",
                &AuthenticateParams {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            )
            .await
            .map_err(client_err_to_domain)?;
        Ok(result.authenticated)
    }

    async fn prepare(
        &self,
        kind: HoldKind,
        txid: TxId,
        username: &str,
        amount: u64,
    ) -> Result<(), PrepareFailure> {
        let params = PrepareParams {
            txid,
            username: username.to_string(),
            amount,
        };
        let result: PrepareResult = self
            .rpc
            .call(prepare_method(kind), &params)
            .await
            .map_err(|e| {
                if e.is_transport() {
                    PrepareFailure::Unavailable
                } else {
                    PrepareFailure::Rejected(DomainError::Internal(e.to_string()))
                }
            })?;
        match result {
            PrepareResult::Prepared => Ok(()),
            PrepareResult::Rejected(e) => Err(PrepareFailure::Rejected(e)),
        }
    }

    async fn commit(
        &self,
        kind: HoldKind,
        txid: TxId,
        username: &str,
        counterparty: Counterparty,
    ) -> Result<(), DomainError> {
        let params = CommitParams {
            txid,
            username: username.to_string(),
            counterparty,
        };
        let _: OkResult = self
            .rpc
            .call(commit_method(kind), &params)
            .await
            .map_err(client_err_to_domain)?;
        Ok(())
    }

    async fn abort(&self, kind: HoldKind, txid: TxId, username: &str) {
        let params = AbortParams {
            txid,
            username: username.to_string(),
        };
        let _ = self
            .rpc
            .call::<_, OkResult>(abort_method(kind), &params)
            .await;
    }

    async fn balance(&self, username: &str) -> Result<u64, DomainError> {
        let result: BalanceResult = self
            .rpc
            .call(
                "balance",
                &BalanceParams {
                    username: username.to_string(),
                },
            )
            .await
            .map_err(client_err_to_domain)?;
        Ok(result.balance)
    }

    async fn history(&self, username: &str) -> Result<Vec<TransactionRecord>, DomainError> {
        let result: HistoryResult = self
            .rpc
            .call(
                "history",
                &HistoryParams {
                    username: username.to_string(),
                },
            )
            .await
            .map_err(client_err_to_domain)?;
        Ok(result.records)
    }
}

/// Resolves a bank name to the `ParticipantClient` that speaks for it.
/// `Coordinator` depends only on this trait, not on `ParticipantDirectory`
/// directly, so integration tests can substitute an in-process resolver
/// backed by a plain `Ledger` instead of real HTTP (section 9).
#[async_trait]
pub trait ParticipantResolver: Send + Sync {
    async fn resolve(&self, bank: &str) -> Result<Arc<dyn ParticipantClient>, DomainError>;
}

struct CacheEntry {
    client: Arc<dyn ParticipantClient>,
    resolved_at: Instant,
}

/// Resolves a bank name to a `ParticipantClient` through the service
/// registry, with a short TTL cache so a burst of transfers to the same
/// bank doesn't hit the registry every time (grounded in `DaemonAPI`'s
/// own connection caching pattern).
pub struct ParticipantDirectory {
    registry: Arc<dyn ServiceRegistry>,
    cache: RwLock<HashMap<String, CacheEntry>>,
    cache_ttl: Duration,
}

impl ParticipantDirectory {
    pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
            cache_ttl: Duration::from_secs(30),
        }
    }

    pub async fn resolve(&self, bank: &str) -> Result<Arc<dyn ParticipantClient>, DomainError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(bank) {
                if entry.resolved_at.elapsed() < self.cache_ttl {
                    return Ok(entry.client.clone());
                }
            }
        }

        let address = self
            .registry
            .lookup(&format!("bank/{bank}"))
            .await
            .map_err(|_| DomainError::Unavailable)?;
        let client: Arc<dyn ParticipantClient> =
            Arc::new(HttpParticipantClient::new(format!("http://{address}/json_rpc")));

        let mut cache = self.cache.write().await;
        cache.insert(
            bank.to_string(),
            CacheEntry {
                client: client.clone(),
                resolved_at: Instant::now(),
            },
        );
        Ok(client)
    }
}

#[async_trait]
impl ParticipantResolver for ParticipantDirectory {
    async fn resolve(&self, bank: &str) -> Result<Arc<dyn ParticipantClient>, DomainError> {
        ParticipantDirectory::resolve(self, bank).await
    }
}
