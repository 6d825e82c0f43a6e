//! `Coordinator::transfer` - the 2PC orchestration from section 4.1,
//! plus `login`/`balance`/`history`/`ping`, which simply authenticate or
//! forward to the relevant bank participant.

use std::sync::Arc;
use std::time::Duration;

use gateway_common::api::bank::Counterparty;
use gateway_common::api::coordinator::TransferOutcome;
use gateway_common::error::{DomainError, HoldKind, PrepareFailure};
use gateway_common::model::TransactionRecord;
use gateway_common::time::get_current_time_in_seconds;
use gateway_common::token::{Subject, TokenIssuer};
use gateway_common::tokio_util::{log_background_error, spawn_task, Backoff};
use gateway_common::{TxId, TxState};
use log::warn;

use crate::durable_log::DurableLog;
use crate::participant::ParticipantResolver;
use crate::registry::{CoState, CoordinatorEntry, Decision, Party, TransactionRegistry};

pub struct Coordinator {
    registry: TransactionRegistry,
    log: DurableLog,
    participants: Arc<dyn ParticipantResolver>,
    token_issuer: TokenIssuer,
    token_ttl: Duration,
    prepare_timeout: Duration,
    commit_retry_base: Duration,
    commit_retry_cap: Duration,
}

impl Coordinator {
    pub fn new(
        registry: TransactionRegistry,
        log: DurableLog,
        participants: Arc<dyn ParticipantResolver>,
        token_issuer: TokenIssuer,
        token_ttl: Duration,
        prepare_timeout: Duration,
        commit_retry_base: Duration,
        commit_retry_cap: Duration,
    ) -> Self {
        Self {
            registry,
            log,
            participants,
            token_issuer,
            token_ttl,
            prepare_timeout,
            commit_retry_base,
            commit_retry_cap,
        }
    }

    /// Rebuild the in-memory registry from the durable log and sweep any
    /// txid left `InFlight` (section 4.1's crash-recovery sweep). Must
    /// run once before the RPC listener binds.
    pub async fn recover(&self, entries: Vec<CoordinatorEntry>) {
        for mut entry in entries {
            if entry.state == CoState::InFlight {
                warn!(
                    "sweeping orphaned in-flight txid {} from a prior crash",
                    entry.txid
                );
                let src = self.participants.resolve(&entry.src.bank).await.ok();
                let dst = self.participants.resolve(&entry.dst.bank).await.ok();
                if let Some(src) = src {
                    src.abort(HoldKind::Debit, entry.txid, &entry.src.username)
                        .await;
                }
                if let Some(dst) = dst {
                    dst.abort(HoldKind::Credit, entry.txid, &entry.dst.username)
                        .await;
                }
                entry.state = CoState::Aborted;
                entry.decision = Some(Decision::Aborted(PrepareFailure::Unavailable));
            }
            self.registry.insert(entry);
        }
    }

    pub async fn login(
        &self,
        bank: &str,
        username: &str,
        password: &str,
    ) -> Result<String, DomainError> {
        let participant = self.participants.resolve(bank).await?;
        if !participant.authenticate(username, password).await? {
            return Err(DomainError::AuthFailed);
        }
        Ok(self.token_issuer.mint(bank, username, self.token_ttl))
    }

    pub fn verify_token(&self, token: &str) -> Result<Subject, DomainError> {
        self.token_issuer
            .verify(token)
            .map_err(|_| DomainError::Unauthorized)
    }

    pub async fn balance(&self, subject: &Subject) -> Result<u64, DomainError> {
        let participant = self.participants.resolve(&subject.bank).await?;
        participant.balance(&subject.username).await
    }

    pub async fn history(&self, subject: &Subject) -> Result<Vec<TransactionRecord>, DomainError> {
        let participant = self.participants.resolve(&subject.bank).await?;
        participant.history(&subject.username).await
    }

    pub async fn transfer(
        &self,
        subject: &Subject,
        txid: TxId,
        dst_bank: String,
        dst_user: String,
        amount: u64,
    ) -> TransferOutcome {
        // A retry of an already-terminal txid replays the exact same
        // result a fresh call would have produced (section 4.1 rule 1) -
        // `Duplicate` is reserved for a retry that lands while the
        // original call is still in flight.
        if let Some(existing) = self.registry.get(txid) {
            return match existing.state {
                CoState::Committed => TransferOutcome::Committed,
                CoState::Aborted => {
                    let reason = match existing.decision {
                        Some(Decision::Aborted(reason)) => reason,
                        _ => PrepareFailure::Unavailable,
                    };
                    TransferOutcome::Aborted { reason }
                }
                CoState::InFlight => TransferOutcome::Duplicate(TxState::InFlight),
            };
        }

        let src = Party {
            bank: subject.bank.clone(),
            username: subject.username.clone(),
        };
        let dst = Party {
            bank: dst_bank.clone(),
            username: dst_user.clone(),
        };

        let (src_client, dst_client) = match (
            self.participants.resolve(&src.bank).await,
            self.participants.resolve(&dst.bank).await,
        ) {
            (Ok(s), Ok(d)) => (s, d),
            _ => {
                return TransferOutcome::Aborted {
                    reason: PrepareFailure::Unavailable,
                }
            }
        };

        let entry = CoordinatorEntry {
            txid,
            state: CoState::InFlight,
            src: src.clone(),
            dst: dst.clone(),
            amount,
            started_at: get_current_time_in_seconds(),
            decision: None,
        };
        self.registry.insert(entry.clone());
        if let Err(e) = self.log.append(&entry).await {
            log_background_error("failed to append in-flight record", e);
        }

        let prepares = tokio::time::timeout(
            self.prepare_timeout,
            futures::future::join(
                src_client.prepare(HoldKind::Debit, txid, &src.username, amount),
                dst_client.prepare(HoldKind::Credit, txid, &dst.username, amount),
            ),
        )
        .await;

        let (src_result, dst_result) = match prepares {
            Ok((src_result, dst_result)) => (src_result, dst_result),
            Err(_) => (Err(PrepareFailure::Timeout), Err(PrepareFailure::Timeout)),
        };

        if src_result.is_ok() && dst_result.is_ok() {
            self.registry
                .mark_decided(txid, CoState::Committed, Decision::Committed);
            let terminal = CoordinatorEntry {
                state: CoState::Committed,
                decision: Some(Decision::Committed),
                ..entry
            };
            if let Err(e) = self.log.append(&terminal).await {
                log_background_error("failed to append committed record", e);
            }

            self.spawn_commit_retry(
                src_client,
                HoldKind::Debit,
                txid,
                src.username.clone(),
                Counterparty {
                    bank: dst.bank.clone(),
                    username: dst.username.clone(),
                },
            );
            self.spawn_commit_retry(
                dst_client,
                HoldKind::Credit,
                txid,
                dst.username.clone(),
                Counterparty {
                    bank: src.bank.clone(),
                    username: src.username.clone(),
                },
            );

            TransferOutcome::Committed
        } else {
            let src_prepared = src_result.is_ok();
            let dst_prepared = dst_result.is_ok();
            let reason = src_result
                .err()
                .or(dst_result.err())
                .unwrap_or(PrepareFailure::Unavailable);

            if src_prepared {
                src_client.abort(HoldKind::Debit, txid, &src.username).await;
            }
            if dst_prepared {
                dst_client.abort(HoldKind::Credit, txid, &dst.username).await;
            }

            self.registry.mark_decided(
                txid,
                CoState::Aborted,
                Decision::Aborted(reason.clone()),
            );
            let terminal = CoordinatorEntry {
                state: CoState::Aborted,
                decision: Some(Decision::Aborted(reason.clone())),
                ..entry
            };
            if let Err(e) = self.log.append(&terminal).await {
                log_background_error("failed to append aborted record", e);
            }

            TransferOutcome::Aborted { reason }
        }
    }

    /// Retry a commit forever with capped exponential backoff, detached
    /// from the RPC call that decided to commit (section 4.1 step 5) -
    /// commit-phase transport failures are never surfaced to the client.
    fn spawn_commit_retry(
        &self,
        client: std::sync::Arc<dyn crate::participant::ParticipantClient>,
        kind: HoldKind,
        txid: TxId,
        username: String,
        counterparty: Counterparty,
    ) {
        let base = self.commit_retry_base;
        let cap = self.commit_retry_cap;
        spawn_task("commit-retry", async move {
            let mut backoff = Backoff::new(base, cap);
            loop {
                match client.commit(kind, txid, &username, counterparty.clone()).await {
                    Ok(()) => return,
                    Err(e) => {
                        let delay = backoff.next_delay();
                        warn!("commit retry for {txid} failed ({e}), retrying in {delay:?}");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        });
    }
}
