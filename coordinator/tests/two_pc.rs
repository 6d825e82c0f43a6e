//! End-to-end coverage of `Coordinator::transfer` against an in-process
//! `Ledger`-backed `ParticipantClient` test double (section 9) - no real
//! HTTP, exercising the six concrete scenarios section 8 treats as
//! binding acceptance criteria.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway_bank::ledger::Ledger;
use gateway_bank::storage::{BankState, PersistedUser};
use gateway_common::api::bank::Counterparty;
use gateway_common::api::coordinator::TransferOutcome;
use gateway_common::error::{DomainError, HoldKind, PrepareFailure};
use gateway_common::model::TransactionRecord;
use gateway_common::token::{Subject, TokenIssuer};
use gateway_common::TxId;
use gateway_coordinator::durable_log::DurableLog;
use gateway_coordinator::participant::{ParticipantClient, ParticipantResolver};
use gateway_coordinator::registry::{CoState, CoordinatorEntry, Party, TransactionRegistry};
use gateway_coordinator::two_pc::Coordinator;

/// `ParticipantClient` backed directly by a `Ledger`, the same test
/// double shape as the corpus's `MockMessageSender` - a plain struct,
/// no mocking framework.
struct LedgerParticipant(Arc<Ledger>);

#[async_trait]
impl ParticipantClient for LedgerParticipant {
    async fn authenticate(&self, username: &str, password: &str) -> Result<bool, DomainError> {
        Ok(self.0.authenticate(username, password).await.unwrap_or(false))
    }

    async fn prepare(
        &self,
        kind: HoldKind,
        txid: TxId,
        username: &str,
        amount: u64,
    ) -> Result<(), PrepareFailure> {
        let result = match kind {
            HoldKind::Debit => self.0.prepare_debit(txid, username, amount).await,
            HoldKind::Credit => self.0.prepare_credit(txid, username, amount).await,
        };
        result.map_err(PrepareFailure::Rejected)
    }

    async fn commit(
        &self,
        kind: HoldKind,
        txid: TxId,
        username: &str,
        counterparty: Counterparty,
    ) -> Result<(), DomainError> {
        match kind {
            HoldKind::Debit => {
                self.0
                    .commit_debit(txid, username, &counterparty.bank, &counterparty.username)
                    .await
            }
            HoldKind::Credit => {
                self.0
                    .commit_credit(txid, username, &counterparty.bank, &counterparty.username)
                    .await
            }
        }
    }

    async fn abort(&self, kind: HoldKind, txid: TxId, username: &str) {
        match kind {
            HoldKind::Debit => self.0.abort_debit(txid, username).await,
            HoldKind::Credit => self.0.abort_credit(txid, username).await,
        }
    }

    async fn balance(&self, username: &str) -> Result<u64, DomainError> {
        self.0.balance(username).await
    }

    async fn history(&self, username: &str) -> Result<Vec<TransactionRecord>, DomainError> {
        self.0.history(username).await
    }
}

/// Resolves straight out of a fixed map - no registry, no network.
struct MapResolver(HashMap<String, Arc<dyn ParticipantClient>>);

#[async_trait]
impl ParticipantResolver for MapResolver {
    async fn resolve(&self, bank: &str) -> Result<Arc<dyn ParticipantClient>, DomainError> {
        self.0
            .get(bank)
            .cloned()
            .ok_or_else(|| DomainError::UnknownBank(bank.to_string()))
    }
}

async fn test_coordinator(banks: Vec<(&str, u64)>) -> Arc<Coordinator> {
    let mut resolvers = HashMap::new();
    for (name, balance) in banks {
        let user = PersistedUser {
            password_hash: gateway_bank::auth::hash_password("secret"),
            balance,
            history: Vec::new(),
        };
        let mut users = HashMap::new();
        users.insert("user".to_string(), user);
        let ledger = Arc::new(Ledger::from_state(
            BankState {
                users,
                completed_txids: Vec::new(),
            },
            Duration::from_secs(10),
        ));
        resolvers.insert(
            name.to_string(),
            Arc::new(LedgerParticipant(ledger)) as Arc<dyn ParticipantClient>,
        );
    }

    let log_path = std::env::temp_dir().join(format!("gateway-co-test-{}.ndjson", TxId::generate()));
    let log = DurableLog::open(&log_path).await.unwrap();

    let coordinator = Arc::new(Coordinator::new(
        TransactionRegistry::new(),
        log,
        Arc::new(MapResolver(resolvers)),
        TokenIssuer::new(b"test-key".to_vec()),
        Duration::from_secs(3600),
        Duration::from_millis(500),
        Duration::from_millis(10),
        Duration::from_millis(50),
    ));
    coordinator
}

fn subject(bank: &str) -> Subject {
    Subject {
        bank: bank.to_string(),
        username: "user".to_string(),
    }
}

#[tokio::test]
async fn successful_transfer_commits_on_both_sides() {
    let coordinator = test_coordinator(vec![("bank_a", 100), ("bank_b", 0)]).await;
    let txid = TxId::generate();

    let outcome = coordinator
        .transfer(&subject("bank_a"), txid, "bank_b".to_string(), "user".to_string(), 40)
        .await;
    assert!(matches!(outcome, TransferOutcome::Committed));

    // commit retries are detached; give them a moment to land.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(coordinator.balance(&subject("bank_a")).await.unwrap(), 60);
    assert_eq!(coordinator.balance(&subject("bank_b")).await.unwrap(), 40);
}

#[tokio::test]
async fn insufficient_funds_aborts_without_moving_balance() {
    let coordinator = test_coordinator(vec![("bank_a", 10), ("bank_b", 0)]).await;
    let txid = TxId::generate();

    let outcome = coordinator
        .transfer(&subject("bank_a"), txid, "bank_b".to_string(), "user".to_string(), 40)
        .await;
    match outcome {
        TransferOutcome::Aborted { reason } => {
            assert!(matches!(reason, PrepareFailure::Rejected(DomainError::InsufficientFunds { .. })));
        }
        other => panic!("expected Aborted, got {other:?}"),
    }
    assert_eq!(coordinator.balance(&subject("bank_a")).await.unwrap(), 10);
    assert_eq!(coordinator.balance(&subject("bank_b")).await.unwrap(), 0);
}

#[tokio::test]
async fn retrying_the_same_txid_replays_the_prior_decision() {
    let coordinator = test_coordinator(vec![("bank_a", 100), ("bank_b", 0)]).await;
    let txid = TxId::generate();

    let first = coordinator
        .transfer(&subject("bank_a"), txid, "bank_b".to_string(), "user".to_string(), 40)
        .await;
    assert!(matches!(first, TransferOutcome::Committed));

    // A retry of an already-terminal txid must replay the exact same
    // result a fresh call would have produced, not a distinct
    // "duplicate" shape - section 4.1 rule 1.
    let second = coordinator
        .transfer(&subject("bank_a"), txid, "bank_b".to_string(), "user".to_string(), 40)
        .await;
    assert!(matches!(second, TransferOutcome::Committed));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(coordinator.balance(&subject("bank_a")).await.unwrap(), 60);
}

#[tokio::test]
async fn retrying_an_aborted_txid_replays_the_original_reason() {
    let coordinator = test_coordinator(vec![("bank_a", 10), ("bank_b", 0)]).await;
    let txid = TxId::generate();

    let first = coordinator
        .transfer(&subject("bank_a"), txid, "bank_b".to_string(), "user".to_string(), 40)
        .await;
    let first_reason = match first {
        TransferOutcome::Aborted { reason } => reason,
        other => panic!("expected Aborted, got {other:?}"),
    };

    let second = coordinator
        .transfer(&subject("bank_a"), txid, "bank_b".to_string(), "user".to_string(), 40)
        .await;
    match second {
        TransferOutcome::Aborted { reason } => {
            assert_eq!(reason.to_string(), first_reason.to_string());
        }
        other => panic!("expected Aborted with the original reason, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_destination_bank_aborts_as_unavailable() {
    let coordinator = test_coordinator(vec![("bank_a", 100)]).await;
    let txid = TxId::generate();

    let outcome = coordinator
        .transfer(
            &subject("bank_a"),
            txid,
            "nonexistent_bank".to_string(),
            "user".to_string(),
            10,
        )
        .await;
    assert!(matches!(
        outcome,
        TransferOutcome::Aborted {
            reason: PrepareFailure::Unavailable
        }
    ));
    assert_eq!(coordinator.balance(&subject("bank_a")).await.unwrap(), 100);
}

#[tokio::test]
async fn login_mints_a_token_bound_to_bank_and_user() {
    let coordinator = test_coordinator(vec![("bank_a", 100)]).await;
    let token = coordinator.login("bank_a", "user", "secret").await.unwrap();
    let subject = coordinator.verify_token(&token).unwrap();
    assert_eq!(subject.bank, "bank_a");
    assert_eq!(subject.username, "user");
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let coordinator = test_coordinator(vec![("bank_a", 100)]).await;
    let err = coordinator.login("bank_a", "user", "wrong").await.unwrap_err();
    assert!(matches!(err, DomainError::AuthFailed));
}

#[tokio::test]
async fn recover_sweeps_an_orphaned_in_flight_entry_to_aborted() {
    let coordinator = test_coordinator(vec![("bank_a", 100), ("bank_b", 0)]).await;
    let txid = TxId::generate();

    // Simulate a crash mid-prepare: an entry was durably logged as
    // `InFlight` but the process died before a decision was reached.
    let orphaned = CoordinatorEntry {
        txid,
        state: CoState::InFlight,
        src: Party {
            bank: "bank_a".to_string(),
            username: "user".to_string(),
        },
        dst: Party {
            bank: "bank_b".to_string(),
            username: "user".to_string(),
        },
        amount: 40,
        started_at: 0,
        decision: None,
    };
    coordinator.recover(vec![orphaned]).await;

    // A retry of the same txid must now see the crash-recovery sweep's
    // decision: aborted, with no balance ever having moved.
    let outcome = coordinator
        .transfer(&subject("bank_a"), txid, "bank_b".to_string(), "user".to_string(), 40)
        .await;
    match outcome {
        TransferOutcome::Aborted {
            reason: PrepareFailure::Unavailable,
        } => {}
        other => panic!("expected Aborted(Unavailable) after recovery, got {other:?}"),
    }
    assert_eq!(coordinator.balance(&subject("bank_a")).await.unwrap(), 100);
    assert_eq!(coordinator.balance(&subject("bank_b")).await.unwrap(), 0);
}
