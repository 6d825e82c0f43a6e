//! Property-based invariant tests for `Ledger`, grounded on the teacher's
//! own balance-conservation and non-negativity properties in
//! `daemon/tests/property_tests.rs`. `Ledger`'s methods are async, so each
//! property drives them from a single-threaded tokio runtime rather than
//! through `#[tokio::test]` (proptest's `#[test]` attribute owns the test
//! function signature).

use std::collections::HashMap;
use std::time::Duration;

use gateway_bank::ledger::Ledger;
use gateway_bank::storage::{BankState, PersistedUser};
use gateway_common::TxId;
use proptest::prelude::*;

fn single_account_ledger(balance: u64) -> Ledger {
    let mut users = HashMap::new();
    users.insert(
        "alice".to_string(),
        PersistedUser {
            password_hash: gateway_bank::auth::hash_password("secret"),
            balance,
            history: Vec::new(),
        },
    );
    Ledger::from_state(
        BankState {
            users,
            completed_txids: Vec::new(),
        },
        Duration::from_secs(10),
    )
}

proptest! {
    // A sequence of debit attempts never drives the account balance below
    // zero, and every debit that is accepted at prepare time is reflected
    // exactly once after commit - no double-spend, no silent loss.
    #[test]
    fn debits_never_overdraw_and_conserve_balance(
        initial_balance in 0u64..1_000_000u64,
        amounts in prop::collection::vec(0u64..10_000u64, 0..50),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ledger = single_account_ledger(initial_balance);
            let mut expected = initial_balance;

            for amount in amounts {
                let txid = TxId::generate();
                match ledger.prepare_debit(txid, "alice", amount).await {
                    Ok(()) => {
                        ledger
                            .commit_debit(txid, "alice", "bank_b", "bob")
                            .await
                            .expect("commit after successful prepare always succeeds");
                        expected -= amount;
                    }
                    Err(_) => {
                        // Rejected because it would have overdrawn the
                        // account - balance must be untouched.
                        prop_assert!(amount > expected);
                    }
                }
                prop_assert_eq!(ledger.balance("alice").await.unwrap(), expected);
            }
            Ok(())
        })
    }

    // Aborting a prepared debit is a no-op on balance, regardless of how
    // many times it is retried (section 4.2's "abort is always ok").
    #[test]
    fn aborted_debits_never_move_the_balance(
        initial_balance in 0u64..1_000_000u64,
        amount in 0u64..10_000u64,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ledger = single_account_ledger(initial_balance);
            let txid = TxId::generate();
            let _ = ledger.prepare_debit(txid, "alice", amount).await;
            ledger.abort_debit(txid, "alice").await;
            ledger.abort_debit(txid, "alice").await;
            prop_assert_eq!(ledger.balance("alice").await.unwrap(), initial_balance);
            Ok(())
        })
    }

    // A credit always increases the balance by exactly its amount once
    // committed, and by nothing if instead aborted.
    #[test]
    fn credits_add_exactly_once(
        initial_balance in 0u64..1_000_000u64,
        amount in 0u64..10_000u64,
        should_commit in any::<bool>(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let ledger = single_account_ledger(initial_balance);
            let txid = TxId::generate();
            ledger.prepare_credit(txid, "alice", amount).await.unwrap();

            if should_commit {
                ledger.commit_credit(txid, "alice", "bank_b", "bob").await.unwrap();
                prop_assert_eq!(
                    ledger.balance("alice").await.unwrap(),
                    initial_balance.saturating_add(amount)
                );
            } else {
                ledger.abort_credit(txid, "alice").await;
                prop_assert_eq!(ledger.balance("alice").await.unwrap(), initial_balance);
            }
            Ok(())
        })
    }
}
