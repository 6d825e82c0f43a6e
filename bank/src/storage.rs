//! Persisted bank state (section 6.3): written as pretty JSON on graceful
//! shutdown, loaded at startup; if absent, accounts are bootstrapped from
//! a read-only credential file instead.

use std::collections::HashMap;
use std::path::Path;

use gateway_common::model::TransactionRecord;
use gateway_common::TxId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedUser {
    pub password_hash: String,
    pub balance: u64,
    #[serde(default)]
    pub history: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankState {
    pub users: HashMap<String, PersistedUser>,
    #[serde(default)]
    pub completed_txids: Vec<TxId>,
}

impl BankState {
    pub async fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, raw).await?;
        Ok(())
    }
}

/// Bootstrap entry in the read-only credential file (section 6.3):
/// `{username: {password_hash, balance}}`. Never rewritten - a bank
/// rebuilt from this file starts with an empty transaction history and
/// no completed txids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub password_hash: String,
    pub balance: u64,
}

pub async fn load_credentials(path: &Path) -> anyhow::Result<HashMap<String, CredentialEntry>> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

impl From<HashMap<String, CredentialEntry>> for BankState {
    fn from(credentials: HashMap<String, CredentialEntry>) -> Self {
        let users = credentials
            .into_iter()
            .map(|(username, entry)| {
                (
                    username,
                    PersistedUser {
                        password_hash: entry.password_hash,
                        balance: entry.balance,
                        history: Vec::new(),
                    },
                )
            })
            .collect();
        BankState {
            users,
            completed_txids: Vec::new(),
        }
    }
}
