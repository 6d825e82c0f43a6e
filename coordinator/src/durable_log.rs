//! The coordinator's durable log (section 4.1/6.3): an append-only
//! NDJSON file, one `CoordinatorEntry` per line, fsynced after every
//! write - single-writer discipline enforced by the `tokio::sync::Mutex`
//! guarding the file handle.

use std::collections::HashMap;
use std::path::Path;

use gateway_common::TxId;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::registry::CoordinatorEntry;

pub struct DurableLog {
    file: Mutex<File>,
}

impl DurableLog {
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append a record and fsync before returning - the decision must be
    /// durable before a `Transfer` RPC can answer the client (section
    /// 4.1 step 5).
    pub async fn append(&self, entry: &CoordinatorEntry) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Read every record in the log, keeping only the latest entry per
    /// `txid` (a txid may appear twice: once as `InFlight`, once
    /// terminal). Used once at startup before the RPC listener binds.
    pub async fn replay(path: &Path) -> anyhow::Result<Vec<CoordinatorEntry>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = tokio::fs::read_to_string(path).await?;
        let mut latest: HashMap<TxId, CoordinatorEntry> = HashMap::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: CoordinatorEntry = serde_json::from_str(line)?;
            latest.insert(entry.txid, entry);
        }
        Ok(latest.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CoState, Party};

    fn entry(txid: TxId, state: CoState) -> CoordinatorEntry {
        CoordinatorEntry {
            txid,
            state,
            src: Party {
                bank: "bank_a".to_string(),
                username: "alice".to_string(),
            },
            dst: Party {
                bank: "bank_b".to_string(),
                username: "bob".to_string(),
            },
            amount: 10,
            started_at: 0,
            decision: None,
        }
    }

    #[tokio::test]
    async fn replay_keeps_the_latest_record_per_txid() {
        let dir = tempdir();
        let path = dir.join("log.ndjson");
        let log = DurableLog::open(&path).await.unwrap();
        let txid = TxId::generate();
        log.append(&entry(txid, CoState::InFlight)).await.unwrap();
        log.append(&entry(txid, CoState::Committed)).await.unwrap();

        let replayed = DurableLog::replay(&path).await.unwrap();
        assert_eq!(replayed.len(), 1);
        assert_eq!(replayed[0].state, CoState::Committed);
    }

    #[tokio::test]
    async fn replay_of_missing_file_is_empty() {
        let dir = tempdir();
        let path = dir.join("missing.ndjson");
        let replayed = DurableLog::replay(&path).await.unwrap();
        assert!(replayed.is_empty());
    }

    fn tempdir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("gateway-log-test-{}", TxId::generate()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
