//! Offline transfer queue (section 4.3): a transfer request allocated a
//! `txid` at submission time survives a disconnected coordinator and is
//! retried, in order, once connectivity returns. Shape grounded on the
//! teacher's `NetworkHandler`, which owns a queue of outbound messages and
//! a background task that drains it against a connection that may not be
//! up yet.

use std::collections::VecDeque;

use gateway_common::TxId;
use tokio::sync::Mutex;

/// One transfer waiting to be sent to the coordinator.
#[derive(Debug, Clone)]
pub struct QueuedTransfer {
    pub txid: TxId,
    pub dst_bank: String,
    pub dst_user: String,
    pub amount: u64,
    /// Number of send attempts made so far, for logging only - the queue
    /// itself retries forever until the coordinator answers definitively.
    pub attempts: u32,
}

impl QueuedTransfer {
    pub fn new(txid: TxId, dst_bank: String, dst_user: String, amount: u64) -> Self {
        Self {
            txid,
            dst_bank,
            dst_user,
            amount,
            attempts: 0,
        }
    }
}

/// FIFO queue of transfers awaiting submission, drained strictly in order
/// so two transfers from the same client never race each other at the
/// coordinator.
#[derive(Default)]
pub struct OfflineQueue {
    entries: Mutex<VecDeque<QueuedTransfer>>,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, transfer: QueuedTransfer) {
        self.entries.lock().await.push_back(transfer);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Look at the head of the queue without removing it.
    pub async fn peek_front(&self) -> Option<QueuedTransfer> {
        self.entries.lock().await.front().cloned()
    }

    /// Remove the head of the queue; called once it has been durably
    /// resolved (committed, aborted, or confirmed duplicate).
    pub async fn pop_front(&self) {
        self.entries.lock().await.pop_front();
    }

    /// Record a failed send attempt on the head entry, leaving it in
    /// place for the next retry.
    pub async fn bump_attempts(&self) {
        if let Some(front) = self.entries.lock().await.front_mut() {
            front.attempts += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(amount: u64) -> QueuedTransfer {
        QueuedTransfer::new(TxId::generate(), "bank_b".to_string(), "bob".to_string(), amount)
    }

    #[tokio::test]
    async fn drains_in_fifo_order() {
        let queue = OfflineQueue::new();
        queue.push(sample(10)).await;
        queue.push(sample(20)).await;

        assert_eq!(queue.len().await, 2);
        let first = queue.peek_front().await.unwrap();
        assert_eq!(first.amount, 10);
        queue.pop_front().await;
        let second = queue.peek_front().await.unwrap();
        assert_eq!(second.amount, 20);
        queue.pop_front().await;
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn bump_attempts_only_touches_the_head() {
        let queue = OfflineQueue::new();
        queue.push(sample(10)).await;
        queue.push(sample(20)).await;
        queue.bump_attempts().await;
        queue.bump_attempts().await;

        let head = queue.peek_front().await.unwrap();
        assert_eq!(head.attempts, 2);
    }
}
