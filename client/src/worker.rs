//! Background drain loop for the offline queue (section 4.3): while the
//! coordinator is unreachable, transfers pile up in `OfflineQueue`; once
//! it answers pings again they are replayed strictly in order. Shape
//! grounded on the teacher's `NetworkHandler` background task, which
//! polls a connection and drains a queue of outbound messages once it's
//! up.

use std::sync::Arc;
use std::time::Duration;

use gateway_common::api::coordinator::TransferOutcome;
use gateway_common::tokio_util::{spawn_task, Backoff};
use log::{info, warn};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::queue::OfflineQueue;
use crate::session::{Session, SessionError};

/// One terminal or informational event about a queued transfer, emitted
/// for the CLI (or any other caller) to report to the user.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    Committed { txid: gateway_common::TxId },
    Aborted { txid: gateway_common::TxId, reason: String },
    Duplicate { txid: gateway_common::TxId, state: gateway_common::TxState },
    StillOffline,
    /// The coordinator rejected our token outright (not just expired -
    /// e.g. it restarted with a new signing key). The worker has stopped;
    /// the caller must re-run `Session::login` and call
    /// `spawn_queue_worker` again against the same queue (section 4.3).
    ReauthRequired,
}

/// Spawn the queue worker. Polls the coordinator with `ping` while the
/// queue is empty or the last send attempt failed, and drains the queue
/// strictly in FIFO order once it is reachable.
pub fn spawn_queue_worker(
    session: Arc<Session>,
    queue: Arc<OfflineQueue>,
    events: broadcast::Sender<TransferEvent>,
    offline_poll: Duration,
) -> JoinHandle<()> {
    spawn_task("offline-queue-worker", async move {
        let mut backoff = Backoff::new(offline_poll, Duration::from_secs(10));
        loop {
            let Some(front) = queue.peek_front().await else {
                tokio::time::sleep(offline_poll).await;
                continue;
            };

            if !session.ping().await {
                let _ = events.send(TransferEvent::StillOffline);
                tokio::time::sleep(backoff.next_delay()).await;
                continue;
            }
            backoff = Backoff::new(offline_poll, Duration::from_secs(10));

            match session
                .transfer(front.txid, front.dst_bank.clone(), front.dst_user.clone(), front.amount)
                .await
            {
                Ok(TransferOutcome::Committed) => {
                    info!("txid {} committed", front.txid);
                    let _ = events.send(TransferEvent::Committed { txid: front.txid });
                    queue.pop_front().await;
                }
                Ok(TransferOutcome::Aborted { reason }) => {
                    warn!("txid {} aborted: {reason}", front.txid);
                    let _ = events.send(TransferEvent::Aborted {
                        txid: front.txid,
                        reason: reason.to_string(),
                    });
                    queue.pop_front().await;
                }
                Ok(TransferOutcome::Duplicate(state)) => {
                    let _ = events.send(TransferEvent::Duplicate { txid: front.txid, state });
                    match state {
                        gateway_common::TxState::Committed | gateway_common::TxState::Aborted => {
                            queue.pop_front().await;
                        }
                        gateway_common::TxState::InFlight | gateway_common::TxState::Prepared => {
                            // Still being decided elsewhere - leave it queued
                            // and try again later (section 4.1 rule 2).
                            tokio::time::sleep(backoff.next_delay()).await;
                        }
                    }
                }
                Err(SessionError::Unavailable(e)) => {
                    warn!("coordinator dropped mid-send for txid {}: {e}", front.txid);
                    queue.bump_attempts().await;
                    tokio::time::sleep(backoff.next_delay()).await;
                }
                Err(SessionError::Unauthorized) => {
                    warn!("coordinator rejected our token, pausing drain until re-login");
                    let _ = events.send(TransferEvent::ReauthRequired);
                    return;
                }
                Err(SessionError::Domain(e)) => {
                    warn!("txid {} rejected: {e}", front.txid);
                    queue.bump_attempts().await;
                    tokio::time::sleep(backoff.next_delay()).await;
                }
            }
        }
    })
}
