use std::sync::Arc;

use clap::Parser;
use gateway_client::config::Args;
use gateway_client::queue::{OfflineQueue, QueuedTransfer};
use gateway_client::session::Session;
use gateway_client::worker::{spawn_queue_worker, TransferEvent};
use gateway_common::config::{resolve_millis, ProtocolConfig, OFFLINE_POLL};
use gateway_common::logger::{self, parse_module_levels, LogConfig};
use gateway_common::TxId;
use log::{info, warn};
use std::time::Duration;

/// Non-interactive entry point: `gateway_client <bank> <user> <password>
/// [--dst-bank B --dst-user U --amount N]`. With no transfer requested it
/// just reports the account balance and history; with one requested it
/// enqueues it, waits for the offline queue to drain (submitting
/// immediately if the coordinator is already reachable), then exits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&LogConfig {
        level: args.log_level,
        logs_path: args.logs_path.clone(),
        disable_colors: args.disable_log_color,
        filename_log: "client.log".to_string(),
        disable_file_logging: args.disable_file_logging,
        module_levels: parse_module_levels(&args.log_module)?,
    })?;

    let file_config = match &args.config_file {
        Some(path) => ProtocolConfig::load(path)?,
        None => ProtocolConfig::default(),
    };
    let offline_poll = resolve_millis(args.offline_poll_ms, file_config.offline_poll_ms, OFFLINE_POLL);

    let endpoint = format!("http://{}/json_rpc", args.coordinator);
    let session = Arc::new(Session::new(endpoint, args.bank.clone(), args.username.clone(), args.password.clone()));

    match (args.dst_bank, args.dst_user, args.amount) {
        (Some(dst_bank), Some(dst_user), Some(amount)) => {
            run_transfer(session, dst_bank, dst_user, amount, offline_poll).await
        }
        _ => run_status(session).await,
    }
}

async fn run_status(session: Arc<Session>) -> anyhow::Result<()> {
    session.login().await?;
    let balance = session.balance().await?;
    println!("balance: {balance}");
    for record in session.history().await? {
        println!(
            "{:?} {} {} {} (txid {})",
            record.direction, record.amount, record.counterparty_bank, record.counterparty_user, record.txid
        );
    }
    Ok(())
}

async fn run_transfer(
    session: Arc<Session>,
    dst_bank: String,
    dst_user: String,
    amount: u64,
    offline_poll: Duration,
) -> anyhow::Result<()> {
    let queue = Arc::new(OfflineQueue::new());
    let txid = TxId::generate();
    queue
        .push(QueuedTransfer::new(txid, dst_bank, dst_user, amount))
        .await;
    info!("queued transfer {txid}");

    let (tx, mut rx) = tokio::sync::broadcast::channel(16);
    spawn_queue_worker(session.clone(), queue.clone(), tx.clone(), offline_poll);

    loop {
        if queue.is_empty().await {
            return Ok(());
        }
        match rx.recv().await {
            Ok(TransferEvent::Committed { txid }) => println!("txid {txid}: committed"),
            Ok(TransferEvent::Aborted { txid, reason }) => println!("txid {txid}: aborted ({reason})"),
            Ok(TransferEvent::Duplicate { txid, state }) => {
                println!("txid {txid}: already {state:?}")
            }
            Ok(TransferEvent::StillOffline) => {
                warn!("coordinator unreachable, transfer {txid} queued");
            }
            Ok(TransferEvent::ReauthRequired) => {
                warn!("coordinator rejected our token, re-authenticating");
                session.login().await?;
                spawn_queue_worker(session.clone(), queue.clone(), tx.clone(), offline_poll);
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}
