//! Integration coverage for the offline-queue worker (section 4.3):
//! drives `spawn_queue_worker` through an offline -> online transition
//! against a tiny in-process JSON-RPC stub standing in for the
//! coordinator - no mocking framework, just an `actix-web` handler the
//! same way `coordinator/tests/two_pc.rs` stands in for a bank with a
//! plain struct.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use gateway_client::queue::{OfflineQueue, QueuedTransfer};
use gateway_client::session::Session;
use gateway_client::worker::{spawn_queue_worker, TransferEvent};
use gateway_common::TxId;
use serde_json::{json, Value};

async fn json_rpc_stub(body: web::Json<Value>) -> web::Json<Value> {
    let id = body.get("id").cloned().unwrap_or(Value::Null);
    let method = body.get("method").and_then(Value::as_str).unwrap_or("");
    let result = match method {
        "login" => json!({"token": "test-token"}),
        "ping" => json!({"ok": true}),
        "transfer" => json!("Committed"),
        _ => json!(null),
    };
    web::Json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

#[tokio::test]
async fn worker_drains_queue_once_coordinator_comes_online() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let endpoint = format!("http://{addr}/json_rpc");
    let session = Arc::new(Session::new(
        endpoint,
        "bank_a".to_string(),
        "alice".to_string(),
        "secret".to_string(),
    ));
    let queue = Arc::new(OfflineQueue::new());
    let txid = TxId::generate();
    queue
        .push(QueuedTransfer::new(txid, "bank_b".to_string(), "bob".to_string(), 10))
        .await;

    let (tx, mut rx) = tokio::sync::broadcast::channel(16);
    spawn_queue_worker(session, queue.clone(), tx, Duration::from_millis(20));

    // Nothing is listening yet - the worker must report StillOffline and
    // leave the transfer queued rather than drop it.
    tokio::time::timeout(Duration::from_millis(500), async {
        loop {
            if let TransferEvent::StillOffline = rx.recv().await.unwrap() {
                break;
            }
        }
    })
    .await
    .expect("expected at least one StillOffline event while nothing is listening");
    assert!(!queue.is_empty().await, "transfer must stay queued while offline");

    // Bring the coordinator "online".
    let server = HttpServer::new(|| App::new().route("/json_rpc", web::post().to(json_rpc_stub)))
        .bind(addr)
        .unwrap()
        .run();
    let server_handle = tokio::spawn(server);

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let TransferEvent::Committed { txid: committed } = rx.recv().await.unwrap() {
                assert_eq!(committed, txid);
                break;
            }
        }
    })
    .await
    .expect("expected the queued transfer to commit once the coordinator came online");

    assert!(queue.is_empty().await, "committed transfer must be popped from the queue");
    server_handle.abort();
}
