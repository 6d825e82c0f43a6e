use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use gateway_bank::config::Args;
use gateway_bank::ledger::Ledger;
use gateway_bank::rpc::build_handler;
use gateway_bank::storage::{load_credentials, BankState};
use gateway_common::config::{check_hold_ttl_exceeds_timeout, resolve_secs, ProtocolConfig, HOLD_TTL, TIMEOUT2PC};
use gateway_common::logger::{self, parse_module_levels, LogConfig};
use gateway_common::registry_client::{HttpRegistryClient, ServiceRegistry};
use gateway_common::rpc::server::json_rpc;
use gateway_common::tokio_util::{self, Backoff};
use log::{error, info, warn};
use tokio::time::Duration;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&LogConfig {
        level: args.log_level,
        logs_path: args.logs_path.clone(),
        disable_colors: args.disable_log_color,
        filename_log: format!("{}.log", args.name),
        disable_file_logging: args.disable_file_logging,
        module_levels: parse_module_levels(&args.log_module)?,
    })?;

    let file_config = match &args.config_file {
        Some(path) => ProtocolConfig::load(path)?,
        None => ProtocolConfig::default(),
    };
    let hold_ttl = resolve_secs(args.hold_ttl_secs, file_config.hold_ttl_secs, HOLD_TTL);
    check_hold_ttl_exceeds_timeout(hold_ttl, TIMEOUT2PC)?;

    let state = match BankState::load(&args.state_file).await? {
        Some(state) => state,
        None => {
            info!(
                "no state file at {:?}, bootstrapping from {:?}",
                args.state_file, args.credentials
            );
            BankState::from(load_credentials(&args.credentials).await?)
        }
    };
    let ledger = Arc::new(Ledger::from_state(state, hold_ttl));

    let registry = HttpRegistryClient::new(args.registry.clone());
    register_with_retry(&registry, &args.name, &args.bind).await;

    tokio_util::spawn_task("hold-sweep", {
        let ledger = ledger.clone();
        let sweep_interval = ledger.sweep_interval();
        async move {
            let mut interval = tokio::time::interval(sweep_interval);
            loop {
                interval.tick().await;
                let swept = ledger.sweep_expired_holds().await;
                if swept > 0 {
                    info!("swept {swept} expired hold(s)");
                }
            }
        }
    });

    tokio_util::spawn_task("shutdown-handler", {
        let ledger = ledger.clone();
        let registry_addr = args.registry.clone();
        let name = args.name.clone();
        let state_file = args.state_file.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for ctrl-c: {e}");
                return;
            }
            info!("shutting down, persisting ledger state");
            let snapshot = ledger.snapshot().await;
            if let Err(e) = snapshot.save(&state_file).await {
                error!("failed to persist state: {e}");
            }
            let registry = HttpRegistryClient::new(registry_addr);
            if let Err(e) = registry.deregister(&format!("bank/{name}")).await {
                warn!("failed to deregister cleanly: {e}");
            }
            std::process::exit(0);
        }
    });

    let handler = web::Data::new(build_handler(ledger));
    info!("gateway_bank '{}' listening on {}", args.name, args.bind);
    HttpServer::new(move || {
        App::new()
            .app_data(handler.clone())
            .route("/json_rpc", web::post().to(json_rpc::<Arc<Ledger>>))
    })
    .bind(&args.bind)?
    .run()
    .await?;

    Ok(())
}

async fn register_with_retry(registry: &HttpRegistryClient, name: &str, bind: &str) {
    let entry = format!("bank/{name}");
    let mut backoff = Backoff::new(Duration::from_millis(200), Duration::from_secs(30));
    loop {
        match registry.register(&entry, bind).await {
            Ok(()) => {
                info!("registered '{entry}' with the service registry");
                return;
            }
            Err(e) => {
                let delay = backoff.next_delay();
                warn!("registry unreachable ({e}), retrying in {delay:?}");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
