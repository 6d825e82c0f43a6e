use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use gateway_common::config::{
    check_hold_ttl_exceeds_timeout, resolve_millis, resolve_secs, ProtocolConfig, COMMIT_RETRY_BASE,
    COMMIT_RETRY_CAP, HOLD_TTL, TIMEOUT2PC, TOKEN_TTL,
};
use gateway_common::logger::{self, parse_module_levels, LogConfig};
use gateway_common::registry_client::{HttpRegistryClient, ServiceRegistry};
use gateway_common::rpc::server::json_rpc;
use gateway_common::token::TokenIssuer;
use gateway_common::tokio_util::{self, Backoff};
use gateway_coordinator::config::Args;
use gateway_coordinator::durable_log::DurableLog;
use gateway_coordinator::participant::ParticipantDirectory;
use gateway_coordinator::registry::TransactionRegistry;
use gateway_coordinator::rpc::build_handler;
use gateway_coordinator::two_pc::Coordinator;
use log::{error, info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&LogConfig {
        level: args.log_level,
        logs_path: args.logs_path.clone(),
        disable_colors: args.disable_log_color,
        filename_log: "coordinator.log".to_string(),
        disable_file_logging: args.disable_file_logging,
        module_levels: parse_module_levels(&args.log_module)?,
    })?;

    let file_config = match &args.config_file {
        Some(path) => ProtocolConfig::load(path)?,
        None => ProtocolConfig::default(),
    };
    let timeout_2pc = resolve_secs(args.timeout_2pc_secs, file_config.timeout_2pc_secs, TIMEOUT2PC);
    let token_ttl = resolve_secs(args.token_ttl_secs, file_config.token_ttl_secs, TOKEN_TTL);
    let commit_retry_base = resolve_millis(
        args.commit_retry_base_ms,
        file_config.commit_retry_base_ms,
        COMMIT_RETRY_BASE,
    );
    let commit_retry_cap = resolve_secs(
        args.commit_retry_cap_secs,
        file_config.commit_retry_cap_secs,
        COMMIT_RETRY_CAP,
    );
    // The bank side of HOLD_TTL lives in a different process; this only
    // catches the common case where both sides are left at their
    // built-in defaults but TIMEOUT2PC was overridden here past HOLD_TTL.
    check_hold_ttl_exceeds_timeout(HOLD_TTL, timeout_2pc)?;

    let log = DurableLog::open(&args.log_file).await?;
    let recovered = DurableLog::replay(&args.log_file).await?;

    let registry: Arc<dyn ServiceRegistry> = Arc::new(HttpRegistryClient::new(args.registry.clone()));
    let participants = Arc::new(ParticipantDirectory::new(registry.clone()));

    let coordinator = Arc::new(Coordinator::new(
        TransactionRegistry::new(),
        log,
        participants,
        TokenIssuer::new(args.token_key.clone().into_bytes()),
        token_ttl,
        timeout_2pc,
        commit_retry_base,
        commit_retry_cap,
    ));

    info!("replaying {} durable log record(s)", recovered.len());
    coordinator.recover(recovered).await;

    register_with_retry(registry.as_ref(), &args.bind).await;

    tokio_util::spawn_task("shutdown-handler", {
        let registry = registry.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for ctrl-c: {e}");
                return;
            }
            info!("shutting down");
            if let Err(e) = registry.deregister("coordinator").await {
                warn!("failed to deregister cleanly: {e}");
            }
            std::process::exit(0);
        }
    });

    let handler = web::Data::new(build_handler(coordinator));
    info!("gateway_coordinator listening on {}", args.bind);
    HttpServer::new(move || {
        App::new()
            .app_data(handler.clone())
            .route("/json_rpc", web::post().to(json_rpc::<Arc<Coordinator>>))
    })
    .bind(&args.bind)?
    .run()
    .await?;

    Ok(())
}

async fn register_with_retry(registry: &dyn ServiceRegistry, bind: &str) {
    let mut backoff = Backoff::new(Duration::from_millis(200), Duration::from_secs(30));
    loop {
        match registry.register("coordinator", bind).await {
            Ok(()) => {
                info!("registered 'coordinator' with the service registry");
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
