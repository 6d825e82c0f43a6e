use std::path::PathBuf;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use gateway_common::config::DEFAULT_REGISTRY_BIND_ADDRESS;
use gateway_common::logger::{self, LogConfig};
use gateway_registry::{deregister, health, lookup, register, Registry};
use log::info;

/// Minimal service registry for the payment gateway.
#[derive(Debug, Parser)]
#[command(name = "gateway_registry")]
struct Args {
    /// Address to bind the registry's HTTP listener to.
    #[arg(long, default_value = DEFAULT_REGISTRY_BIND_ADDRESS)]
    bind: String,

    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,

    #[arg(long, default_value = "logs")]
    logs_path: PathBuf,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&LogConfig {
        level: args.log_level,
        logs_path: args.logs_path,
        ..Default::default()
    })?;

    info!("Starting service registry on {}", args.bind);

    let registry = web::Data::new(Registry::new());
    HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .route("/register", web::post().to(register))
            .route("/deregister", web::post().to(deregister))
            .route("/lookup/{name}", web::get().to(lookup))
            .route("/health/{name}", web::get().to(health))
    })
    .bind(&args.bind)?
    .run()
    .await?;

    Ok(())
}
