//! CLI configuration for `gateway_bank` (section 6.4/6.6).

use std::path::PathBuf;

use clap::Parser;
use gateway_common::config::DEFAULT_REGISTRY_BIND_ADDRESS;

#[derive(Debug, Parser)]
#[command(name = "gateway_bank")]
pub struct Args {
    /// Bank name this participant serves, used as its registry entry
    /// (`bank/<name>`) and as the `bank` field of every token it accepts.
    #[arg(long)]
    pub name: String,

    /// Address to bind this bank's RPC listener to.
    #[arg(long, default_value = "127.0.0.1:9101")]
    pub bind: String,

    /// Service registry address.
    #[arg(long, default_value = DEFAULT_REGISTRY_BIND_ADDRESS)]
    pub registry: String,

    /// Read-only JSON credential bootstrap file, used only when
    /// `--state-file` does not already exist.
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Persisted ledger state, written on graceful shutdown.
    #[arg(long, default_value = "bank_state.json")]
    pub state_file: PathBuf,

    #[arg(long, default_value = "info")]
    pub log_level: log::LevelFilter,

    #[arg(long, default_value = "logs")]
    pub logs_path: PathBuf,

    #[arg(long)]
    pub disable_log_color: bool,

    /// Skip writing logs to disk, stdout only.
    #[arg(long)]
    pub disable_file_logging: bool,

    /// Per-module log level override, `MODULE=LEVEL`. Repeatable.
    #[arg(long = "log-module", value_name = "MODULE=LEVEL")]
    pub log_module: Vec<String>,

    /// JSON overlay for the protocol timing table (section 6): CLI flag
    /// overrides this file's value, which overrides the built-in
    /// default.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    #[arg(long)]
    pub hold_ttl_secs: Option<u64>,
}
