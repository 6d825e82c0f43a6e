//! CLI configuration for `gateway_coordinator` (section 6.4/6.6).

use std::path::PathBuf;

use clap::Parser;
use gateway_common::config::{DEFAULT_COORDINATOR_BIND_ADDRESS, DEFAULT_REGISTRY_BIND_ADDRESS};

#[derive(Debug, Parser)]
#[command(name = "gateway_coordinator")]
pub struct Args {
    #[arg(long, default_value = DEFAULT_COORDINATOR_BIND_ADDRESS)]
    pub bind: String,

    #[arg(long, default_value = DEFAULT_REGISTRY_BIND_ADDRESS)]
    pub registry: String,

    /// Durable log of every transaction decision, replayed at startup.
    #[arg(long, default_value = "coordinator_log.ndjson")]
    pub log_file: PathBuf,

    /// Signing key for bearer tokens. In production this would come from
    /// a secret store; here it is a CLI/config-file value like every
    /// other setting (section 6.4).
    #[arg(long, default_value = "gateway-dev-signing-key")]
    pub token_key: String,

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
    pub timeout_2pc_secs: Option<u64>,

    #[arg(long)]
    pub token_ttl_secs: Option<u64>,

    #[arg(long)]
    pub commit_retry_base_ms: Option<u64>,

    #[arg(long)]
    pub commit_retry_cap_secs: Option<u64>,
}
