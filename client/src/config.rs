//! CLI configuration for `gateway_client` (section 6.4/6.6). The client is
//! a one-shot, non-interactive process: it logs in, optionally submits a
//! single transfer, then waits for the offline queue to drain before
//! exiting.

use std::path::PathBuf;

use clap::Parser;
use gateway_common::config::DEFAULT_COORDINATOR_BIND_ADDRESS;

#[derive(Debug, Parser)]
#[command(name = "gateway_client")]
pub struct Args {
    /// Bank this user's account lives at.
    pub bank: String,

    pub username: String,

    pub password: String,

    /// Destination bank for an optional transfer submitted at startup.
    #[arg(long, requires_all = ["dst_user", "amount"])]
    pub dst_bank: Option<String>,

    #[arg(long)]
    pub dst_user: Option<String>,

    #[arg(long)]
    pub amount: Option<u64>,

    #[arg(long, default_value = DEFAULT_COORDINATOR_BIND_ADDRESS)]
    pub coordinator: String,

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
    pub offline_poll_ms: Option<u64>,
}
