//! Logging setup shared by every binary. Grounded on the teacher's
//! `fern`-backed prompt configuration, stripped of the interactive-menu
//! machinery this gateway doesn't need: just a colored stdout sink plus an
//! optional date-rotated file sink.

use std::path::PathBuf;

use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// Logging configuration, parsed from CLI flags shared by every binary
/// (section 6.5 of the specification).
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub logs_path: PathBuf,
    pub filename_log: String,
    pub disable_file_logging: bool,
    pub disable_colors: bool,
    /// Per-module level overrides, e.g. `gateway_common::rpc=debug`.
    pub module_levels: Vec<(String, LevelFilter)>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            logs_path: PathBuf::from("logs"),
            filename_log: "gateway.log".to_string(),
            disable_file_logging: true,
            disable_colors: false,
            module_levels: Vec::new(),
        }
    }
}

/// Parse `--log-module` flags of the form `module=level`, e.g.
/// `gateway_common::rpc=debug`.
pub fn parse_module_levels(raw: &[String]) -> anyhow::Result<Vec<(String, LevelFilter)>> {
    raw.iter()
        .map(|entry| {
            let (module, level) = entry.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("invalid --log-module '{entry}', expected MODULE=LEVEL")
            })?;
            let level: LevelFilter = level
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid log level '{level}' in --log-module '{entry}'"))?;
            Ok((module.to_string(), level))
        })
        .collect()
}

/// Install the global logger. Must be called once, as early as possible in
/// `main`.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let disable_colors = config.disable_colors;

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            let level = if disable_colors {
                record.level().to_string()
            } else {
                colors.color(record.level()).to_string()
            };
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                level,
                record.target(),
                message
            ))
        })
        .level(config.level)
        .chain(std::io::stdout());

    for (module, level) in &config.module_levels {
        dispatch = dispatch.level_for(module.clone(), *level);
    }

    if !config.disable_file_logging {
        std::fs::create_dir_all(&config.logs_path)?;
        let path = config.logs_path.join(&config.filename_log);
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}
