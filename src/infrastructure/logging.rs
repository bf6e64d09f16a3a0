//! Logging system configuration and initialization
//!
//! - Console output on stderr, so command output on stdout stays clean
//! - Optional file output with rotation (daily / hourly / never)
//! - Optional structured JSON format
//! - Local timezone timestamps

#![allow(clippy::uninlined_format_args)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::Local;
use once_cell::sync::Lazy;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

pub use crate::infrastructure::config::LoggingConfig;

/// Keeps the non-blocking file writers alive for the process lifetime
static LOG_GUARDS: Lazy<Mutex<Vec<WorkerGuard>>> = Lazy::new(|| Mutex::new(Vec::new()));

struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Configured directory, else `<data_local_dir>/smartmarket/logs`, else
/// `logs/` next to the executable
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    if let Some(dir) = config.log_dir.as_deref().filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("smartmarket").join("logs");
    }
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_default()
        .join("logs")
}

/// Filter directives for a config. Chatty dependencies are clamped unless
/// the level is `trace`.
pub fn filter_directives(config: &LoggingConfig) -> Vec<String> {
    let level = config.level.trim().to_lowercase();
    let mut directives = vec![level.clone()];

    if !level.contains("trace") {
        let mut modules: Vec<_> = config.module_filters.iter().collect();
        modules.sort();
        directives.extend(modules.into_iter().map(|(target, lvl)| format!("{target}={lvl}")));
    }

    directives.push(format!("smartmarket_client_lib={level}"));
    directives.push(format!("smartmarket={level}"));
    directives
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::new("");
    for directive in filter_directives(config) {
        let parsed = directive
            .parse()
            .map_err(|e| anyhow!("Invalid log directive '{}': {}", directive, e))?;
        filter = filter.add_directive(parsed);
    }
    Ok(filter)
}

fn file_layer(config: &LoggingConfig, log_dir: &Path) -> Result<BoxedLayer> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

    let appender = match config.rotation.as_str() {
        "hourly" => rolling::hourly(log_dir, &config.file_name),
        "never" => rolling::never(log_dir, &config.file_name),
        _ => rolling::daily(log_dir, &config.file_name),
    };
    let (writer, guard) = non_blocking(appender);
    LOG_GUARDS
        .lock()
        .map_err(|_| anyhow!("log guard registry poisoned"))?
        .push(guard);

    let layer = if config.json_format {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_timer(LocalTimeFormatter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
            .with_ansi(false)
            .boxed()
    };
    Ok(layer)
}

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    if config.json_format {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimeFormatter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
            .boxed()
    }
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let log_dir = get_log_directory(config);

    if config.file_output {
        layers.push(file_layer(config, &log_dir)?);
    }
    if config.console_output {
        layers.push(console_layer(config));
    }
    if layers.is_empty() {
        return Err(anyhow!("No logging output configured"));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(build_env_filter(config)?)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    debug!("Logging system initialized (level: {})", config.level);
    if config.file_output {
        info!("📝 Writing logs to {:?}", log_dir.join(&config.file_name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn dependencies_are_clamped_below_trace() {
        let config = LoggingConfig {
            level: "debug".into(),
            module_filters: HashMap::from([("reqwest".into(), "warn".into())]),
            ..Default::default()
        };
        let directives = filter_directives(&config);
        assert_eq!(directives[0], "debug");
        assert!(directives.contains(&"reqwest=warn".to_string()));
        assert!(directives.contains(&"smartmarket_client_lib=debug".to_string()));
    }

    #[test]
    fn trace_shows_everything() {
        let config = LoggingConfig {
            level: "TRACE".into(),
            ..Default::default()
        };
        assert!(filter_directives(&config).iter().all(|d| !d.starts_with("reqwest")));
    }

    #[test]
    fn configured_log_dir_wins() {
        let config = LoggingConfig {
            log_dir: Some("/tmp/smartmarket-logs".into()),
            ..Default::default()
        };
        assert_eq!(get_log_directory(&config), PathBuf::from("/tmp/smartmarket-logs"));
        assert!(get_log_directory(&LoggingConfig::default()).ends_with("logs"));
    }

    #[test]
    fn all_directives_parse() {
        assert!(build_env_filter(&LoggingConfig::default()).is_ok());
    }
}
