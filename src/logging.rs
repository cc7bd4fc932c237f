//! Logging initialization for elevan.
//!
//! TUI mode: logs to `{state}/logs/elevan-{datetime}.log`
//! CLI mode: logs to stderr

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Result of logging initialization
pub struct LoggingHandle {
    /// Flushes buffered log lines when dropped; keep alive for the whole run.
    pub _guard: Option<WorkerGuard>,

    /// Path to the log file (only set in TUI mode with file logging enabled)
    pub log_file_path: Option<PathBuf>,
}

/// Level directive used when `RUST_LOG` is not set
fn level_directive(config: &Config, debug_override: bool) -> String {
    if debug_override {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    }
}

/// Log file name for a session started at `started`
fn log_file_name(started: DateTime<Utc>) -> String {
    format!("elevan-{}.log", started.format("%Y%m%dT%H%M%SZ"))
}

/// Whether this run should write to a log file instead of stderr.
///
/// The TUI owns the terminal, so anything on stderr would corrupt the screen.
fn writes_to_file(config: &Config, is_tui_mode: bool) -> bool {
    is_tui_mode && config.logging.to_file
}

/// Initialize logging based on mode and configuration.
///
/// `debug_override` comes from the `--debug` flag. `RUST_LOG` wins over both.
pub fn init_logging(
    config: &Config,
    is_tui_mode: bool,
    debug_override: bool,
) -> Result<LoggingHandle> {
    let level = level_directive(config, debug_override);
    let filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or(level));

    // Exactly one of the two layers is present
    let (file_layer, guard, log_file_path) = if writes_to_file(config, is_tui_mode) {
        let logs_dir = config.logs_path();
        std::fs::create_dir_all(&logs_dir)?;
        let log_filename = log_file_name(Utc::now());

        let appender = tracing_appender::rolling::never(&logs_dir, &log_filename);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard), Some(logs_dir.join(log_filename)))
    } else {
        (None, None, None)
    };

    let stderr_layer = file_layer.is_none().then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(LoggingHandle {
        _guard: guard,
        log_file_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.state = temp_dir.path().to_string_lossy().to_string();
        config
    }

    #[test]
    fn test_logs_path_inside_state_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let logs_dir = config.logs_path();
        assert!(logs_dir.ends_with("logs"));
        assert!(logs_dir.starts_with(temp_dir.path()));
    }

    #[test]
    fn test_log_file_name_uses_utc_timestamp() {
        let started = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(log_file_name(started), "elevan-20240309T140507Z.log");
    }

    #[test]
    fn test_debug_flag_overrides_configured_level() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.logging.level = "warn".to_string();

        assert_eq!(level_directive(&config, false), "warn");
        assert_eq!(level_directive(&config, true), "debug");
    }

    #[test]
    fn test_only_tui_mode_writes_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);

        assert!(writes_to_file(&config, true));
        assert!(!writes_to_file(&config, false));

        config.logging.to_file = false;
        assert!(!writes_to_file(&config, true));
    }
}
