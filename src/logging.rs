//! Logging setup for the command-line tool and library callers.
//!
//! Library code only emits `tracing` events; nothing is printed until a
//! subscriber is installed, e.g. with [`init_logging`].

use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log level, e.g. `DEBUG` or `WARNING`.
pub const LOG_LEVEL_ENV: &str = "GRIST_LOGLEVEL";

/// Install a stderr subscriber filtered by `GRIST_LOGLEVEL`, else `RUST_LOG`,
/// else `info`. Does nothing if a subscriber is already installed.
pub fn init_logging() {
    let filter = env_filter(std::env::var(LOG_LEVEL_ENV).ok());
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Build the filter from a `GRIST_LOGLEVEL` value, falling back to
/// `RUST_LOG` and then `info`.
pub fn env_filter(grist_level: Option<String>) -> EnvFilter {
    match grist_level.filter(|level| !level.trim().is_empty()) {
        Some(level) => EnvFilter::try_new(level_directive(&level))
            .unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

/// Map a level name to a filter directive. `warning`, `critical` and
/// `notset` are accepted as aliases.
pub fn level_directive(level: &str) -> String {
    let level = level.trim().to_lowercase();
    match level.as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "notset" => "trace".to_string(),
        _ => level,
    }
}
