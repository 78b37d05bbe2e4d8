//! Subscriber setup for the library's `tracing` events.
//!
//! The library itself only emits events:
//! - `pl_core::estimate`: one `debug` per cutoff search, `trace` per candidate
//! - `pl_core::bootstrap`: `debug` per run, `warn` per skipped simulation
//! - `pl_core::compare`: `debug` per comparison
//!
//! Binaries and tests that want to see them call [`init_logging`]. Output
//! goes to stderr, either human-readable or as JSON lines.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive for the crate's events at `level`.
pub fn default_directives(level: LogLevel) -> String {
    format!("pl_core={}", level)
}

/// Install a global subscriber. `RUST_LOG` directives win over `config.level`.
///
/// Returns `false` when a global subscriber was already installed, which
/// makes repeated calls harmless.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config.level)));

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(use_ansi);
            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
                    .is_ok()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
                    .is_ok()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
                .is_ok()
        }
    }
}

/// [`init_logging`] with settings from the environment.
pub fn init_default_logging() -> bool {
    init_logging(&LogConfig::from_env(None, None))
}
