//! Diagnostic logging setup.
//!
//! The engine only emits `tracing` events; the sink (console, file, both)
//! is owned by the host. These helpers cover the common case of a host
//! that just wants a formatted stderr subscriber with an env-filter.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log severity levels understood by the engine's diagnostics.
///
/// `Critical` maps onto tracing's ERROR level with a `critical` field,
/// since tracing defines no level above error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// The `EnvFilter` directive this level corresponds to.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            other => Err(format!("invalid log level: {}", other)),
        }
    }
}

/// Install a formatted stderr subscriber, honoring `RUST_LOG` when set and
/// defaulting to `info` otherwise. Safe to call more than once; later calls
/// are no-ops.
pub fn init() {
    init_with_level(LogLevel::Info);
}

/// Like [`init`], with an explicit default level for when `RUST_LOG` is
/// not set.
pub fn init_with_level(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
