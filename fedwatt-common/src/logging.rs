//! Logging initialization
//!
//! Thin wrapper over `tracing-subscriber`: binaries pick a default level
//! (usually from their YAML config) and call [`init_logging`] once at
//! startup. `RUST_LOG` always wins, so a run can be re-traced with
//! per-crate directives without touching the config file.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Default verbosity of the fedwatt binaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Everything, including per-batch traces
    Trace,
    /// Per-round internals
    Debug,
    /// Round summaries and artifact paths
    #[default]
    Info,
    /// Problems the run survives
    Warn,
    /// Fatal problems only
    Error,
}

impl LogLevel {
    /// The filter directive equivalent of this level
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Installs the global tracing subscriber at the given default level.
///
/// Call once at binary startup. `RUST_LOG`, when set, replaces the
/// configured level entirely.
pub fn init_logging(level: LogLevel) {
    init_logging_with_filter(level.as_str());
}

/// Installs the global tracing subscriber from a filter directive
/// string, for per-crate control.
///
/// # Example
/// ```no_run
/// use fedwatt_common::logging::init_logging_with_filter;
///
/// // Round summaries everywhere, full detail in the training loop
/// init_logging_with_filter("info,fedwatt_fl=debug");
/// ```
pub fn init_logging_with_filter(directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
