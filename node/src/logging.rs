//! # Structured Logging
//!
//! One `tracing` subscriber per process, installed by the subcommands that
//! log (`run` and `init`). `commit`, `sign` and `version` never install it.
//!
//! Everything goes to stderr. stdout carries only command output (the
//! commitment from `commit`, the signed call from `sign`), so
//! `willvault-node sign ... | curl -d @- ...` works with logging enabled.
//!
//! The format comes from `--log-format` or `WILLVAULT_LOG_FORMAT`:
//!
//! - `pretty`: colored, with target and source location.
//! - `json`: one object per line. Event fields sit at the top level next to
//!   `timestamp`, `level`, `target` and `message`, so a confirmation logs as
//!   `{"level":"INFO","guardian":"0x..","confirmations":1,"needed":2,...}`.
//!
//! Filtering follows `RUST_LOG` when it is set and parses. Otherwise each
//! subcommand passes its own directives: `run` logs the node and vault at
//! `info` and request spans from `tower_http` at `debug`.

use std::fmt;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored multi-field lines for a terminal.
    Pretty,
    /// Flattened JSON lines for a log collector.
    Json,
}

impl LogFormat {
    /// Parse the `--log-format` value, case-insensitively. Anything other
    /// than `json` falls back to `Pretty` rather than aborting startup.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The filter in effect: `rust_log` if present and valid, else
/// `default_directives`.
///
/// A malformed `RUST_LOG` is not fatal; the defaults apply and the returned
/// message is logged once the subscriber is up.
fn resolve_filter(rust_log: Option<&str>, default_directives: &str) -> (EnvFilter, Option<String>) {
    match rust_log.map(EnvFilter::try_new) {
        Some(Ok(filter)) => (filter, None),
        Some(Err(e)) => (
            EnvFilter::new(default_directives),
            Some(format!("ignoring invalid {}: {}", EnvFilter::DEFAULT_ENV, e)),
        ),
        None => (EnvFilter::new(default_directives), None),
    }
}

/// Install the global subscriber, writing to stderr.
///
/// `default_directives` is an `EnvFilter` string such as
/// `"willvault_node=info,tower_http=debug"`. Must be called at most once
/// per process; a second call panics inside `tracing_subscriber`.
pub fn init_logging(default_directives: &str, format: LogFormat) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, filter_warning) = resolve_filter(rust_log.as_deref(), default_directives);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .init(),
    }

    if let Some(warning) = filter_warning {
        tracing::warn!("{}", warning);
    }
    tracing::debug!(%format, "logging initialized");
}
