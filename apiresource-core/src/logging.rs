//! Logging setup.
//!
//! The pipeline emits `tracing` events: the effective relations of each
//! `prepare`, skipped eager loads, callback application, dropped malformed
//! request names and relations omitted because they were not granted.
//! Nothing is printed unless a subscriber is installed, either by the
//! application or by [`init`] with the `tracing-subscriber` feature.
//!
//! # Environment Variables
//!
//! - `APIRESOURCE_DEBUG=true|1|yes` - Enable debug logging
//! - `APIRESOURCE_LOG_LEVEL=trace|debug|info|warn|error` - Set the level
//! - `APIRESOURCE_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use apiresource_core::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "APIRESOURCE_DEBUG";
const LEVEL_VAR: &str = "APIRESOURCE_LOG_LEVEL";
const FORMAT_VAR: &str = "APIRESOURCE_LOG_FORMAT";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    /// Parse a format name, falling back to JSON.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }

    /// The format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Whether `APIRESOURCE_DEBUG` enables debug logging.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The configured level: `APIRESOURCE_LOG_LEVEL` when valid, else `debug`
/// in debug mode and `warn` otherwise.
pub fn log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    let Ok(level) = env::var(LEVEL_VAR) else {
        return fallback;
    };
    match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" => "error",
        _ => fallback,
    }
}

/// The configured output format.
pub fn log_format() -> LogFormat {
    env::var(FORMAT_VAR)
        .map(|f| LogFormat::parse(&f))
        .unwrap_or(LogFormat::Json)
}

/// Install a subscriber according to the environment.
///
/// Runs at most once per process, and only when debug mode or a level is
/// configured. Without the `tracing-subscriber` feature this does nothing.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = log_level();
            let filter = EnvFilter::try_new(format!("apiresource={level},apiresource_core={level}"))
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            let format = log_format();
            match format {
                LogFormat::Json => registry.with(fmt::layer().json()).init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
            }

            tracing::info!(level, format = format.as_str(), "apiresource logging initialized");
        }
    });
}

/// Set `APIRESOURCE_LOG_LEVEL` and call [`init`].
///
/// # Safety
///
/// Modifies the process environment; call at startup before spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: documented as a startup-only call.
    unsafe {
        env::set_var(LEVEL_VAR, level);
    }
    init();
}

/// Set `APIRESOURCE_DEBUG=true` and call [`init`].
///
/// # Safety
///
/// Modifies the process environment; call at startup before spawning threads.
pub fn init_debug() {
    // SAFETY: documented as a startup-only call.
    unsafe {
        env::set_var(DEBUG_VAR, "true");
    }
    init();
}
