//! Structured logging setup using the `tracing` ecosystem.
//!
//! Configures a `tracing-subscriber` with either JSON output (for
//! production) or pretty-printed output (for TTY / local dev). Format
//! is auto-detected from the terminal but can be forced via `--json`
//! or `--pretty`.

use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::LogLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[must_use]
pub fn resolve_format(pretty: bool, json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else if pretty || std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

/// Filter for the given level. hyper and rustls internals stay at `warn`
/// unless tracing is explicitly requested.
#[must_use]
pub fn filter_for(level: &LogLevel) -> Targets {
    let tracing_level = level.to_tracing_level();
    let deps_level = if matches!(level, LogLevel::Trace) {
        tracing_level
    } else {
        tracing::Level::WARN.min(tracing_level)
    };

    Targets::new()
        .with_default(tracing_level)
        .with_target("hyper_util", deps_level)
        .with_target("rustls", deps_level)
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let filter = filter_for(level);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_wins() {
        assert_eq!(resolve_format(false, true), LogFormat::Json);
    }

    #[test]
    fn pretty_flag_forces_pretty() {
        assert_eq!(resolve_format(true, false), LogFormat::Pretty);
    }

    #[test]
    fn dependency_noise_is_capped() {
        let filter = filter_for(&LogLevel::Debug);
        assert!(filter.would_enable("cors_proxy", &tracing::Level::DEBUG));
        assert!(!filter.would_enable("hyper_util::client", &tracing::Level::DEBUG));
        assert!(filter.would_enable("hyper_util::client", &tracing::Level::WARN));
    }
}
