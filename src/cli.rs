//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, health), and their associated argument structs.
//! Every `run` flag has an environment variable equivalent for container
//! deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{DEFAULT_MAX_BODY, DEFAULT_TIMEOUT_MS};

#[derive(Parser)]
#[command(
    name = "cors-proxy",
    version,
    about = "CORS-anonymizing HTTP reverse proxy",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        cors-proxy run                          Listen on 0.0.0.0:8080\n  \
        cors-proxy run -p 3000 --pretty         Local dev mode\n  \
        curl 'localhost:8080/?url=https://example.com'"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Run(Box<RunArgs>),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        cors-proxy run                                        Defaults\n  \
        cors-proxy run --public-url https://proxy.example.com  Behind a load balancer\n  \
        cors-proxy run --spoof-origin --timeout 10000         Same-origin presentation")]
pub struct RunArgs {
    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Public base URL clients use to reach this proxy (defaults to http://HOST:PORT)
    #[arg(long, env = "PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Present proxied requests as same-origin to the target (sets Origin/Referer)
    #[arg(long, env = "SPOOF_ORIGIN")]
    pub spoof_origin: bool,

    /// Icon served at /favicon.ico
    #[arg(long, env = "FAVICON_PATH", default_value = "favicon.ico")]
    pub favicon: PathBuf,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Observability --
    /// Sentry DSN (enables error tracking)
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_DSN", help_heading = "Observability")]
    pub sentry_dsn: Option<String>,

    /// Sentry environment tag
    #[cfg(feature = "sentry-integration")]
    #[arg(long, env = "SENTRY_ENVIRONMENT", help_heading = "Observability")]
    pub sentry_environment: Option<String>,

    // -- Tuning --
    /// Target timeout in milliseconds
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_TIMEOUT_MS,
        help_heading = "Tuning"
    )]
    pub timeout: u64,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = DEFAULT_MAX_BODY,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:8080")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["cors-proxy", "run"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.timeout, DEFAULT_TIMEOUT_MS);
        assert!(!args.spoof_origin);
        assert!(args.public_url.is_none());
    }

    #[test]
    fn pretty_and_json_conflict() {
        assert!(Cli::try_parse_from(["cors-proxy", "run", "--pretty", "--json"]).is_err());
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
