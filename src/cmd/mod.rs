//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`] or [`health`]. Each handler lives in its
//! own submodule.

pub mod health;
pub mod run;

use crate::cli::{Cli, Commands};
use crate::error::CorsProxyError;

pub async fn dispatch(cli: Cli) -> Result<(), CorsProxyError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  cors-proxy v{version} \u{2014} CORS-anonymizing HTTP reverse proxy\n\n  \
         No command provided. To get started:\n\n    \
         cors-proxy run                              Start on 0.0.0.0:8080\n    \
         cors-proxy run --public-url <URL>           Set the URL redirects loop back to\n    \
         cors-proxy health                           Check a running instance\n    \
         cors-proxy --help                           See all commands and options\n"
    );
}
