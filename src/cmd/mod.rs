//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`init`], or [`validate`]. Each handler
//! lives in its own submodule.

pub mod init;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::HarvestError;

pub async fn dispatch(cli: Cli) -> Result<(), HarvestError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Validate(ref args)) => validate::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  infraharvest v{version} \u{2014} resilient dataset fetcher\n\n  \
         No command provided. To get started:\n\n    \
         infraharvest init                  Generate a starter job file\n    \
         infraharvest run                   Run every job (auto-detects ./infraharvest.yaml)\n    \
         infraharvest run -c jobs.yaml      Run with a specific job file\n    \
         infraharvest --help                See all commands and options\n"
    );
}
