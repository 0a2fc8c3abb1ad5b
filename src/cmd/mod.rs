//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`] or [`validate`]. Each handler lives in
//! its own submodule.

pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::HookfanError;

pub async fn dispatch(cli: Cli) -> Result<(), HookfanError> {
    match cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Validate(ref args) => validate::execute(args),
    }
}
