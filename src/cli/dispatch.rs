use super::batch::cmd_batch;
use super::catalog::cmd_catalog;
use super::env::CliArgs;
use super::run::cmd_run;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, ctx).await,
        Commands::Batch(args) => cmd_batch(args, ctx).await,
        Commands::Catalog(args) => cmd_catalog(args, ctx),
    }
}
