use clap::Subcommand;

use super::batch::BatchArgs;
use super::catalog::CatalogArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Obtain one share code from command-line credentials or a profile
    Run(RunArgs),

    /// Obtain share codes for every profile in a file, a few at a time
    Batch(BatchArgs),

    /// List the recognised pages in detection order
    Catalog(CatalogArgs),
}
