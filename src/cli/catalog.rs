use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::context::CliContext;
use super::output;

#[derive(Args, Clone, Debug)]
pub struct CatalogArgs {}

#[derive(Serialize)]
struct CatalogEntry {
    order: usize,
    id: &'static str,
}

pub fn cmd_catalog(_args: CatalogArgs, ctx: &CliContext) -> Result<()> {
    let engine = ctx.engine()?;
    let entries: Vec<CatalogEntry> = engine
        .catalog()
        .ids()
        .into_iter()
        .enumerate()
        .map(|(index, id)| CatalogEntry {
            order: index + 1,
            id,
        })
        .collect();
    output::print(ctx.output(), &entries, |entries| {
        entries
            .iter()
            .map(|e| format!("{:>2}. {}", e.order, e.id))
            .collect::<Vec<_>>()
            .join("\n")
    })
}
