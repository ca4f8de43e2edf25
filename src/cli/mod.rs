pub mod app;
pub mod batch;
pub mod catalog;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod input;
pub mod output;
pub mod run;
pub mod runtime;

pub use batch::{cmd_batch, BatchArgs};
pub use catalog::{cmd_catalog, CatalogArgs};
pub use run::{cmd_run, RunArgs};
