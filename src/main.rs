use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    sharecode_cli::cli::app::run().await
}
