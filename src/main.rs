use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod handlers;
mod helpers;
mod router;
mod schemas;

mod tests;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before the subscriber reads RUST_LOG
    dotenvy::dotenv().ok();
    model::init_tracing();

    let cli = Cli::parse();
    cli.run().await?;

    Ok(())
}
