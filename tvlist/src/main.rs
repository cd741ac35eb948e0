use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod files;
mod logging;
mod output;
mod pipeline;
mod publish;
mod util;

#[tokio::main]
async fn main() -> Result<()> {
    cli::Args::parse().run().await
}
