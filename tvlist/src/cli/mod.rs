use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;

mod convert;
mod merge;
mod publish;
mod rank;

pub use convert::ConvertCommand;
pub use merge::MergeCommand;
pub use publish::PublishCommand;
pub use rank::RankCommand;

#[derive(Parser, Debug)]
#[command(name = "tvlist")]
#[command(about = "Rank collected IPTV channel URLs and publish playlists")]
pub struct Args {
    /// Configuration file (defaults to config/config.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write log events to this file, truncated on every run
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge collection results, rank every channel and write all outputs
    Rank(RankCommand),
    /// Regenerate playlist and JSON outputs from the existing result file (default)
    Convert(ConvertCommand),
    /// Merge JSON documents without ranking
    Merge(MergeCommand),
    /// Commit generated files to the remote repository
    Publish(PublishCommand),
}

impl Args {
    pub async fn run(self) -> Result<()> {
        crate::logging::init(self.verbose, self.log_file.as_deref())?;
        let config = Config::load(self.config.as_deref())?;

        let command = self
            .command
            .unwrap_or(Command::Convert(ConvertCommand::default()));

        match command {
            Command::Rank(cmd) => cmd.run(&config).await,
            Command::Convert(cmd) => cmd.run(&config).await,
            Command::Merge(cmd) => cmd.run().await,
            Command::Publish(cmd) => cmd.run(&config).await,
        }
    }
}
