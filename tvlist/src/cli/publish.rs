use anyhow::Result;
use clap::Parser;

use crate::config::Config;
use crate::output::Status;

#[derive(Parser, Debug)]
pub struct PublishCommand {}

impl PublishCommand {
    pub async fn run(self, config: &Config) -> Result<()> {
        let results = crate::publish::publish_all(config).await?;
        let committed = results
            .iter()
            .filter(|(_, status)| *status == Status::Produced)
            .count();
        println!("Published {}/{} files", committed, results.len());
        for (file_name, status) in &results {
            let mark = if *status == Status::Produced { "✅" } else { "❌" };
            println!("  {} {}", mark, file_name);
        }
        Ok(())
    }
}
