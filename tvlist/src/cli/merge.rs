use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::files::write_file;
use crate::output::to_json_pretty;
use crate::pipeline::load_documents;

#[derive(Parser, Debug)]
pub struct MergeCommand {
    /// JSON documents to merge, left to right
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl MergeCommand {
    pub async fn run(self) -> Result<()> {
        let merged = load_documents(&self.inputs)?;
        let json: serde_json::Value = tvlist_core::Value::Map(merged).into();
        let text = to_json_pretty(&json)?;

        match &self.output {
            Some(path) => {
                write_file(path, &text)?;
                println!("✅ Merged {} inputs into {}", self.inputs.len(), path.display());
            }
            None => println!("{text}"),
        }
        Ok(())
    }
}
