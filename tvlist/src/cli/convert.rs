use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::config::Config;
use crate::output::{Status, jellyfin, m3u, toptvbox, tvbox};

#[derive(Parser, Debug, Default)]
pub struct ConvertCommand {
    /// Result file to convert (defaults to final_file from the config)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

impl ConvertCommand {
    pub async fn run(self, config: &Config) -> Result<()> {
        let result_path = self.input.unwrap_or_else(|| config.final_file.clone());
        convert_all(config, &result_path)?;
        Ok(())
    }
}

/**
    Run every converter enabled in the configuration against `result_path`.

    Returns the status of each converter in run order.
*/
pub fn convert_all(config: &Config, result_path: &Path) -> Result<Vec<(&'static str, Status)>> {
    let mut results = Vec::new();

    if config.open_m3u_result {
        let m3u_path = result_path.with_extension("m3u");
        results.push(("m3u", m3u::convert(result_path, &m3u_path)?));
    }
    if let Some(path) = &config.jellyfin_file {
        results.push(("jellyfin", jellyfin::convert(result_path, path)?));
    }
    if let Some(path) = &config.top_tv_box_file {
        results.push(("toptvbox", toptvbox::convert(result_path, path)?));
    }
    if let (Some(path), Some(template)) = (&config.tv_box_file, &config.tv_box_demo_file) {
        results.push(("tvbox", tvbox::convert(result_path, template, path)?));
    }

    for (name, status) in &results {
        info!(converter = name, ?status, "conversion finished");
    }
    Ok(results)
}
