use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;

use crate::config::Config;
use crate::files::{Position, replace_file, write_content};
use crate::pipeline::{self, Ranker, RankedData};
use crate::util::time::{format_interval, now_in};

use super::convert::convert_all;

#[derive(Parser, Debug)]
pub struct RankCommand {
    /// Collection result documents (group → channel → records), merged left to right
    #[arg(short, long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Result file to write (defaults to final_file from the config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RankCommand {
    pub async fn run(self, config: &Config) -> Result<()> {
        let started = Instant::now();
        let final_file = self.output.unwrap_or_else(|| config.final_file.clone());

        println!("Loading {} input files...", self.inputs.len());
        let data = pipeline::load_inputs(&self.inputs)?;
        let channels: usize = data.values().map(|group| group.len()).sum();
        info!(groups = data.len(), channels, "loaded channel data");

        let ranker = Ranker::from_config(config, Local::now().date_naive())?;
        let ranked = ranker.rank(data);

        write_result(config, &ranked, &final_file)?;
        println!("✅ Result file generated at: {}", final_file.display());

        convert_all(config, &final_file)?;

        println!(
            "🥳 Update completed! Total time spent: {}",
            format_interval(started.elapsed().as_secs())
        );
        Ok(())
    }
}

/**
    Write ranked data through a staged sibling file, then prepend the
    update-time group when enabled.
*/
pub fn write_result(config: &Config, ranked: &RankedData, final_file: &Path) -> Result<()> {
    let staged = pipeline::staged_path(final_file);
    if staged.exists() {
        fs::remove_file(&staged)
            .with_context(|| format!("Failed to remove stale {}", staged.display()))?;
    }
    write_content(&staged, &pipeline::render_result(ranked), Position::Append)?;
    replace_file(final_file, &staged, false)?;

    if config.open_update_time
        && let Some(block) = pipeline::update_time_block(&now_in(config.time_zone()?), ranked)
    {
        write_content(final_file, &block, Position::Top)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ResultFile;

    fn ranked() -> RankedData {
        let mut ranked = RankedData::new();
        ranked
            .entry("央视频道".into())
            .or_default()
            .insert("CCTV-1".into(), vec!["http://a/1".into(), "http://a/2".into()]);
        ranked
    }

    #[test]
    fn test_write_result_with_update_time() {
        let dir = tempfile::tempdir().unwrap();
        let final_file = dir.path().join("output").join("result.txt");
        fs::create_dir_all(final_file.parent().unwrap()).unwrap();
        fs::write(&final_file, "old contents").unwrap();

        write_result(&Config::default(), &ranked(), &final_file).unwrap();

        let written = fs::read_to_string(&final_file).unwrap();
        assert!(written.starts_with("🕘️更新时间,#genre#\n"));
        assert!(written.ends_with("\n央视频道,#genre#\nCCTV-1,http://a/1\nCCTV-1,http://a/2\n\n"));
        assert!(!written.contains("old contents"));
        assert!(!pipeline::staged_path(&final_file).exists());

        let file = ResultFile::parse(&written);
        assert_eq!(file.first_channel_name(), Some("CCTV-1"));
        assert!(file.update_time().is_some());
    }

    #[test]
    fn test_write_result_without_update_time() {
        let dir = tempfile::tempdir().unwrap();
        let final_file = dir.path().join("result.txt");
        let config = Config {
            open_update_time: false,
            ..Config::default()
        };
        write_result(&config, &ranked(), &final_file).unwrap();
        assert_eq!(
            fs::read_to_string(&final_file).unwrap(),
            "央视频道,#genre#\nCCTV-1,http://a/1\nCCTV-1,http://a/2\n\n"
        );
    }
}
