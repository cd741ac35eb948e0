use std::path::Path;

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use super::{ResultFile, Status, logo_url, write_json};

/// One channel in the TopTvBox data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTvBoxChannel {
    pub id: u32,
    pub tv_name: String,
    pub url: String,
    /// Further URLs of the same channel, in file order.
    pub bak_url: Vec<String>,
    pub category: Option<String>,
    pub status: u8,
    pub update_time: Option<String>,
    pub version: Option<String>,
    pub logo_url: String,
}

/// Channels keyed by normalized name, numbered from 1 in first-seen order.
pub fn collect_channels(file: &ResultFile) -> Vec<TopTvBoxChannel> {
    let update_time = file.update_time().map(str::to_string);
    let mut channels: IndexMap<String, TopTvBoxChannel> = IndexMap::new();

    for row in file.rows() {
        if row.group.is_none() || row.in_update_time_group() {
            continue;
        }
        let name = file.display_name(&row);
        if let Some(channel) = channels.get_mut(&name) {
            channel.bak_url.push(row.url.to_string());
            continue;
        }
        let id = channels.len() as u32 + 1;
        channels.insert(
            name.clone(),
            TopTvBoxChannel {
                id,
                logo_url: logo_url(&name),
                tv_name: name,
                url: row.url.to_string(),
                bak_url: Vec::new(),
                category: row.group.map(str::to_string),
                status: 1,
                update_time: update_time.clone(),
                version: update_time.clone(),
            },
        );
    }

    channels.into_values().collect()
}

pub fn convert(result_path: &Path, data_path: &Path) -> Result<Status> {
    let Some(file) = ResultFile::read(result_path)? else {
        warn!(path = %result_path.display(), "result file missing, skipping TopTvBox");
        return Ok(Status::Skipped);
    };
    let channels = collect_channels(&file);
    if channels.is_empty() {
        println!(
            "❌ dont create TopTvBox result file generated at: {}, data is null",
            data_path.display()
        );
        return Ok(Status::Skipped);
    }
    write_json(data_path, &channels)?;
    println!("✅ TopTvBox result file generated at: {}", data_path.display());
    Ok(Status::Produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::SAMPLE;
    use crate::output::to_json_pretty;

    #[test]
    fn test_collect_channels() {
        let channels = collect_channels(&ResultFile::parse(SAMPLE));
        assert_eq!(channels.len(), 3);

        let cctv1 = &channels[0];
        assert_eq!(cctv1.id, 1);
        assert_eq!(cctv1.tv_name, "CCTV1");
        assert_eq!(cctv1.url, "http://1.0.0.1/cctv1");
        assert_eq!(cctv1.bak_url, vec!["http://1.0.0.2/cctv1"]);
        assert_eq!(cctv1.category.as_deref(), Some("央视频道"));
        assert_eq!(cctv1.update_time.as_deref(), Some("2026-05-20 08:00:00"));
        assert_eq!(cctv1.version, cctv1.update_time);

        assert_eq!(channels[2].id, 3);
        assert_eq!(channels[2].tv_name, "湖南卫视");
    }

    #[test]
    fn test_field_names_and_order() {
        let channels = collect_channels(&ResultFile::parse("卫视,#genre#\n湖南卫视,http://h\n"));
        let json = to_json_pretty(&channels).unwrap();
        let keys: Vec<&str> = json
            .lines()
            .filter_map(|line| line.trim().strip_prefix('"'))
            .filter_map(|line| line.split('"').next())
            .collect();
        assert_eq!(
            keys,
            vec![
                "id", "tvName", "url", "bakUrl", "category", "status", "updateTime", "version",
                "logoUrl"
            ]
        );
        assert!(json.contains("\"updateTime\": null"));
    }

    #[test]
    fn test_empty_result_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let result = dir.path().join("result.txt");
        std::fs::write(&result, "🕘️更新时间,#genre#\n2026-05-20 08:00:00,http://x\n").unwrap();
        let data = dir.path().join("data.json");
        assert_eq!(convert(&result, &data).unwrap(), Status::Skipped);
        assert!(!data.exists());
    }
}
