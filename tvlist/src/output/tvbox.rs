use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::{ResultFile, Status, write_json};

pub const DIYP_EPG_URL: &str = "http://epg.51zmt.top:8000/api/diyp/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveChannel {
    pub name: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGroup {
    pub group: String,
    pub channels: Vec<LiveChannel>,
    pub epg: String,
    pub update_time: Option<String>,
}

/// Every group of the result file with its channels' URLs merged by normalized name.
pub fn collect_lives(file: &ResultFile) -> Vec<LiveGroup> {
    let mut groups: IndexMap<&str, IndexMap<String, Vec<String>>> =
        file.groups().map(|group| (group, IndexMap::new())).collect();

    for row in file.rows() {
        let Some(group) = row.group else {
            continue;
        };
        let name = file.display_name(&row);
        groups
            .entry(group)
            .or_default()
            .entry(name)
            .or_default()
            .push(row.url.to_string());
    }

    let update_time = file.update_time().map(str::to_string);
    groups
        .into_iter()
        .map(|(group, channels)| LiveGroup {
            group: group.to_string(),
            channels: channels
                .into_iter()
                .map(|(name, urls)| LiveChannel { name, urls })
                .collect(),
            epg: DIYP_EPG_URL.to_string(),
            update_time: update_time.clone(),
        })
        .collect()
}

/**
    Load the TvBox template object.

    Returns `None` when the file is missing or empty.
*/
pub fn load_template(path: &Path) -> Result<Option<Map<String, Value>>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read TvBox template {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(&contents)
        .with_context(|| format!("Invalid TvBox template {}", path.display()))?
    {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(anyhow!("TvBox template {} is not a JSON object", path.display())),
    }
}

/// The template with its `lives` entry replaced, keeping the template's key order.
pub fn with_lives(mut template: Map<String, Value>, lives: Value) -> Value {
    template.insert("lives".to_string(), lives);
    Value::Object(template)
}

pub fn convert(result_path: &Path, template_path: &Path, tv_box_path: &Path) -> Result<Status> {
    let Some(file) = ResultFile::read(result_path)? else {
        warn!(path = %result_path.display(), "result file missing, skipping TvBox");
        return Ok(Status::Skipped);
    };
    let lives = collect_lives(&file);
    if lives.is_empty() {
        println!("❌ dont create TvBox result file, data is null");
        return Ok(Status::Skipped);
    }
    let Some(template) = load_template(template_path)? else {
        println!(
            "❌ dont create TvBox result file, demo file is missing or empty: {}",
            template_path.display()
        );
        return Ok(Status::Skipped);
    };

    let document = with_lives(template, serde_json::to_value(&lives)?);
    write_json(tv_box_path, &document)?;
    println!("✅ TvBox result file generated at: {}", tv_box_path.display());
    Ok(Status::Produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::SAMPLE;

    #[test]
    fn test_collect_lives() {
        let lives = collect_lives(&ResultFile::parse(SAMPLE));
        assert_eq!(lives.len(), 3);

        assert_eq!(lives[0].group, "🕘️更新时间");
        assert_eq!(lives[0].channels[0].name, "CCTV1");

        let cctv = &lives[1];
        assert_eq!(cctv.channels.len(), 2);
        assert_eq!(
            cctv.channels[0],
            LiveChannel {
                name: "CCTV1".into(),
                urls: vec!["http://1.0.0.1/cctv1".into(), "http://1.0.0.2/cctv1".into()],
            }
        );
        assert_eq!(cctv.epg, DIYP_EPG_URL);
        assert_eq!(cctv.update_time.as_deref(), Some("2026-05-20 08:00:00"));
    }

    #[test]
    fn test_convert_keeps_template_order() {
        let dir = tempfile::tempdir().unwrap();
        let result = dir.path().join("result.txt");
        let template = dir.path().join("demo.json");
        let output = dir.path().join("tvbox.json");
        std::fs::write(&result, SAMPLE).unwrap();
        std::fs::write(&template, r#"{"spider": "x", "lives": [], "sites": []}"#).unwrap();

        assert_eq!(convert(&result, &template, &output).unwrap(), Status::Produced);

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let keys: Vec<&String> = written.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["spider", "lives", "sites"]);
        assert_eq!(written["lives"][1]["group"], "央视频道");
        assert_eq!(written["lives"][1]["updateTime"], "2026-05-20 08:00:00");
    }

    #[test]
    fn test_missing_or_empty_template_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let result = dir.path().join("result.txt");
        let template = dir.path().join("demo.json");
        let output = dir.path().join("tvbox.json");
        std::fs::write(&result, SAMPLE).unwrap();

        assert_eq!(convert(&result, &template, &output).unwrap(), Status::Skipped);
        std::fs::write(&template, "").unwrap();
        assert_eq!(convert(&result, &template, &output).unwrap(), Status::Skipped);
        assert!(!output.exists());
    }
}
