/*!
    Commit generated files to a remote git repository's contents API.

    Each commit first fetches the current blob `sha` of the target file, then
    PUTs the new base64 content against it. Failures are logged and reported
    as `Status::Skipped`; they never abort the run.
*/

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::{Config, PublishConfig};
use crate::output::tvbox::{load_template, with_lives};
use crate::output::{Status, to_json_pretty};
use crate::util::time;

pub const TVBOX_LIVES_FILE: &str = "tvbox_lives.json";
pub const TVBOX_DATA_FILE: &str = "tv_box_data.txt";
pub const TVBOX_CONFIG_FILE: &str = "tvbox.json";
pub const TOPTVBOX_DATA_FILE: &str = "data.json";

#[derive(Debug, Deserialize)]
struct ShaResponse {
    #[serde(default)]
    sha: Option<String>,
}

/// Commit message for a given local timestamp.
pub fn commit_message(now: &str) -> String {
    format!("{now} 提交最新记录")
}

pub fn encode(content: &str) -> String {
    BASE64.encode(content.as_bytes())
}

/// The TvBox template with a single live source pointing at `data_url`.
pub fn data_config(template: serde_json::Map<String, serde_json::Value>, data_url: &str) -> serde_json::Value {
    with_lives(
        template,
        json!([{
            "name": "直播",
            "type": 0,
            "url": data_url,
        }]),
    )
}

pub struct Publisher {
    client: reqwest::Client,
    access_token: String,
    time_zone: Tz,
}

impl Publisher {
    pub fn new(config: &PublishConfig, time_zone: Tz) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;
        Ok(Self {
            client,
            access_token: config.access_token.clone().unwrap_or_default(),
            time_zone,
        })
    }

    async fn fetch_sha(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to fetch file sha: {}", e))?;
        if !response.status().is_success() {
            return Err(anyhow!("Failed to fetch file sha: HTTP {}", response.status()));
        }
        let body: ShaResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Invalid sha response: {}", e))?;
        Ok(body.sha.unwrap_or_default())
    }

    async fn put_file(&self, url: &str, content: &str, sha: &str) -> Result<String> {
        let message = commit_message(&time::now_in(self.time_zone));
        let encoded = encode(content);
        let form = [
            ("access_token", self.access_token.as_str()),
            ("content", encoded.as_str()),
            ("sha", sha),
            ("message", message.as_str()),
        ];
        let response = self
            .client
            .put(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to commit file: {}", e))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!("Failed to commit file: HTTP {}: {}", status, text));
        }
        Ok(text)
    }

    /**
        Commit `content` to `url`.

        Empty content is not committed. A missing or empty remote `sha`
        means the file cannot be updated and the commit is skipped.
    */
    pub async fn commit_file(&self, content: &str, url: &str) -> Status {
        if content.is_empty() {
            return Status::Skipped;
        }

        let sha = match self.fetch_sha(url).await {
            Ok(sha) => sha,
            Err(e) => {
                error!(url, "❌ {e:#}");
                return Status::Skipped;
            }
        };
        if sha.is_empty() {
            error!(url, "❌ remote file sha is empty");
            return Status::Skipped;
        }

        match self.put_file(url, content, &sha).await {
            Ok(body) => {
                info!(url, response = %body, "✅ commit succeeded");
                Status::Produced
            }
            Err(e) => {
                error!(url, "❌ {e:#}");
                Status::Skipped
            }
        }
    }
}

fn read_optional(path: Option<&Path>) -> Result<Option<String>> {
    let Some(path) = path.filter(|p| p.exists()) else {
        return Ok(None);
    };
    fs::read_to_string(path)
        .map(Some)
        .with_context(|| format!("Failed to read {}", path.display()))
}

/**
    Commit every generated file the configuration names.

    Returns the status of each target in commit order.
*/
pub async fn publish_all(config: &Config) -> Result<Vec<(&'static str, Status)>> {
    let publish = &config.publish;
    if publish.target_url(TVBOX_LIVES_FILE).is_none() {
        warn!("publish.sha_url is not set, nothing to publish");
        return Ok(Vec::new());
    }

    let result_txt = read_optional(Some(config.final_file.as_path()))?;
    let tvbox_config = match (
        result_txt.as_ref(),
        config.tv_box_demo_file.as_deref(),
        publish.data_raw_url.as_deref().filter(|url| !url.is_empty()),
    ) {
        (Some(_), Some(template_path), Some(data_url)) => load_template(template_path)?
            .map(|template| to_json_pretty(&data_config(template, data_url)))
            .transpose()?,
        _ => None,
    };

    let targets = [
        (TVBOX_LIVES_FILE, read_optional(config.tv_box_file.as_deref())?),
        (TVBOX_DATA_FILE, result_txt.as_deref().map(encode)),
        (TVBOX_CONFIG_FILE, tvbox_config),
        (TOPTVBOX_DATA_FILE, read_optional(config.top_tv_box_file.as_deref())?),
    ];

    let publisher = Publisher::new(publish, config.time_zone()?)?;
    let mut results = Vec::with_capacity(targets.len());
    for (file_name, content) in targets {
        let status = match (content, publish.target_url(file_name)) {
            (Some(content), Some(url)) => publisher.commit_file(&content, &url).await,
            _ => Status::Skipped,
        };
        info!(file = file_name, ?status, "publish step finished");
        results.push((file_name, status));
    }

    Ok(results)
}
