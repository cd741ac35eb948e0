use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use serde::Deserialize;

use tvlist_core::{
    DedupeOptions, IdentityKey, IdentityKind, IpFilter, IpVersion, Origin, Preferences,
    QuotaPolicy, info::resolution_value,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Per-family URL limits; an absent family falls back to `urls_limit`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IpvLimit {
    pub ipv4: Option<usize>,
    pub ipv6: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    pub enabled: bool,
    pub key: IdentityKind,
    /// Regex with one capture group, used when `key` is `pattern`.
    pub pattern: Option<String>,
    pub exclude_info_prefix: Option<String>,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key: IdentityKind::Base,
            pattern: None,
            exclude_info_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Contents API URL with a `{file_name}` placeholder.
    pub sha_url: Option<String>,
    pub access_token: Option<String>,
    /// Raw URL of the published `tv_box_data.txt`, linked from `tvbox.json`.
    pub data_raw_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            sha_url: None,
            access_token: None,
            data_raw_url: None,
            timeout_secs: 15,
        }
    }
}

impl PublishConfig {
    pub fn target_url(&self, file_name: &str) -> Option<String> {
        self.sha_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| url.replace("{file_name}", file_name))
    }
}

/**
    Run configuration loaded from YAML.

    Every field has a default, so a partial (or empty) file is valid.
*/
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub urls_limit: usize,
    pub ipv_limit: IpvLimit,
    /// Per-origin limits keyed by origin tag (`"all"` for the single bucket).
    pub source_limits: HashMap<String, usize>,
    pub open_supply: bool,
    pub open_url_info: bool,
    pub recent_days: i64,
    pub ipv_type_prefer: Vec<IpVersion>,
    pub origin_type_prefer: Vec<Origin>,
    pub ipv_type: IpFilter,
    /// Minimum resolution as `WxH`.
    pub min_resolution: Option<String>,
    pub dedupe: DedupeConfig,

    pub whitelist_file: Option<PathBuf>,
    pub blacklist_file: Option<PathBuf>,

    pub final_file: PathBuf,
    pub open_m3u_result: bool,
    pub jellyfin_file: Option<PathBuf>,
    pub top_tv_box_file: Option<PathBuf>,
    pub tv_box_file: Option<PathBuf>,
    pub tv_box_demo_file: Option<PathBuf>,

    pub open_update_time: bool,
    pub time_zone: String,

    pub publish: PublishConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls_limit: 10,
            ipv_limit: IpvLimit::default(),
            source_limits: HashMap::new(),
            open_supply: true,
            open_url_info: true,
            recent_days: 30,
            ipv_type_prefer: vec![IpVersion::V4, IpVersion::V6],
            origin_type_prefer: Vec::new(),
            ipv_type: IpFilter::All,
            min_resolution: None,
            dedupe: DedupeConfig::default(),
            whitelist_file: None,
            blacklist_file: None,
            final_file: PathBuf::from("output/result.txt"),
            open_m3u_result: true,
            jellyfin_file: None,
            top_tv_box_file: None,
            tv_box_file: None,
            tv_box_demo_file: None,
            open_update_time: true,
            time_zone: "Asia/Shanghai".to_string(),
            publish: PublishConfig::default(),
        }
    }
}

impl Config {
    /**
        Load configuration from `path`.

        A missing file at the default location yields the defaults; a missing
        file anywhere else is an error.
    */
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn quota_policy(&self) -> QuotaPolicy {
        let mut policy = QuotaPolicy::new(self.urls_limit)
            .with_supply(self.open_supply)
            .with_info(self.open_url_info);
        if let Some(limit) = self.ipv_limit.ipv4 {
            policy = policy.with_ipv_limit(IpVersion::V4, limit);
        }
        if let Some(limit) = self.ipv_limit.ipv6 {
            policy = policy.with_ipv_limit(IpVersion::V6, limit);
        }
        for (origin, limit) in &self.source_limits {
            policy = policy.with_origin_limit(origin.clone(), *limit);
        }
        policy
    }

    pub fn preferences(&self) -> Preferences {
        Preferences::new(
            self.ipv_type_prefer.clone(),
            self.origin_type_prefer.clone(),
        )
    }

    pub fn dedupe_options(&self) -> Result<Option<DedupeOptions>> {
        if !self.dedupe.enabled {
            return Ok(None);
        }
        let key = match self.dedupe.key {
            IdentityKind::Base => IdentityKey::Base,
            IdentityKind::Exact => IdentityKey::Exact,
            IdentityKind::Domain => IdentityKey::Domain,
            IdentityKind::Pattern => {
                let pattern = self
                    .dedupe
                    .pattern
                    .as_deref()
                    .ok_or_else(|| anyhow!("dedupe.key is 'pattern' but dedupe.pattern is not set"))?;
                IdentityKey::pattern(pattern)?
            }
        };
        Ok(Some(DedupeOptions {
            key,
            exclude_info_prefix: self
                .dedupe
                .exclude_info_prefix
                .clone()
                .filter(|prefix| !prefix.is_empty()),
        }))
    }

    /// Minimum pixel count, 0 when unset or unparseable.
    pub fn min_resolution_value(&self) -> u64 {
        self.min_resolution
            .as_deref()
            .map(resolution_value)
            .unwrap_or(0)
    }

    pub fn time_zone(&self) -> Result<Tz> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid time_zone '{}': {}", self.time_zone, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.urls_limit, 10);
        assert!(config.open_supply);
        assert_eq!(config.ipv_type_prefer, vec![IpVersion::V4, IpVersion::V6]);
        assert_eq!(config.final_file, PathBuf::from("output/result.txt"));
    }

    #[test]
    fn test_partial_file() {
        let yaml = r#"
urls_limit: 5
ipv_limit:
  ipv6: 2
source_limits:
  hotel: 3
origin_type_prefer: [hotel, subscribe]
ipv_type: 全部
dedupe:
  key: domain
  exclude_info_prefix: "cache:"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let policy = config.quota_policy();
        assert_eq!(policy.total_limit, 5);
        assert_eq!(policy.ipv_limit(IpVersion::V6), 2);
        assert_eq!(policy.ipv_limit(IpVersion::V4), 5);
        assert_eq!(policy.origin_limit("hotel"), 3);
        assert_eq!(
            config.preferences().bucket_order(),
            vec!["hotel", "subscribe"]
        );
        assert_eq!(config.ipv_type, IpFilter::All);

        let options = config.dedupe_options().unwrap().unwrap();
        assert!(matches!(options.key, IdentityKey::Domain));
        assert_eq!(options.exclude_info_prefix.as_deref(), Some("cache:"));
    }

    #[test]
    fn test_pattern_key_requires_pattern() {
        let config = Config::from_yaml("dedupe:\n  key: pattern\n").unwrap();
        assert!(config.dedupe_options().is_err());

        let config = Config::from_yaml("dedupe:\n  key: pattern\n  pattern: '^(\\w+)'\n").unwrap();
        assert!(config.dedupe_options().unwrap().is_some());

        let config = Config::from_yaml("dedupe:\n  enabled: false\n").unwrap();
        assert!(config.dedupe_options().unwrap().is_none());
    }

    #[test]
    fn test_min_resolution_and_time_zone() {
        let config = Config::from_yaml("min_resolution: 1280x720\n").unwrap();
        assert_eq!(config.min_resolution_value(), 921_600);
        assert_eq!(config.time_zone().unwrap(), chrono_tz::Asia::Shanghai);

        let config = Config::from_yaml("time_zone: Mars/Base\n").unwrap();
        assert!(config.time_zone().is_err());
    }

    #[test]
    fn test_publish_target_url() {
        let config = Config::from_yaml(
            "publish:\n  sha_url: https://gitee.com/api/v5/repos/o/r/contents/{file_name}\n",
        )
        .unwrap();
        assert_eq!(
            config.publish.target_url("data.json").as_deref(),
            Some("https://gitee.com/api/v5/repos/o/r/contents/data.json")
        );
        assert_eq!(config.publish.timeout_secs, 15);
        assert_eq!(Config::default().publish.target_url("data.json"), None);
    }
}
