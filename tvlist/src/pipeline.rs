/*!
    Ranking pipeline from merged collection results to the result text file.

    Input documents map group name → channel name → candidate records.
    Every channel goes through whitelist injection, filtering, speed
    ordering, cross-channel dedupe, the freshness filter and finally the
    quota allocator.
*/

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use indexmap::IndexMap;
use tracing::{debug, info};

use tvlist_core::{
    ChannelRecordSet, DedupeOptions, IpFilter, Origin, Preferences, QuotaPolicy, RecordEntry,
    UrlRecord, Value, allocate, contains_any, dedupe_nested, filter_by_date,
    info::{resolution_value, strip_cache},
    merge,
};

use crate::config::Config;
use crate::files::{lines_from_file, name_urls_from_file};
use crate::output::{GENRE_MARKER, UPDATE_TIME_GROUP};

/// Group → channel → candidate records.
pub type ChannelData = IndexMap<String, IndexMap<String, ChannelRecordSet>>;

/// Group → channel → selected URLs.
pub type RankedData = IndexMap<String, IndexMap<String, Vec<String>>>;

// ── Loading ─────────────────────────────────────────────────────────────────

/// Read JSON documents and merge them left to right.
pub fn load_documents(paths: &[PathBuf]) -> Result<tvlist_core::Mapping> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        documents.push(Value::from(json));
    }
    merge(documents).context("Failed to merge inputs")
}

/// Merge the input documents and read them as channel data.
pub fn load_inputs(paths: &[PathBuf]) -> Result<ChannelData> {
    let merged = load_documents(paths)?;
    let json: serde_json::Value = Value::Map(merged).into();
    serde_json::from_value(json).context("Merged input is not a group → channel → records mapping")
}

// ── Filtering ───────────────────────────────────────────────────────────────

/// Pre-ranking filters. Whitelisted records are never filtered out.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Channel name → whitelisted URLs.
    pub whitelist: IndexMap<String, Vec<String>>,
    /// URLs containing any of these are dropped.
    pub blacklist: Vec<String>,
    pub ip_filter: IpFilter,
    /// Minimum pixel count; 0 disables the check.
    pub min_resolution: u64,
}

impl Filters {
    pub fn from_config(config: &Config) -> Result<Self> {
        let whitelist = match &config.whitelist_file {
            Some(path) => name_urls_from_file(path)?,
            None => IndexMap::new(),
        };
        let blacklist = match &config.blacklist_file {
            Some(path) => lines_from_file(path)?,
            None => Vec::new(),
        };
        Ok(Self {
            whitelist,
            blacklist,
            ip_filter: config.ipv_type,
            min_resolution: config.min_resolution_value(),
        })
    }

    fn accepts(&self, entry: &RecordEntry) -> bool {
        let record = &entry.record;
        if record.origin == Some(Origin::Whitelist) {
            return true;
        }
        if !self.blacklist.is_empty() && contains_any(&record.url, &self.blacklist) {
            return false;
        }
        if !self.ip_filter.accepts(&record.url) {
            return false;
        }
        if self.min_resolution > 0
            && let Some(resolution) = record.resolution.as_deref()
        {
            let value = resolution_value(resolution);
            if value > 0 && value < self.min_resolution {
                return false;
            }
        }
        true
    }

    /// Put the channel's whitelisted URLs in front of its records.
    fn inject_whitelist(&self, name: &str, entries: &mut ChannelRecordSet) {
        let Some(urls) = self.whitelist.get(name) else {
            return;
        };
        let mut injected: ChannelRecordSet = urls
            .iter()
            .map(|url| RecordEntry::from(UrlRecord::new(url.clone(), Origin::Whitelist)))
            .collect();
        injected.append(entries);
        *entries = injected;
    }
}

/// Order by measured response time, fastest first; unmeasured entries keep their order at the end.
pub fn sort_by_speed(entries: &mut ChannelRecordSet) {
    entries.sort_by(|a, b| match (a.response_time, b.response_time) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

// ── Ranking ─────────────────────────────────────────────────────────────────

pub struct Ranker {
    pub policy: QuotaPolicy,
    pub prefs: Preferences,
    pub dedupe: Option<DedupeOptions>,
    pub recent_days: i64,
    pub filters: Filters,
    pub today: NaiveDate,
}

impl Ranker {
    pub fn from_config(config: &Config, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            policy: config.quota_policy(),
            prefs: config.preferences(),
            dedupe: config.dedupe_options()?,
            recent_days: config.recent_days,
            filters: Filters::from_config(config)?,
            today,
        })
    }

    fn prepare(&self, name: &str, mut entries: ChannelRecordSet) -> ChannelRecordSet {
        self.filters.inject_whitelist(name, &mut entries);
        entries.retain(|entry| self.filters.accepts(entry));
        sort_by_speed(&mut entries);
        entries
    }

    fn select(&self, entries: ChannelRecordSet) -> Vec<String> {
        let candidates = if entries.len() > self.policy.total_limit {
            filter_by_date(entries, self.recent_days, self.policy.total_limit, self.today)
        } else {
            entries
        };
        let records: Vec<UrlRecord> = candidates.into_iter().map(|entry| entry.record).collect();
        allocate(&records, &self.prefs, &self.policy)
            .iter()
            .map(|url| strip_cache(url))
            .collect()
    }

    /// Rank every channel of `data`, keeping group and channel order.
    pub fn rank(&self, data: ChannelData) -> RankedData {
        let mut prepared: ChannelData = data
            .into_iter()
            .map(|(group, channels)| {
                let channels: IndexMap<String, ChannelRecordSet> = channels
                    .into_iter()
                    .map(|(name, entries)| {
                        let entries = self.prepare(&name, entries);
                        (name, entries)
                    })
                    .collect();
                (group, channels)
            })
            .collect();

        if let Some(options) = &self.dedupe {
            let mut seen = HashSet::new();
            dedupe_nested(&mut prepared, &mut seen, options);
            debug!(identities = seen.len(), "deduped channel data");
        }

        let mut selected = 0usize;
        let ranked: RankedData = prepared
            .into_iter()
            .map(|(group, channels)| {
                let channels: IndexMap<String, Vec<String>> = channels
                    .into_iter()
                    .map(|(name, entries)| {
                        let urls = self.select(entries);
                        debug!(channel = %name, urls = urls.len(), "ranked channel");
                        selected += urls.len();
                        (name, urls)
                    })
                    .collect();
                (group, channels)
            })
            .collect();

        info!(groups = ranked.len(), urls = selected, "ranking finished");
        ranked
    }
}

// ── Rendering ───────────────────────────────────────────────────────────────

/**
    Render ranked data in the result text format.

    Channels without URLs are left out, as are groups left empty by that.
*/
pub fn render_result(data: &RankedData) -> String {
    let mut out = String::new();
    for (group, channels) in data {
        if channels.values().all(Vec::is_empty) {
            continue;
        }
        out.push_str(&format!("{group},{GENRE_MARKER}\n"));
        for (name, urls) in channels {
            for url in urls {
                out.push_str(&format!("{name},{url}\n"));
            }
        }
        out.push('\n');
    }
    out
}

/// The update-time group pointing at the first selected URL; `None` when nothing was selected.
pub fn update_time_block(now: &str, data: &RankedData) -> Option<String> {
    let url = data
        .values()
        .flat_map(|channels| channels.values())
        .find_map(|urls| urls.first())?;
    Some(format!("{UPDATE_TIME_GROUP},{GENRE_MARKER}\n{now},{url}\n"))
}

/// Sibling path a new result is written to before it replaces the old one.
pub fn staged_path(final_file: &Path) -> PathBuf {
    let mut name = final_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    final_file.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use tvlist_core::{IdentityKey, IpVersion};

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
    }

    fn entry(url: &str, origin: Origin, response_time: Option<f64>) -> RecordEntry {
        RecordEntry::new(UrlRecord::new(url, origin), response_time)
    }

    fn ranker(total: usize) -> Ranker {
        Ranker {
            policy: QuotaPolicy::new(total),
            prefs: Preferences::new(vec![IpVersion::V4, IpVersion::V6], vec![]),
            dedupe: Some(DedupeOptions::default()),
            recent_days: 30,
            filters: Filters::default(),
            today: today(),
        }
    }

    fn data(channels: Vec<(&str, &str, Vec<RecordEntry>)>) -> ChannelData {
        let mut data = ChannelData::new();
        for (group, name, entries) in channels {
            data.entry(group.to_string())
                .or_default()
                .insert(name.to_string(), entries);
        }
        data
    }

    #[test]
    fn test_load_inputs_merges_documents() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        fs::write(
            &a,
            r#"{"央视": {"CCTV1": [{"url": "http://1.0.0.1/a", "origin": "hotel", "response_time": 80.5}]}}"#,
        )
        .unwrap();
        fs::write(
            &b,
            r#"{"央视": {"CCTV1": [{"url": "http://1.0.0.1/b", "origin": "subscribe"}], "CCTV2": []}}"#,
        )
        .unwrap();

        let data = load_inputs(&[a, b]).unwrap();
        let cctv1 = &data["央视"]["CCTV1"];
        assert_eq!(cctv1.len(), 2);
        assert_eq!(cctv1[0].response_time, Some(80.5));
        assert_eq!(cctv1[1].record.origin, Some(Origin::Subscribe));
        assert!(data["央视"]["CCTV2"].is_empty());
    }

    #[test]
    fn test_load_inputs_rejects_bad_shape() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        fs::write(&a, r#"[1, 2]"#).unwrap();
        assert!(load_inputs(&[a]).is_err());
    }

    #[test]
    fn test_sort_by_speed_is_stable() {
        let mut entries = vec![
            entry("http://a/none1", Origin::Live, None),
            entry("http://a/slow", Origin::Live, Some(300.0)),
            entry("http://a/none2", Origin::Live, None),
            entry("http://a/fast", Origin::Live, Some(20.0)),
        ];
        sort_by_speed(&mut entries);
        let urls: Vec<&str> = entries.iter().map(|e| e.record.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["http://a/fast", "http://a/slow", "http://a/none1", "http://a/none2"]
        );
    }

    #[test]
    fn test_filters() {
        let filters = Filters {
            whitelist: IndexMap::new(),
            blacklist: vec!["bad.com".into()],
            ip_filter: IpFilter::V4,
            min_resolution: 1280 * 720,
        };
        let low = RecordEntry::from(
            UrlRecord::new("http://ok.com/low", Origin::Live).with_resolution("640x480"),
        );
        let high = RecordEntry::from(
            UrlRecord::new("http://ok.com/high", Origin::Live).with_resolution("1920x1080"),
        );
        assert!(!filters.accepts(&entry("http://bad.com/x", Origin::Live, None)));
        assert!(!filters.accepts(&entry("http://[::1]/x", Origin::Live, None)));
        assert!(!filters.accepts(&low));
        assert!(filters.accepts(&high));
        assert!(filters.accepts(&entry("http://ok.com/unknown", Origin::Live, None)));
        assert!(filters.accepts(&entry("http://bad.com/w", Origin::Whitelist, None)));
    }

    #[test]
    fn test_rank_injects_whitelist_and_dedupes_across_channels() {
        let mut ranker = ranker(2);
        ranker
            .filters
            .whitelist
            .insert("CCTV1".into(), vec!["http://1.0.0.1/w".into()]);

        let input = data(vec![
            (
                "央视",
                "CCTV1",
                vec![
                    entry("http://1.0.0.1/slow", Origin::Subscribe, Some(500.0)),
                    entry("http://1.0.0.1/fast", Origin::Hotel, Some(10.0)),
                ],
            ),
            (
                "央视",
                "CCTV2",
                vec![
                    entry("http://1.0.0.1/fast", Origin::Hotel, Some(10.0)),
                    entry("http://1.0.0.1/other", Origin::Subscribe, None),
                ],
            ),
        ]);

        let ranked = ranker.rank(input);
        assert_eq!(
            ranked["央视"]["CCTV1"],
            vec!["http://1.0.0.1/w$白名单", "http://1.0.0.1/fast$酒店源"]
        );
        assert_eq!(ranked["央视"]["CCTV2"], vec!["http://1.0.0.1/other$订阅源"]);
    }

    #[test]
    fn test_rank_prefers_recent_when_over_limit() {
        let ranker = ranker(1);
        let old = RecordEntry::new(
            UrlRecord::new("http://1.0.0.1/old", Origin::Subscribe).with_date("01-01-2025"),
            Some(5.0),
        );
        let new = RecordEntry::new(
            UrlRecord::new("http://1.0.0.1/new", Origin::Subscribe).with_date("05-19-2026"),
            Some(50.0),
        );
        let ranked = ranker.rank(data(vec![("g", "c", vec![old, new])]));
        assert_eq!(ranked["g"]["c"], vec!["http://1.0.0.1/new$订阅源"]);
    }

    #[test]
    fn test_rank_strips_cache_hint() {
        let mut ranker = ranker(3);
        ranker.dedupe = Some(DedupeOptions {
            key: IdentityKey::Exact,
            exclude_info_prefix: None,
        });
        let ranked = ranker.rank(data(vec![(
            "g",
            "c",
            vec![entry("http://1.0.0.1/a$cache:1.0.0.1", Origin::Hotel, None)],
        )]));
        assert_eq!(ranked["g"]["c"], vec!["http://1.0.0.1/a$"]);
    }

    #[test]
    fn test_render_result_and_update_time() {
        let mut ranked = RankedData::new();
        ranked.entry("empty".into()).or_default().insert("x".into(), vec![]);
        let group = ranked.entry("央视".into()).or_default();
        group.insert("CCTV1".into(), vec!["http://a/1".into(), "http://a/2".into()]);
        group.insert("CCTV2".into(), vec![]);

        assert_eq!(
            render_result(&ranked),
            "央视,#genre#\nCCTV1,http://a/1\nCCTV1,http://a/2\n\n"
        );
        assert_eq!(
            update_time_block("2026-05-20 08:00:00", &ranked).as_deref(),
            Some("🕘️更新时间,#genre#\n2026-05-20 08:00:00,http://a/1\n")
        );
        assert_eq!(update_time_block("now", &RankedData::new()), None);
    }

    #[test]
    fn test_staged_path() {
        assert_eq!(
            staged_path(Path::new("output/result.txt")),
            PathBuf::from("output/result.txt.tmp")
        );
    }
}
