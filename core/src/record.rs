use core::fmt;
use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::{Host, Url};

use crate::constants::{DATE_FORMAT, origin_display_name};
use crate::error::ParseError;
use crate::info::strip_info;

/**
    Upstream source category a URL record was collected from.

    Unrecognized tags are kept verbatim in `Other` so that configuration can
    name origins this crate does not know about.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    Live,
    Subscribe,
    Multicast,
    Whitelist,
    Hotel,
    OnlineSearch,
    Local,
    Other(String),
}

impl Origin {
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "live" => Self::Live,
            "subscribe" => Self::Subscribe,
            "multicast" => Self::Multicast,
            "whitelist" => Self::Whitelist,
            "hotel" => Self::Hotel,
            "online_search" => Self::OnlineSearch,
            "local" => Self::Local,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Live => "live",
            Self::Subscribe => "subscribe",
            Self::Multicast => "multicast",
            Self::Whitelist => "whitelist",
            Self::Hotel => "hotel",
            Self::OnlineSearch => "online_search",
            Self::Local => "local",
            Self::Other(name) => name,
        }
    }

    /// Human-readable source label, if the origin has one.
    pub fn display_name(&self) -> Option<&'static str> {
        origin_display_name(self.as_str())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseError {
                kind: "origin",
                value: s.to_owned(),
            });
        }
        Ok(Self::from_name(s))
    }
}

impl Serialize for Origin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Empty or missing origin tags deserialize to `None`.
fn deserialize_origin<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Origin>, D::Error> {
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.and_then(|s| s.parse().ok()))
}

/**
    IP family of a URL's host.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    #[serde(rename = "ipv4")]
    V4,
    #[serde(rename = "ipv6")]
    V6,
}

impl IpVersion {
    pub const ALL: [IpVersion; 2] = [IpVersion::V4, IpVersion::V6];

    pub const fn to_name(self) -> &'static str {
        match self {
            Self::V4 => "ipv4",
            Self::V6 => "ipv6",
        }
    }

    /// Family of the URL's host: IPv6 for bracketed IPv6 literals, IPv4 otherwise.
    pub fn of_url(url: &str) -> Self {
        if is_ipv6(url) { Self::V6 } else { Self::V4 }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_name())
    }
}

impl FromStr for IpVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ipv4" => Ok(Self::V4),
            "ipv6" => Ok(Self::V6),
            _ => Err(ParseError {
                kind: "ip version",
                value: s.to_owned(),
            }),
        }
    }
}

/**
    Which IP families survive the pre-ranking filter.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IpFilter {
    V4,
    V6,
    #[default]
    All,
}

impl IpFilter {
    pub fn accepts(self, url: &str) -> bool {
        match self {
            Self::All => true,
            Self::V4 => !is_ipv6(url),
            Self::V6 => is_ipv6(url),
        }
    }
}

impl FromStr for IpFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ipv4" => Ok(Self::V4),
            "ipv6" => Ok(Self::V6),
            "all" | "全部" => Ok(Self::All),
            _ => Err(ParseError {
                kind: "ip filter",
                value: s.to_owned(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for IpFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/**
    Whether the URL's host is an IPv6 literal.

    Only the literal host is inspected; no name resolution happens, so this
    never blocks. Unparseable URLs count as "not IPv6".
*/
pub fn is_ipv6(url: &str) -> bool {
    match Url::parse(strip_info(url)) {
        Ok(parsed) => matches!(parsed.host(), Some(Host::Ipv6(_))),
        Err(_) => false,
    }
}

/// True when `keywords` is empty or any keyword occurs in `url`.
pub fn contains_any<S: AsRef<str>>(url: &str, keywords: &[S]) -> bool {
    keywords.is_empty() || keywords.iter().any(|k| url.contains(k.as_ref()))
}

/**
    One candidate URL for a channel, as produced by a collection stage.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub url: String,
    /// Capture date in `MM-DD-YYYY` form.
    #[serde(default)]
    pub date: Option<String>,
    /// Resolution as `WxH`.
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default, deserialize_with = "deserialize_origin")]
    pub origin: Option<Origin>,
}

impl UrlRecord {
    pub fn new(url: impl Into<String>, origin: Origin) -> Self {
        Self {
            url: url.into(),
            date: None,
            resolution: None,
            origin: Some(origin),
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    /// Parsed capture date; `None` when absent or malformed.
    pub fn capture_date(&self) -> Option<NaiveDate> {
        let date = self.date.as_deref()?.trim();
        NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
    }
}

/**
    A record paired with the response time measured for it upstream.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    #[serde(flatten)]
    pub record: UrlRecord,
    /// Milliseconds; absent when the URL was never probed.
    #[serde(default)]
    pub response_time: Option<f64>,
}

impl RecordEntry {
    pub fn new(record: UrlRecord, response_time: Option<f64>) -> Self {
        Self {
            record,
            response_time,
        }
    }
}

impl From<UrlRecord> for RecordEntry {
    fn from(record: UrlRecord) -> Self {
        Self::new(record, None)
    }
}

/// All candidate entries collected for one channel, in upstream order.
pub type ChannelRecordSet = Vec<RecordEntry>;
