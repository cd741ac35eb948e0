/*!
    Converters from the ranked result text file to player formats.

    The result file is a sequence of `group,#genre#` headers followed by
    `name,url` rows. Each converter reads it, renders one format and reports
    whether a file was produced.
*/

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::files::{parse_name_url, write_file};

pub mod jellyfin;
pub mod m3u;
pub mod toptvbox;
pub mod tvbox;

pub const GENRE_MARKER: &str = "#genre#";
pub const UPDATE_TIME_MARKER: &str = "更新时间";
pub const UPDATE_TIME_GROUP: &str = "🕘️更新时间";
pub const EPG_URL: &str = "https://raw.githubusercontent.com/fanmingming/live/main/e.xml";
pub const LOGO_BASE_URL: &str = "https://raw.githubusercontent.com/fanmingming/live/main/tv";

/// Outcome of a single output step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Skipped = 0,
    Produced = 1,
}

/// One meaningful line of a result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Group(String),
    Channel { name: String, url: String },
}

/// A channel row together with the group it appears under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
    pub group: Option<&'a str>,
    pub name: &'a str,
    pub url: &'a str,
}

impl Row<'_> {
    pub fn in_update_time_group(&self) -> bool {
        self.group.is_some_and(is_update_time_group)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultFile {
    pub lines: Vec<Line>,
}

impl ResultFile {
    pub fn parse(contents: &str) -> Self {
        let lines = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                if line.contains(GENRE_MARKER) {
                    let group = line.replace(&format!(",{GENRE_MARKER}"), "");
                    Some(Line::Group(group.trim().to_string()))
                } else {
                    parse_name_url(line).map(|(name, url)| Line::Channel {
                        name: name.to_string(),
                        url: url.to_string(),
                    })
                }
            })
            .collect();
        Self { lines }
    }

    /// Read and parse a result file; `None` when it does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read result file {}", path.display()))?;
        Ok(Some(Self::parse(&contents)))
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        let mut group: Option<&str> = None;
        self.lines.iter().filter_map(move |line| match line {
            Line::Group(name) => {
                group = Some(name.as_str());
                None
            }
            Line::Channel { name, url } => Some(Row { group, name, url }),
        })
    }

    /// Group headers in file order, including groups without rows.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Line::Group(name) => Some(name.as_str()),
            Line::Channel { .. } => None,
        })
    }

    /// Name of the first real channel, which stands in for the update-time row.
    pub fn first_channel_name(&self) -> Option<&str> {
        self.rows()
            .find(|row| !row.in_update_time_group())
            .map(|row| row.name)
    }

    /// The timestamp recorded in the update-time group, if any.
    pub fn update_time(&self) -> Option<&str> {
        self.rows()
            .find(|row| row.in_update_time_group())
            .map(|row| row.name)
    }

    /**
        Name shown for a row, normalized.

        Rows of the exact update-time group show the first channel's name;
        other groups that merely mention the marker keep their own names.
    */
    pub fn display_name(&self, row: &Row<'_>) -> String {
        let name = if row.group == Some(UPDATE_TIME_GROUP) {
            self.first_channel_name().unwrap_or(row.name)
        } else {
            row.name
        };
        normalize_channel_name(name)
    }
}

pub fn is_update_time_group(group: &str) -> bool {
    group.contains(UPDATE_TIME_MARKER)
}

fn cctv_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(CCTV|CETV)-(\d+)(\+.*)?").expect("channel regex should compile"))
}

/// `CCTV-1` → `CCTV1`, `CCTV-5+ 体育赛事` → `CCTV5+`.
pub fn normalize_channel_name(name: &str) -> String {
    cctv_regex()
        .replace_all(name, |caps: &regex::Captures| {
            let suffix = if caps.get(3).is_some() { "+" } else { "" };
            format!("{}{}{}", &caps[1], &caps[2], suffix)
        })
        .into_owned()
}

pub fn logo_url(name: &str) -> String {
    format!("{LOGO_BASE_URL}/{name}.png")
}

/// Serialize as JSON with 4-space indentation, leaving non-ASCII text as-is.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    write_file(path, &to_json_pretty(value)?)
}
