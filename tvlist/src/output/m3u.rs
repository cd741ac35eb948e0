use std::path::Path;

use anyhow::Result;
use tracing::warn;

use super::{EPG_URL, ResultFile, Row, Status, logo_url};
use crate::files::write_file;

pub fn header() -> String {
    format!("#EXTM3U x-tvg-url=\"{EPG_URL}\"\n")
}

/// One `#EXTINF` entry plus its URL line.
pub fn entry(display_name: &str, row: &Row<'_>, group: Option<&str>) -> String {
    let mut entry = format!(
        "#EXTINF:-1 tvg-name=\"{name}\" tvg-logo=\"{logo}\"",
        name = display_name,
        logo = logo_url(display_name),
    );
    if let Some(group) = group.filter(|g| !g.is_empty()) {
        entry.push_str(&format!(" group-title=\"{group}\""));
    }
    entry.push_str(&format!(",{}\n{}\n", row.name, row.url));
    entry
}

/// Generate an M3U playlist with one entry per result row.
pub fn generate_m3u(file: &ResultFile) -> String {
    let mut playlist = header();
    for row in file.rows() {
        let name = file.display_name(&row);
        playlist.push_str(&entry(&name, &row, row.group));
    }
    playlist
}

pub fn convert(result_path: &Path, m3u_path: &Path) -> Result<Status> {
    let Some(file) = ResultFile::read(result_path)? else {
        warn!(path = %result_path.display(), "result file missing, skipping M3U");
        return Ok(Status::Skipped);
    };
    write_file(m3u_path, &generate_m3u(&file))?;
    println!("✅ M3U result file generated at: {}", m3u_path.display());
    Ok(Status::Produced)
}
