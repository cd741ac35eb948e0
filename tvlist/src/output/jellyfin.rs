use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use tracing::warn;

use super::m3u::{entry, header};
use super::{ResultFile, Status, is_update_time_group};
use crate::files::write_file;

/**
    M3U for media servers that expect one entry per channel.

    The update-time group and rows outside any group are left out, and only
    the first row of each normalized channel name is kept.
*/
pub fn generate_jellyfin_m3u(file: &ResultFile) -> String {
    let mut playlist = header();
    let mut names: HashSet<String> = HashSet::new();
    for row in file.rows() {
        let Some(group) = row.group.filter(|g| !is_update_time_group(g)) else {
            continue;
        };
        let name = file.display_name(&row);
        if !names.insert(name.clone()) {
            continue;
        }
        playlist.push_str(&entry(&name, &row, Some(group)));
    }
    playlist
}

pub fn convert(result_path: &Path, jellyfin_path: &Path) -> Result<Status> {
    let Some(file) = ResultFile::read(result_path)? else {
        warn!(path = %result_path.display(), "result file missing, skipping Jellyfin M3U");
        return Ok(Status::Skipped);
    };
    write_file(jellyfin_path, &generate_jellyfin_m3u(&file))?;
    println!(
        "✅ Save One M3U result file generated at: {}",
        jellyfin_path.display()
    );
    Ok(Status::Produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::SAMPLE;

    #[test]
    fn test_one_entry_per_channel() {
        let playlist = generate_jellyfin_m3u(&ResultFile::parse(SAMPLE));
        assert!(!playlist.contains("更新时间"));
        assert_eq!(playlist.matches("tvg-name=\"CCTV1\"").count(), 1);
        assert!(playlist.contains("http://1.0.0.1/cctv1"));
        assert!(!playlist.contains("http://1.0.0.2/cctv1"));
        assert_eq!(playlist.matches("#EXTINF").count(), 3);
    }

    #[test]
    fn test_rows_outside_groups_dropped() {
        let playlist = generate_jellyfin_m3u(&ResultFile::parse(
            "CCTV-2,http://x/2\n央视频道,#genre#\nCCTV-3,http://x/3\n",
        ));
        assert!(!playlist.contains("http://x/2"));
        assert!(playlist.contains("http://x/3"));
    }
}
