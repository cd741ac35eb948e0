use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;

/// Where `write_content` puts new content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Top,
    Append,
}

/// Prefer a `user_`-prefixed sibling of `path` when one exists.
pub fn real_path(path: &Path) -> PathBuf {
    let Some(name) = path.file_name() else {
        return path.to_path_buf();
    };
    let mut user_name = std::ffi::OsString::from("user_");
    user_name.push(name);
    let user_path = path.with_file_name(user_name);
    if user_path.exists() {
        user_path
    } else {
        path.to_path_buf()
    }
}

/// Trimmed lines of the file, skipping blanks and `#` comments. A missing file is empty.
pub fn lines_from_file(path: &Path) -> Result<Vec<String>> {
    let path = real_path(path);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Split a `name,url` line. Both halves must be non-empty.
pub fn parse_name_url(line: &str) -> Option<(&str, &str)> {
    let (name, url) = line.split_once([',', '，'])?;
    let (name, url) = (name.trim(), url.trim());
    if name.is_empty() || url.is_empty() || url == "#genre#" {
        return None;
    }
    Some((name, url))
}

/**
    Read `name,url` lines into a name → URLs map, in file order.

    Comments, group headers and malformed lines are skipped, and a URL
    repeated under the same name is kept once.
*/
pub fn name_urls_from_file(path: &Path) -> Result<IndexMap<String, Vec<String>>> {
    let mut name_urls: IndexMap<String, Vec<String>> = IndexMap::new();
    for line in lines_from_file(path)? {
        let Some((name, url)) = parse_name_url(&line) else {
            continue;
        };
        let urls = name_urls.entry(name.to_string()).or_default();
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    Ok(name_urls)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/**
    Add `content` to a text file.

    `Top` puts `content` and a newline before the existing text; `Append`
    adds it at the end as-is.
*/
pub fn write_content(path: &Path, content: &str, position: Position) -> Result<()> {
    ensure_parent(path)?;
    match position {
        Position::Top => {
            let existing = if path.exists() {
                fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?
            } else {
                String::new()
            };
            fs::write(path, format!("{content}\n{existing}"))
                .with_context(|| format!("Failed to write {}", path.display()))
        }
        Position::Append => {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("Failed to append to {}", path.display()))
        }
    }
}

/**
    Put the staged file in place of the final one.

    The staged file is moved, or copied when `copy` is set. Nothing happens
    if the staged file does not exist.
*/
pub fn replace_file(final_file: &Path, staged: &Path, copy: bool) -> Result<()> {
    if !staged.exists() {
        return Ok(());
    }
    ensure_parent(final_file)?;
    if copy {
        fs::copy(staged, final_file).with_context(|| {
            format!("Failed to copy {} to {}", staged.display(), final_file.display())
        })?;
    } else {
        fs::rename(staged, final_file).with_context(|| {
            format!("Failed to move {} to {}", staged.display(), final_file.display())
        })?;
    }
    Ok(())
}
