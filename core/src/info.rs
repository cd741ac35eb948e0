/*!
    Inline metadata carried after the `$` delimiter of a URL.

    A URL such as `http://host/live.m3u8$1920x1080-IPv6` holds the base URL on
    the left and dash-separated annotations on the right.
*/

use std::sync::OnceLock;

use regex::Regex;

use crate::constants::{CACHE_PREFIX, INFO_DELIMITER, INFO_SEPARATOR, URL_DOMAIN_PATTERN};

/**
    Append an annotation to a URL.

    The first annotation is joined with `$`, later ones with `-`.
    An empty annotation leaves the URL untouched.
*/
pub fn add_info(url: &str, info: &str) -> String {
    if info.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains(INFO_DELIMITER) {
        INFO_SEPARATOR
    } else {
        INFO_DELIMITER
    };
    format!("{url}{separator}{info}")
}

/// Split a URL into its base and metadata at the first `$`.
pub fn split_info(url: &str) -> (&str, &str) {
    url.split_once(INFO_DELIMITER).unwrap_or((url, ""))
}

/// The URL without any inline metadata.
pub fn strip_info(url: &str) -> &str {
    split_info(url).0
}

/// The inline metadata of a URL, empty when absent.
pub fn info_of(url: &str) -> &str {
    split_info(url).1
}

fn domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(URL_DOMAIN_PATTERN).expect("domain regex should compile"))
}

fn cache_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[^a-zA-Z\x{4e00}-\x{9fa5}$]?cache:.*").expect("cache regex should compile")
    })
}

fn resolution_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)[xX*](\d+)").expect("resolution regex should compile"))
}

/// Scheme and host (with port) of the first URL-like span in `url`.
pub fn url_domain(url: &str) -> Option<&str> {
    domain_regex().find(url).map(|m| m.as_str())
}

/**
    Annotate a URL with a `cache:` hint.

    Uses the explicit cache key when given, otherwise the URL's own domain.
    Returns the URL unchanged when neither is available.
*/
pub fn with_cache(url: &str, cache: Option<&str>) -> String {
    let cache = cache
        .filter(|c| !c.is_empty())
        .or_else(|| url_domain(url))
        .unwrap_or_default();
    if cache.is_empty() {
        return url.to_string();
    }
    add_info(url, &format!("{CACHE_PREFIX}{cache}"))
}

/// Remove a `cache:` annotation together with the separator before it.
pub fn strip_cache(url: &str) -> String {
    cache_regex().replace_all(url, "").into_owned()
}

/**
    Pixel count of a `WxH` resolution string, 0 when it cannot be parsed.
*/
pub fn resolution_value(resolution: &str) -> u64 {
    let Some(caps) = resolution_regex().captures(resolution) else {
        return 0;
    };
    let width = caps[1].parse::<u64>().ok();
    let height = caps[2].parse::<u64>().ok();
    match (width, height) {
        (Some(w), Some(h)) => w.checked_mul(h).unwrap_or(0),
        _ => 0,
    }
}
