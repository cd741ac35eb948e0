/// Separator between a URL and its inline metadata.
pub const INFO_DELIMITER: char = '$';

/// Separator between annotations once a URL already carries metadata.
pub const INFO_SEPARATOR: char = '-';

/// Label attached to whitelist records that carry no label of their own.
pub const WHITELIST_LABEL: &str = "白名单";

/// Annotation prefix for cache hints.
pub const CACHE_PREFIX: &str = "cache:";

/// Annotation for URLs whose host is an IPv6 literal.
pub const IPV6_LABEL: &str = "IPv6";

/// Path marker identifying multicast-over-HTTP relays.
pub const MULTICAST_MARKER: &str = "/rtp/";

/// Capture date format used by collection stages.
pub const DATE_FORMAT: &str = "%m-%d-%Y";

/// Window used when the configured recent-days value is not positive.
pub const DEFAULT_RECENT_DAYS: i64 = 30;

/// Bucket name used for every record when no origin preference is set.
pub const ALL_ORIGINS: &str = "all";

/// Scheme + host (+ port) prefix of a URL.
pub const URL_DOMAIN_PATTERN: &str =
    r"((https?|rtmp|rtsp|udp|rtp)://)?(\[[0-9a-fA-F:]+\]|([\w-]+\.)+[\w-]+)(:[0-9]{1,5})?";

/**
    Display names appended to URLs that arrive without inline metadata.

    Origins missing from this table get no source annotation.
*/
pub const ORIGIN_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("hotel", "酒店源"),
    ("multicast", "组播源"),
    ("subscribe", "订阅源"),
    ("online_search", "关键字源"),
    ("local", "本地源"),
    ("whitelist", WHITELIST_LABEL),
];

/// Look up the display name for an origin tag.
pub fn origin_display_name(tag: &str) -> Option<&'static str> {
    ORIGIN_DISPLAY_NAMES
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, display)| *display)
}
