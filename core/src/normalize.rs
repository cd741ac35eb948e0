use crate::constants::{IPV6_LABEL, MULTICAST_MARKER, WHITELIST_LABEL};
use crate::info::{add_info, info_of, split_info};
use crate::record::{IpVersion, Origin};

/**
    A URL in canonical, annotated form together with the bucket it belongs to.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub url: String,
    /// Origin after reclassification (subscribe relays become multicast).
    pub origin: Origin,
    pub ip_version: IpVersion,
}

/**
    Resolve the origin a record is bucketed under.

    Subscription URLs pointing at a multicast relay path count as multicast.
*/
pub fn resolve_origin(url: &str, origin: &Origin) -> Origin {
    if *origin == Origin::Subscribe && url.contains(MULTICAST_MARKER) {
        Origin::Multicast
    } else {
        origin.clone()
    }
}

/**
    Split a whitelist URL into its base and display label.

    The label is whatever follows the first `!` in the metadata, falling back
    to the default whitelist label.
*/
pub fn whitelist_label(url: &str) -> (&str, &str) {
    let (base, info) = split_info(url);
    let label = info
        .split_once('!')
        .map(|(_, label)| label)
        .filter(|label| !label.is_empty())
        .unwrap_or(WHITELIST_LABEL);
    (base, label)
}

/**
    Annotate a raw URL with its source label, IPv6 marker and resolution.

    Whitelist URLs only receive their label and skip every other annotation.
*/
pub fn normalize(url: &str, origin: &Origin, resolution: Option<&str>) -> Normalized {
    if *origin == Origin::Whitelist {
        let (base, label) = whitelist_label(url);
        return Normalized {
            url: add_info(base, label),
            origin: Origin::Whitelist,
            ip_version: IpVersion::of_url(base),
        };
    }

    let origin = resolve_origin(url, origin);

    let mut annotated = url.to_string();
    if info_of(url).is_empty()
        && let Some(name) = origin.display_name()
    {
        annotated = add_info(&annotated, name);
    }

    let ip_version = IpVersion::of_url(url);
    if ip_version == IpVersion::V6 {
        annotated = add_info(&annotated, IPV6_LABEL);
    }

    if let Some(resolution) = resolution.filter(|r| !r.is_empty()) {
        annotated = add_info(&annotated, resolution);
    }

    Normalized {
        url: annotated,
        origin,
        ip_version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist_uses_embedded_label() {
        let n = normalize("http://a.com/x$!CCTV直连", &Origin::Whitelist, Some("1920x1080"));
        assert_eq!(n.url, "http://a.com/x$CCTV直连");
        assert_eq!(n.origin, Origin::Whitelist);
    }

    #[test]
    fn test_whitelist_default_label() {
        let n = normalize("http://a.com/x", &Origin::Whitelist, None);
        assert_eq!(n.url, "http://a.com/x$白名单");
        let n = normalize("http://a.com/x$note", &Origin::Whitelist, None);
        assert_eq!(n.url, "http://a.com/x$白名单");
    }

    #[test]
    fn test_subscribe_multicast_reclassified() {
        let n = normalize("http://a.com/rtp/239.0.0.1:5000", &Origin::Subscribe, None);
        assert_eq!(n.origin, Origin::Multicast);
        assert_eq!(n.url, "http://a.com/rtp/239.0.0.1:5000$组播源");
    }

    #[test]
    fn test_existing_info_skips_display_name() {
        let n = normalize("http://a.com/x$hd", &Origin::Subscribe, Some("1280x720"));
        assert_eq!(n.url, "http://a.com/x$hd-1280x720");
    }

    #[test]
    fn test_ipv6_and_resolution() {
        let n = normalize("http://[2001:db8::1]/x", &Origin::Hotel, Some("1920x1080"));
        assert_eq!(n.ip_version, IpVersion::V6);
        assert_eq!(n.url, "http://[2001:db8::1]/x$酒店源-IPv6-1920x1080");
    }

    #[test]
    fn test_origin_without_display_name() {
        let n = normalize("http://a.com/x", &Origin::Live, None);
        assert_eq!(n.url, "http://a.com/x");
        assert_eq!(n.ip_version, IpVersion::V4);
    }
}
