use std::collections::HashMap;

use crate::constants::ALL_ORIGINS;
use crate::record::{IpVersion, Origin};

/**
    Limits and switches applied by the quota allocator.

    Per-origin and per-IP-version limits fall back to `total_limit` when a
    key is not configured.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub total_limit: usize,
    pub ipv_limits: HashMap<IpVersion, usize>,
    /// Keyed by origin tag; `"all"` addresses the single bucket used without origin preferences.
    pub origin_limits: HashMap<String, usize>,
    /// Run the back-fill pass when the primary pass leaves room.
    pub allow_supply: bool,
    /// Keep inline metadata on returned URLs.
    pub include_info: bool,
}

impl QuotaPolicy {
    pub fn new(total_limit: usize) -> Self {
        Self {
            total_limit,
            ipv_limits: HashMap::new(),
            origin_limits: HashMap::new(),
            allow_supply: true,
            include_info: true,
        }
    }

    pub fn with_ipv_limit(mut self, version: IpVersion, limit: usize) -> Self {
        self.ipv_limits.insert(version, limit);
        self
    }

    pub fn with_origin_limit(mut self, origin: impl Into<String>, limit: usize) -> Self {
        self.origin_limits.insert(origin.into(), limit);
        self
    }

    pub fn with_supply(mut self, allow: bool) -> Self {
        self.allow_supply = allow;
        self
    }

    pub fn with_info(mut self, include: bool) -> Self {
        self.include_info = include;
        self
    }

    pub fn ipv_limit(&self, version: IpVersion) -> usize {
        self.ipv_limits
            .get(&version)
            .copied()
            .unwrap_or(self.total_limit)
    }

    pub fn origin_limit(&self, tag: &str) -> usize {
        self.origin_limits
            .get(tag)
            .copied()
            .unwrap_or(self.total_limit)
    }
}

/**
    Preference orders for IP families and origins.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    pub ip_versions: Vec<IpVersion>,
    /// Empty means no origin preference: every record shares one bucket.
    pub origins: Vec<Origin>,
}

impl Preferences {
    pub fn new(ip_versions: Vec<IpVersion>, origins: Vec<Origin>) -> Self {
        Self {
            ip_versions,
            origins,
        }
    }

    pub fn origin_preference_active(&self) -> bool {
        !self.origins.is_empty()
    }

    /**
        Bucket names in allocation order, without repeats.

        Yields the single `"all"` bucket when no origin preference is set.
    */
    pub fn bucket_order(&self) -> Vec<String> {
        if !self.origin_preference_active() {
            return vec![ALL_ORIGINS.to_string()];
        }
        let mut order: Vec<String> = Vec::with_capacity(self.origins.len());
        for origin in &self.origins {
            let tag = origin.as_str();
            if !order.iter().any(|o| o == tag) {
                order.push(tag.to_string());
            }
        }
        order
    }

    /// The preference order followed by any IP family it leaves out.
    pub fn supply_versions(&self) -> Vec<IpVersion> {
        let mut versions: Vec<IpVersion> = Vec::with_capacity(2);
        for version in self.ip_versions.iter().chain(IpVersion::ALL.iter()) {
            if !versions.contains(version) {
                versions.push(*version);
            }
        }
        versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_default_to_total() {
        let policy = QuotaPolicy::new(8)
            .with_ipv_limit(IpVersion::V6, 2)
            .with_origin_limit("hotel", 3);
        assert_eq!(policy.ipv_limit(IpVersion::V4), 8);
        assert_eq!(policy.ipv_limit(IpVersion::V6), 2);
        assert_eq!(policy.origin_limit("hotel"), 3);
        assert_eq!(policy.origin_limit("subscribe"), 8);
        assert_eq!(policy.origin_limit("all"), 8);
    }

    #[test]
    fn test_bucket_order() {
        let prefs = Preferences::default();
        assert_eq!(prefs.bucket_order(), vec!["all"]);

        let prefs = Preferences::new(
            vec![IpVersion::V4],
            vec![Origin::Hotel, Origin::Subscribe, Origin::Hotel],
        );
        assert_eq!(prefs.bucket_order(), vec!["hotel", "subscribe"]);
    }

    #[test]
    fn test_supply_versions() {
        let prefs = Preferences::new(vec![IpVersion::V6], vec![]);
        assert_eq!(prefs.supply_versions(), vec![IpVersion::V6, IpVersion::V4]);
        let prefs = Preferences::default();
        assert_eq!(prefs.supply_versions(), vec![IpVersion::V4, IpVersion::V6]);
    }
}
