/*!
    Quota-based URL selection for a single channel.

    Records are bucketed by origin and IP family, then drained in preference
    order under per-origin, per-family and total limits. An optional supply
    pass relaxes the per-family limits to fill whatever room is left.
*/

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::info::strip_info;
use crate::normalize::{normalize, resolve_origin};
use crate::policy::{Preferences, QuotaPolicy};
use crate::record::{IpVersion, Origin, UrlRecord};

/// Candidates of one origin, split by IP family, in upstream order.
#[derive(Debug, Default)]
struct Bucket {
    ipv4: Vec<String>,
    ipv6: Vec<String>,
}

impl Bucket {
    fn get(&self, version: IpVersion) -> &[String] {
        match version {
            IpVersion::V4 => &self.ipv4,
            IpVersion::V6 => &self.ipv6,
        }
    }

    fn push(&mut self, version: IpVersion, url: String) {
        match version {
            IpVersion::V4 => self.ipv4.push(url),
            IpVersion::V6 => self.ipv6.push(url),
        }
    }
}

/// Ordered output that never holds two URLs with the same base.
#[derive(Debug, Default)]
struct Selection {
    urls: Vec<String>,
    bases: HashSet<String>,
}

impl Selection {
    fn len(&self) -> usize {
        self.urls.len()
    }

    fn push(&mut self, url: &str) -> bool {
        if self.bases.insert(strip_info(url).to_string()) {
            self.urls.push(url.to_string());
            true
        } else {
            false
        }
    }

    /// Add up to `n` new URLs from the front of `urls`, returning how many were added.
    fn take_from(&mut self, urls: &[String], n: usize) -> usize {
        let mut added = 0;
        for url in urls {
            if added >= n {
                break;
            }
            if self.push(url) {
                added += 1;
            }
        }
        added
    }
}

fn categorize(
    records: &[UrlRecord],
    prefs: &Preferences,
    order: &[String],
    selection: &mut Selection,
) -> IndexMap<String, Bucket> {
    let active = prefs.origin_preference_active();
    let mut buckets: IndexMap<String, Bucket> = order
        .iter()
        .map(|tag| (tag.clone(), Bucket::default()))
        .collect();

    for record in records {
        let Some(origin) = record.origin.as_ref() else {
            continue;
        };

        if *origin == Origin::Whitelist {
            let normalized = normalize(&record.url, origin, None);
            selection.push(&normalized.url);
            continue;
        }

        if active && !buckets.contains_key(resolve_origin(&record.url, origin).as_str()) {
            continue;
        }

        let normalized = normalize(&record.url, origin, record.resolution.as_deref());
        let tag = if active {
            normalized.origin.as_str()
        } else {
            order[0].as_str()
        };
        if let Some(bucket) = buckets.get_mut(tag) {
            bucket.push(normalized.ip_version, normalized.url);
        }
    }

    buckets
}

/**
    Produce the ranked URL list for one channel.

    Whitelist records are taken first and bypass every quota. The primary
    pass walks origins in preference order and, within each, IP families in
    preference order, taking `min(origin room, family room, total room)`
    URLs per bucket. A family whose quota is spent is skipped; an empty
    bucket ends that origin. When `allow_supply` is set and room remains,
    the supply pass takes up to the origin limit from every bucket again,
    ignoring family quotas. The result holds at most `total_limit` URLs
    with distinct bases.

    Records without an origin, or whose origin is not in an active
    preference list, are left out.
*/
pub fn allocate(records: &[UrlRecord], prefs: &Preferences, policy: &QuotaPolicy) -> Vec<String> {
    let total = policy.total_limit;
    let order = prefs.bucket_order();
    let mut selection = Selection::default();
    let buckets = categorize(records, prefs, &order, &mut selection);
    let whitelisted = selection.len();

    let mut ipv_taken: [usize; 2] = [0, 0];
    let slot = |version: IpVersion| match version {
        IpVersion::V4 => 0,
        IpVersion::V6 => 1,
    };

    'origins: for (tag, bucket) in &buckets {
        if selection.len() >= total {
            break;
        }
        let origin_limit = policy.origin_limit(tag);
        let mut origin_taken = 0;

        for &version in &prefs.ip_versions {
            if selection.len() >= total {
                break 'origins;
            }
            let ipv_limit = policy.ipv_limit(version);
            let taken = ipv_taken[slot(version)];
            if taken >= ipv_limit {
                continue;
            }
            let urls = bucket.get(version);
            if urls.is_empty() {
                break;
            }
            let room = origin_limit
                .saturating_sub(origin_taken)
                .min(ipv_limit - taken)
                .min(total.saturating_sub(selection.len()));
            let added = selection.take_from(urls, room);
            origin_taken += added;
            ipv_taken[slot(version)] += added;
        }
    }

    let primary = selection.len();

    if policy.allow_supply && selection.len() < total {
        let versions = prefs.supply_versions();
        'supply: for (tag, bucket) in &buckets {
            let origin_limit = policy.origin_limit(tag);
            for &version in &versions {
                if selection.len() >= total {
                    break 'supply;
                }
                let urls = bucket.get(version);
                let prefix = &urls[..origin_limit.min(urls.len())];
                let room = total - selection.len();
                selection.take_from(prefix, room);
            }
        }
    }

    debug!(
        whitelisted,
        primary = primary - whitelisted,
        supplied = selection.len() - primary,
        total,
        "allocated channel urls"
    );

    let mut urls = selection.urls;
    urls.truncate(total);

    if policy.include_info {
        urls
    } else {
        urls.into_iter()
            .map(|url| strip_info(&url).to_string())
            .collect()
    }
}
