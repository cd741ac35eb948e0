use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::constants::DEFAULT_RECENT_DAYS;
use crate::record::RecordEntry;

/// The configured window, or the default when it is not a positive number of days.
pub fn effective_recent_days(configured: i64) -> i64 {
    if configured > 0 {
        configured
    } else {
        DEFAULT_RECENT_DAYS
    }
}

/**
    Reduce a channel's entries to a candidate set that prefers recent captures.

    Entries captured after `today - recent_days` are recent; captures on the
    cutoff date itself, undated and malformed dates are stale. If nothing is recent the stale set is returned
    as-is. If fewer than `limit` entries are recent, stale entries are
    appended in their original order until `limit` is reached. Otherwise the
    recent set is returned without truncation.
*/
pub fn filter_by_date(
    entries: Vec<RecordEntry>,
    recent_days: i64,
    limit: usize,
    today: NaiveDate,
) -> Vec<RecordEntry> {
    let days = effective_recent_days(recent_days) as u64;
    let cutoff = today.checked_sub_days(Days::new(days));

    let (mut recent, stale): (Vec<_>, Vec<_>) = entries.into_iter().partition(|entry| {
        match (entry.record.capture_date(), cutoff) {
            (Some(date), Some(cutoff)) => date > cutoff,
            (Some(_), None) => true,
            (None, _) => false,
        }
    });

    debug!(
        recent = recent.len(),
        stale = stale.len(),
        days,
        "partitioned entries by capture date"
    );

    if recent.is_empty() {
        return stale;
    }
    if recent.len() < limit {
        let missing = limit - recent.len();
        recent.extend(stale.into_iter().take(missing));
    }
    recent
}

/**
    Pick at most `limit` distinct URLs from entries already sorted upstream.

    The date filter only kicks in when there are more entries than `limit`.
*/
pub fn select_recent_urls(
    entries: &[RecordEntry],
    recent_days: i64,
    limit: usize,
    today: NaiveDate,
) -> Vec<String> {
    let candidates = if entries.len() > limit {
        filter_by_date(entries.to_vec(), recent_days, limit, today)
    } else {
        entries.to_vec()
    };

    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .map(|entry| entry.record.url)
        .filter(|url| seen.insert(url.clone()))
        .take(limit)
        .collect()
}
