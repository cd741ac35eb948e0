#![allow(clippy::doc_overindented_list_items)]

mod allocate;
mod dedupe;
mod error;
mod freshness;
mod merge;
mod normalize;
mod policy;
mod record;

pub mod constants;
pub mod info;

pub use self::allocate::allocate;
pub use self::dedupe::{
    DedupeOptions, IdentityKey, IdentityKind, Keyed, Nested, Tree, dedupe, dedupe_nested,
};
pub use self::error::{KeyError, MergeError, ParseError};
pub use self::freshness::{
    effective_recent_days, filter_by_date, select_recent_urls,
};
pub use self::merge::{Mapping, Scalar, Value, merge, merge_into};
pub use self::normalize::{Normalized, normalize, resolve_origin, whitelist_label};
pub use self::policy::{Preferences, QuotaPolicy};
pub use self::record::{
    ChannelRecordSet, IpFilter, IpVersion, Origin, RecordEntry, UrlRecord, contains_any, is_ipv6,
};
