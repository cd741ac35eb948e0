use core::str::FromStr;
use std::collections::{BTreeMap, HashSet};
use std::mem;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{KeyError, ParseError};
use crate::info::{info_of, strip_info, url_domain};
use crate::record::{RecordEntry, UrlRecord};

/**
    Anything that carries a primary string value (normally a URL) to dedupe on.
*/
pub trait Keyed {
    fn primary(&self) -> &str;
}

impl Keyed for String {
    fn primary(&self) -> &str {
        self
    }
}

impl Keyed for &str {
    fn primary(&self) -> &str {
        self
    }
}

impl Keyed for UrlRecord {
    fn primary(&self) -> &str {
        &self.url
    }
}

impl Keyed for RecordEntry {
    fn primary(&self) -> &str {
        &self.record.url
    }
}

impl<T> Keyed for (String, T) {
    fn primary(&self) -> &str {
        &self.0
    }
}

/**
    Kind of identity key, as named in configuration.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    #[default]
    Base,
    Exact,
    Domain,
    Pattern,
}

impl FromStr for IdentityKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "base" => Ok(Self::Base),
            "exact" => Ok(Self::Exact),
            "domain" => Ok(Self::Domain),
            "pattern" => Ok(Self::Pattern),
            _ => Err(ParseError {
                kind: "identity key",
                value: s.to_owned(),
            }),
        }
    }
}

/**
    How the identity of an item is derived from its primary value.
*/
#[derive(Debug, Clone, Default)]
pub enum IdentityKey {
    /// The primary value without its inline metadata.
    #[default]
    Base,
    /// The whole primary value, metadata included.
    Exact,
    /// The first capture group of a pattern; the whole value when it does not match.
    Pattern(Regex),
    /// The URL's scheme and host; the whole value when none is found.
    Domain,
}

impl IdentityKey {
    /// Compile a pattern key. The pattern must have at least one capture group.
    pub fn pattern(pattern: &str) -> Result<Self, KeyError> {
        let re = Regex::new(pattern).map_err(|source| KeyError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        if re.captures_len() < 2 {
            return Err(KeyError::MissingGroup(pattern.to_string()));
        }
        Ok(Self::Pattern(re))
    }

    pub fn identity<'a>(&self, value: &'a str) -> &'a str {
        match self {
            Self::Base => strip_info(value),
            Self::Exact => value,
            Self::Pattern(re) => re
                .captures(value)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .unwrap_or(value),
            Self::Domain => url_domain(value).unwrap_or(value),
        }
    }
}

/**
    Options shared by every dedupe call of one pass.
*/
#[derive(Debug, Clone, Default)]
pub struct DedupeOptions {
    pub key: IdentityKey,
    /// Items whose inline metadata starts with this prefix are dropped outright.
    pub exclude_info_prefix: Option<String>,
}

impl DedupeOptions {
    fn is_excluded(&self, value: &str) -> bool {
        match self.exclude_info_prefix.as_deref() {
            Some(prefix) => {
                let info = info_of(value);
                !info.is_empty() && info.starts_with(prefix)
            }
            None => false,
        }
    }
}

/**
    Keep the first occurrence of every identity, in order.

    `seen` is updated in place, so identities recorded by earlier calls
    suppress later items too. Pass a fresh set to dedupe in isolation.
*/
pub fn dedupe<T: Keyed>(
    items: Vec<T>,
    seen: &mut HashSet<String>,
    options: &DedupeOptions,
) -> Vec<T> {
    let before = items.len();
    let unique: Vec<T> = items
        .into_iter()
        .filter(|item| {
            let value = item.primary();
            if options.is_excluded(value) {
                return false;
            }
            seen.insert(options.key.identity(value).to_string())
        })
        .collect();
    trace!(before, after = unique.len(), "deduped list");
    unique
}

/**
    A structure of maps whose leaves are lists of keyed items.
*/
pub trait Nested {
    type Item: Keyed;

    /// Dedupe every leaf list in traversal order, sharing `seen`.
    fn dedupe_leaves(&mut self, seen: &mut HashSet<String>, options: &DedupeOptions);
}

impl<T: Keyed> Nested for Vec<T> {
    type Item = T;

    fn dedupe_leaves(&mut self, seen: &mut HashSet<String>, options: &DedupeOptions) {
        *self = dedupe(mem::take(self), seen, options);
    }
}

impl<N: Nested> Nested for IndexMap<String, N> {
    type Item = N::Item;

    fn dedupe_leaves(&mut self, seen: &mut HashSet<String>, options: &DedupeOptions) {
        for value in self.values_mut() {
            value.dedupe_leaves(seen, options);
        }
    }
}

impl<N: Nested> Nested for BTreeMap<String, N> {
    type Item = N::Item;

    fn dedupe_leaves(&mut self, seen: &mut HashSet<String>, options: &DedupeOptions) {
        for value in self.values_mut() {
            value.dedupe_leaves(seen, options);
        }
    }
}

/**
    Mapping whose nesting depth is only known at runtime.
*/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tree<T> {
    Leaf(Vec<T>),
    Branch(IndexMap<String, Tree<T>>),
}

impl<T: Keyed> Nested for Tree<T> {
    type Item = T;

    fn dedupe_leaves(&mut self, seen: &mut HashSet<String>, options: &DedupeOptions) {
        match self {
            Self::Leaf(items) => items.dedupe_leaves(seen, options),
            Self::Branch(map) => {
                for value in map.values_mut() {
                    value.dedupe_leaves(seen, options);
                }
            }
        }
    }
}

/**
    Dedupe every list leaf of a nested structure with one shared `seen` set.

    Identical identities in different branches collapse to the first one
    encountered in traversal order.
*/
pub fn dedupe_nested<N: Nested>(data: &mut N, seen: &mut HashSet<String>, options: &DedupeOptions) {
    data.dedupe_leaves(seen, options);
}
