//! Parsers for sort directives, `Range` headers and query conditions

use std::collections::BTreeSet;
use std::sync::LazyLock;

use axum::extract::Query;
use axum::http::Uri;
use regex::Regex;

use super::{Conditions, Range, SortDirection, SortSpec};
use crate::error::{Error, Result};

/// Query parameter carrying the sort directive
pub const SORT_PARAM: &str = "sortBy";

/// `items=<from>-<to>`, where `<to>` may be empty or `Infinity` for an open range
static RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^items=([0-9]+)-([0-9]+|Infinity)?$").expect("range regex is valid")
});

/// Markers that both include a sort token and select its direction
const SORT_MARKERS: [char; 4] = ['+', '-', '*', ' '];

/// Decoded query-string pairs, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Decode the query string of a request URI
    ///
    /// Form decoding applies, so a literal `+` arrives here as a space.
    pub fn from_uri(uri: &Uri) -> Result<Self> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
            .map_err(|e| Error::BadRequest(format!("Invalid query string: {e}")))?;
        Ok(Self(pairs))
    }

    /// Build from already decoded pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// First value of a parameter
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate all pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse a comma-separated `sortBy` value
///
/// Every token is validated against `sortable`, but only tokens starting with
/// one of `+`, `-`, `*` or a space end up in the result. `-` sorts descending,
/// the other markers ascending. A bare `name` token is checked and dropped.
pub fn parse_sort_by(sort_by: Option<&str>, sortable: &BTreeSet<String>) -> Result<SortSpec> {
    let mut sort = SortSpec::new();

    let Some(sort_by) = sort_by.filter(|s| !s.is_empty()) else {
        return Ok(sort);
    };

    for token in sort_by.split(',') {
        let marker = token.chars().next().filter(|c| SORT_MARKERS.contains(c));
        let field = match marker {
            Some(m) => &token[m.len_utf8()..],
            None => token,
        };

        if !sortable.contains(field) {
            return Err(Error::InvalidSortField(field.to_string()));
        }

        if let Some(m) = marker {
            let direction = if m == '-' {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            sort.insert(field, direction);
        }
    }

    Ok(sort)
}

/// Parse a `Range: items=<from>-<to>` header
///
/// Anything that doesn't match exactly (missing header, stray spaces,
/// numbers that overflow, a window wider than `u64`, `to < from`) falls back to
/// `{skip: 0, limit: default_limit}`.
#[must_use]
pub fn parse_range(header: Option<&str>, default_limit: u64) -> Range {
    let fallback = Range::bounded(0, default_limit);

    let Some(captures) = header.and_then(|h| RANGE_REGEX.captures(h)) else {
        return fallback;
    };

    let Ok(from) = captures[1].parse::<u64>() else {
        return fallback;
    };

    match captures.get(2).map(|m| m.as_str()) {
        None | Some("Infinity") => Range::unbounded(from),
        Some(to) => match to.parse::<u64>() {
            Ok(to) if to >= from => (to - from)
                .checked_add(1)
                .map_or(fallback, |limit| Range::bounded(from, limit)),
            _ => fallback,
        },
    }
}

/// Collect every query parameter except the sort directive
#[must_use]
pub fn parse_conditions(query: &QueryParams) -> Conditions {
    let mut conditions = Conditions::new();
    for (key, value) in query.iter().filter(|(k, _)| *k != SORT_PARAM) {
        conditions.insert(key, value);
    }
    conditions
}
