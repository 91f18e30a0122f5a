//! Canonical request options
//!
//! HTTP requests describe their intent through query strings and headers
//! (`sortBy`, `Range`, `If-Match`, `Placement`...). This module turns them into
//! a single [`Options`] value handed to the backing store.
//!
//! - [`parse`]: pure parsers for the individual pieces (sort, range, conditions)
//! - [`assemble`]: the per-operation composition rule
//!
//! # Example
//!
//! ```rust
//! use store_http::options::{SortDirection, SortSpec};
//!
//! let mut sort = SortSpec::new();
//! sort.insert("name", SortDirection::Ascending);
//! sort.insert("surname", SortDirection::Descending);
//! assert_eq!(sort.len(), 2);
//! assert_eq!(sort.get("surname"), Some(SortDirection::Descending));
//! ```

mod assemble;
mod parse;

pub use assemble::assemble_options;
pub use parse::{parse_conditions, parse_range, parse_sort_by, QueryParams, SORT_PARAM};

use std::fmt;
use std::str::FromStr;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::Error;

/// Sort direction of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    /// +1
    Ascending,
    /// -1
    Descending,
}

impl SortDirection {
    /// Numeric form used on the wire (+1 / -1)
    #[must_use]
    pub const fn as_i8(&self) -> i8 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

impl Serialize for SortDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

/// Ordered field -> direction mapping
///
/// Keeps first-insertion order; inserting an existing field replaces its
/// direction in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    fields: Vec<(String, SortDirection)>,
}

impl SortSpec {
    /// Create an empty sort specification
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field
    pub fn insert(&mut self, field: impl Into<String>, direction: SortDirection) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = direction,
            None => self.fields.push((field, direction)),
        }
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.insert(field, direction);
        self
    }

    /// Direction for a field, if present
    #[must_use]
    pub fn get(&self, field: &str) -> Option<SortDirection> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, direction)| *direction)
    }

    /// Iterate fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.fields.iter().map(|(name, dir)| (name.as_str(), *dir))
    }

    /// Number of sort fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no sort field is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, direction) in &self.fields {
            map.serialize_entry(field, direction)?;
        }
        map.end()
    }
}

/// Pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    /// Records to skip
    pub skip: u64,
    /// Maximum records to return; `None` means open-ended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl Range {
    /// A bounded window
    #[must_use]
    pub const fn bounded(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit: Some(limit),
        }
    }

    /// A window with no upper bound
    #[must_use]
    pub const fn unbounded(skip: u64) -> Self {
        Self { skip, limit: None }
    }
}

/// Free-form query conditions, values kept as raw strings
///
/// Same ordering rules as [`SortSpec`]: first-insertion order, later
/// duplicates replace the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    entries: Vec<(String, String)>,
}

impl Conditions {
    /// Create an empty condition set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a condition
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Raw value for a field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate conditions in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of conditions
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no condition is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Conditions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, value) in &self.entries {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

/// Where a written record belongs in an ordered collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementMode {
    /// First position
    Start,
    /// Last position
    End,
    /// Right after another record
    After,
}

impl fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::End => write!(f, "end"),
            Self::After => write!(f, "after"),
        }
    }
}

impl FromStr for PlacementMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "after" => Ok(Self::After),
            other => Err(Error::BadRequest(format!(
                "Placement must be start, end or after, got: {other}"
            ))),
        }
    }
}

/// Placement hint for writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Placement mode
    pub mode: PlacementMode,
    /// Anchor record for [`PlacementMode::After`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_id: Option<String>,
}

/// Parsed representation of a request's sort/range/condition/placement intent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Options {
    /// Sort fields, in priority order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,

    /// Pagination window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,

    /// Raw query conditions
    #[serde(skip_serializing_if = "Conditions::is_empty")]
    pub conditions: Conditions,

    /// `Some(true)`: the record must exist; `Some(false)`: it must not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,

    /// Ordering hint for writes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,

    /// Remove the returned records once the query completes
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub delete_after_query: bool,
}

impl Options {
    /// Whether the request asked for a pagination window
    #[must_use]
    pub fn has_range(&self) -> bool {
        self.range.is_some()
    }

    /// Records to skip, 0 when no window was requested
    #[must_use]
    pub fn skip(&self) -> u64 {
        self.range.map(|r| r.skip).unwrap_or(0)
    }

    /// Record limit, `None` when open-ended or not requested
    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        self.range.and_then(|r| r.limit)
    }
}
