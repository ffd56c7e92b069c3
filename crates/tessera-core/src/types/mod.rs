//! # Core Type Definitions
//!
//! This module contains the data model shared by every stage of the engine:
//! - Component descriptors (`ComponentDescriptor`)
//! - Filter values and the active filter state (`FilterValue`, `ActiveFilterState`)
//! - Filter configuration (`FilterDefinition`, `FilterBar`, `DashboardConfig`)
//! - Error types (`TesseraError`)
//!
//! ## Determinism Guarantees
//!
//! - Maps are `BTreeMap`/`BTreeSet` (or order-preserving JSON maps), so
//!   iteration order never depends on hashing
//! - Components are never mutated by filtering; the engine only borrows them

mod definition;

pub use definition::{
    AffectsComponents, DEFAULT_BAR_ID, DashboardConfig, DatePreset, FilterBar, FilterDefinition,
    FilterOption, FilterType,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// COMPONENT DESCRIPTOR
// =============================================================================

/// A loosely typed dashboard tile: `{ id, type, title?, data?, ... }`.
///
/// The descriptor is kept as the raw JSON object so that unknown fields
/// survive a round trip through the engine untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentDescriptor(Map<String, Value>);

impl ComponentDescriptor {
    /// Create a descriptor with an id and a type name.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::String(id.into()));
        fields.insert("type".to_string(), Value::String(kind.into()));
        Self(fields)
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.with_field("title", Value::String(title.into()))
    }

    /// Set the data payload.
    #[must_use]
    pub fn with_data(self, data: Value) -> Self {
        self.with_field("data", data)
    }

    /// Set an arbitrary top-level field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Build a descriptor from a JSON value.
    ///
    /// Returns `TesseraError::InvalidComponent` if the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, TesseraError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(TesseraError::InvalidComponent(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// The component id, or `""` when absent.
    #[must_use]
    pub fn id(&self) -> &str {
        self.str_field("id").unwrap_or_default()
    }

    /// The component type name, or `""` when absent.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.str_field("type").unwrap_or_default()
    }

    /// The title, if it is a string.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    /// The `data` payload, if present and not null.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.0.get("data").filter(|v| !v.is_null())
    }

    /// Look up a top-level field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// Human-readable JSON type name, used in error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// FILTER VALUE
// =============================================================================

/// The value a filter can hold.
///
/// Shape is constrained by the owning definition's type:
/// - `dropdown`/`checkbox`: `List`
/// - `search`: `Text`
/// - `rangeSlider`: `Range`
/// - `toggle`: `Flag`
/// - `dateRange`: `List` of two ISO date strings, `""` for an open bound
///
/// Deserialization tries the variants in declaration order, so `[1, 2]`
/// becomes a `Range` and `["a", "b"]` becomes a `List`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Boolean toggle value.
    Flag(bool),
    /// Single number.
    Number(f64),
    /// Inclusive numeric pair `[min, max]`.
    Range(f64, f64),
    /// Free text.
    Text(String),
    /// Selected options, or a `[start, end]` date pair.
    List(Vec<String>),
}

impl FilterValue {
    /// Build a list value.
    #[must_use]
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a `[start, end]` date pair; empty strings are open bounds.
    #[must_use]
    pub fn date_range(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self::List(vec![start.into(), end.into()])
    }

    /// Build free text.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// A value is empty when it carries no constraint at all:
    /// blank text, or a list whose entries are all blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|s| s.trim().is_empty()),
            Self::Flag(_) | Self::Number(_) | Self::Range(..) => false,
        }
    }

    /// The `(start, end)` bounds of a date pair, blank bounds as `None`.
    #[must_use]
    pub fn date_bounds(&self) -> Option<(Option<&str>, Option<&str>)> {
        let Self::List(items) = self else {
            return None;
        };
        let bound = |i: usize| {
            items
                .get(i)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
        };
        Some((bound(0), bound(1)))
    }
}

// =============================================================================
// ACTIVE FILTER STATE
// =============================================================================

/// Filter id → value, holding only filters that differ from their default.
///
/// Absence of a key means "default". Keys iterate in sorted order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveFilterState(BTreeMap<String, FilterValue>);

impl ActiveFilterState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, value: FilterValue) -> Self {
        self.0.insert(id.into(), value);
        self
    }

    /// Get the value for a filter id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FilterValue> {
        self.0.get(id)
    }

    /// Set the value for a filter id.
    pub fn insert(&mut self, id: impl Into<String>, value: FilterValue) {
        self.0.insert(id.into(), value);
    }

    /// Remove a filter id, returning its previous value.
    pub fn remove(&mut self, id: &str) -> Option<FilterValue> {
        self.0.remove(id)
    }

    /// Check whether a filter id is active.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// Number of active filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when every filter is at its default.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in filter-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Keep only entries matching the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &FilterValue) -> bool) {
        self.0.retain(|k, v| keep(k, v));
    }
}

impl FromIterator<(String, FilterValue)> for ActiveFilterState {
    fn from_iter<T: IntoIterator<Item = (String, FilterValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// FILTER RESULT
// =============================================================================

/// One component excluded by one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exclusion {
    pub component_id: String,
    pub filter_id: String,
}

/// Output of a traced filter pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterResult {
    /// Retained components, in input order.
    pub components: Vec<ComponentDescriptor>,
    /// Which filter excluded which component (first failing filter only).
    pub exclusions: Vec<Exclusion>,
}

impl FilterResult {
    /// Ids of the retained components.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.components.iter().map(ComponentDescriptor::id).collect()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in Tessera.
///
/// Matching itself never fails; these cover configuration, state updates
/// and the storage boundary.
#[derive(Debug, Error)]
pub enum TesseraError {
    /// A component descriptor was not a JSON object.
    #[error("Invalid component: {0}")]
    InvalidComponent(String),

    /// A state update referenced a filter id with no definition.
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// A clear request referenced a filter bar that does not exist.
    #[error("Unknown filter bar: {0}")]
    UnknownFilterBar(String),

    /// The dashboard or application configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The persistence backend failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<serde_json::Error> for TesseraError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
