//! # Filter State Store
//!
//! Holds the active filter state and keeps two external copies in sync:
//! the URL query string and a persisted JSON blob.
//!
//! Both copies sit behind small adapter traits so the store can run
//! against a browser, a database, or the in-memory fakes shipped here.
//!
//! ## Invariants
//!
//! - The state only holds known filter ids with non-default values
//! - Every mutation writes the query string and the blob
//! - On hydrate, URL parameters win over the persisted blob

use crate::codec::{decode_value, parse_query_string, to_query_string};
use crate::{ActiveFilterState, FilterBar, FilterDefinition, FilterValue, TesseraError};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

// =============================================================================
// ADAPTERS
// =============================================================================

/// Durable storage for the serialized state blob.
pub trait PersistenceAdapter: Send + Sync {
    /// The stored blob, if any.
    fn load(&self) -> Result<Option<String>, TesseraError>;

    /// Replace the stored blob.
    fn save(&self, blob: &str) -> Result<(), TesseraError>;

    /// Delete the stored blob.
    fn remove(&self) -> Result<(), TesseraError>;
}

/// Access to the page's query string.
pub trait QueryStringAdapter: Send + Sync {
    /// The current query string (with or without a leading `?`).
    fn read(&self) -> String;

    /// Replace the query string.
    fn write(&self, query: &str);
}

/// In-memory blob storage. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage(Arc<Mutex<Option<String>>>);

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage that already holds a blob.
    #[must_use]
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self(Arc::new(Mutex::new(Some(blob.into()))))
    }

    /// The currently stored blob.
    #[must_use]
    pub fn blob(&self) -> Option<String> {
        self.0.lock().ok().and_then(|slot| slot.clone())
    }
}

impl PersistenceAdapter for MemoryStorage {
    fn load(&self) -> Result<Option<String>, TesseraError> {
        let slot = self
            .0
            .lock()
            .map_err(|e| TesseraError::StorageError(e.to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, blob: &str) -> Result<(), TesseraError> {
        let mut slot = self
            .0
            .lock()
            .map_err(|e| TesseraError::StorageError(e.to_string()))?;
        *slot = Some(blob.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), TesseraError> {
        let mut slot = self
            .0
            .lock()
            .map_err(|e| TesseraError::StorageError(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}

/// In-memory query string. Clones share the same string.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueryString(Arc<Mutex<String>>);

impl MemoryQueryString {
    /// Create an empty query string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a query string with initial contents.
    #[must_use]
    pub fn with_query(query: impl Into<String>) -> Self {
        Self(Arc::new(Mutex::new(query.into())))
    }
}

impl QueryStringAdapter for MemoryQueryString {
    fn read(&self) -> String {
        self.0.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn write(&self, query: &str) {
        if let Ok(mut q) = self.0.lock() {
            *q = query.to_string();
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// The active filter state plus its synchronized copies.
pub struct FilterStateStore {
    bars: Vec<FilterBar>,
    definitions: Vec<FilterDefinition>,
    state: ActiveFilterState,
    storage: Box<dyn PersistenceAdapter>,
    query: Box<dyn QueryStringAdapter>,
}

impl std::fmt::Debug for FilterStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStateStore")
            .field("bars", &self.bars.len())
            .field("definitions", &self.definitions.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl FilterStateStore {
    /// Create a store with an empty state. Call [`Self::hydrate`] to load
    /// the external copies.
    #[must_use]
    pub fn new(
        bars: Vec<FilterBar>,
        storage: Box<dyn PersistenceAdapter>,
        query: Box<dyn QueryStringAdapter>,
    ) -> Self {
        let definitions = bars.iter().flat_map(|b| b.filters.iter().cloned()).collect();
        Self {
            bars,
            definitions,
            state: ActiveFilterState::new(),
            storage,
            query,
        }
    }

    /// Create a store backed by fresh in-memory adapters.
    #[must_use]
    pub fn in_memory(bars: Vec<FilterBar>) -> Self {
        Self::new(
            bars,
            Box::new(MemoryStorage::new()),
            Box::new(MemoryQueryString::new()),
        )
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &ActiveFilterState {
        &self.state
    }

    /// The filter bars.
    #[must_use]
    pub fn bars(&self) -> &[FilterBar] {
        &self.bars
    }

    /// Every definition, in configuration order.
    #[must_use]
    pub fn definitions(&self) -> &[FilterDefinition] {
        &self.definitions
    }

    /// Look up a definition by filter id.
    #[must_use]
    pub fn definition(&self, id: &str) -> Option<&FilterDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// The URL form of the current state.
    #[must_use]
    pub fn query_string(&self) -> String {
        to_query_string(&self.state)
    }

    /// Rebuild the state from the persisted blob and the query string.
    ///
    /// Unknown ids and default values are dropped. A blob that is not a
    /// JSON object is logged and ignored.
    pub fn hydrate(&mut self) {
        let mut state = ActiveFilterState::new();

        for (id, value) in self.load_blob() {
            let Some(def) = self.definition(&id) else {
                continue;
            };
            let value = match value {
                Value::String(raw) => Some(decode_value(def, &raw)),
                other => serde_json::from_value::<FilterValue>(other).ok(),
            };
            match value {
                Some(v) if !def.is_inactive(&v) => state.insert(id, v),
                Some(_) => {}
                None => {
                    tracing::debug!(filter = %id, "ignoring persisted value of unexpected shape");
                }
            }
        }

        for (id, raw) in parse_query_string(&self.query.read()) {
            let Some(def) = self.definition(&id) else {
                continue;
            };
            let value = decode_value(def, &raw);
            if def.is_inactive(&value) {
                state.remove(&id);
            } else {
                state.insert(id, value);
            }
        }

        tracing::debug!(active = state.len(), "filter state hydrated");
        self.state = state;
    }

    fn load_blob(&self) -> Map<String, Value> {
        let raw = match self.storage.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Map::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load persisted filter state");
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                tracing::warn!("persisted filter state is not a JSON object; ignoring");
                Map::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed persisted filter state; ignoring");
                Map::new()
            }
        }
    }

    /// Set a filter. Empty or default values remove the entry.
    ///
    /// Returns `TesseraError::UnknownFilter` if no definition has this id.
    pub fn set(&mut self, id: &str, value: FilterValue) -> Result<(), TesseraError> {
        let def = self
            .definition(id)
            .ok_or_else(|| TesseraError::UnknownFilter(id.to_string()))?;
        if def.is_inactive(&value) {
            self.state.remove(id);
        } else {
            self.state.insert(id, value);
        }
        self.sync();
        Ok(())
    }

    /// Return a filter to its default.
    pub fn reset(&mut self, id: &str) -> Result<(), TesseraError> {
        if self.definition(id).is_none() {
            return Err(TesseraError::UnknownFilter(id.to_string()));
        }
        self.state.remove(id);
        self.sync();
        Ok(())
    }

    /// Return every filter of one bar to its default.
    pub fn clear_bar(&mut self, bar_id: &str) -> Result<(), TesseraError> {
        let bar = self
            .bars
            .iter()
            .find(|b| b.id == bar_id)
            .ok_or_else(|| TesseraError::UnknownFilterBar(bar_id.to_string()))?;
        for def in &bar.filters {
            self.state.remove(&def.id);
        }
        self.sync();
        Ok(())
    }

    /// Return every filter to its default.
    pub fn clear_all(&mut self) {
        self.state.clear();
        self.sync();
    }

    /// Write the state to the query string and the persisted blob. An
    /// all-default state deletes the blob. Storage failures are logged, not
    /// returned.
    fn sync(&self) {
        self.query.write(&self.query_string());
        let saved = if self.state.is_empty() {
            self.storage.remove()
        } else {
            serde_json::to_string(&self.state)
                .map_err(TesseraError::from)
                .and_then(|blob| self.storage.save(&blob))
        };
        if let Err(e) = saved {
            tracing::warn!(error = %e, "failed to persist filter state");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterType;

    struct FailingStorage;

    impl PersistenceAdapter for FailingStorage {
        fn load(&self) -> Result<Option<String>, TesseraError> {
            Err(TesseraError::StorageError("offline".to_string()))
        }

        fn save(&self, _blob: &str) -> Result<(), TesseraError> {
            Err(TesseraError::StorageError("offline".to_string()))
        }

        fn remove(&self) -> Result<(), TesseraError> {
            Err(TesseraError::StorageError("offline".to_string()))
        }
    }

    fn bars() -> Vec<FilterBar> {
        vec![
            FilterBar::new(
                "main",
                vec![
                    FilterDefinition::new("region", FilterType::Dropdown),
                    FilterDefinition::new("valueRange", FilterType::RangeSlider)
                        .with_bounds(0.0, 500.0),
                ],
            ),
            FilterBar::new(
                "extra",
                vec![
                    FilterDefinition::new("q", FilterType::Search),
                    FilterDefinition::new("live", FilterType::Toggle),
                ],
            ),
        ]
    }

    fn store_with(storage: &MemoryStorage, query: &MemoryQueryString) -> FilterStateStore {
        FilterStateStore::new(bars(), Box::new(storage.clone()), Box::new(query.clone()))
    }

    #[test]
    fn set_syncs_both_copies() {
        let storage = MemoryStorage::new();
        let query = MemoryQueryString::new();
        let mut store = store_with(&storage, &query);

        store
            .set("region", FilterValue::list(["north", "south"]))
            .expect("known filter");

        assert_eq!(query.read(), "region=north%2Csouth");
        assert_eq!(storage.blob().as_deref(), Some(r#"{"region":["north","south"]}"#));
    }

    #[test]
    fn set_default_removes_entry() {
        let mut store = FilterStateStore::in_memory(bars());
        store
            .set("valueRange", FilterValue::Range(10.0, 20.0))
            .expect("set");
        store
            .set("valueRange", FilterValue::Range(0.0, 500.0))
            .expect("set");
        assert!(store.state().is_empty());
    }

    #[test]
    fn set_unknown_filter_fails() {
        let mut store = FilterStateStore::in_memory(bars());
        let err = store
            .set("nope", FilterValue::Flag(true))
            .expect_err("unknown");
        assert!(matches!(err, TesseraError::UnknownFilter(id) if id == "nope"));
    }

    #[test]
    fn clear_bar_only_touches_its_filters() {
        let mut store = FilterStateStore::in_memory(bars());
        store.set("region", FilterValue::list(["north"])).expect("set");
        store.set("q", FilterValue::text("rev")).expect("set");

        store.clear_bar("main").expect("known bar");
        assert!(!store.state().contains("region"));
        assert!(store.state().contains("q"));

        assert!(matches!(
            store.clear_bar("nope"),
            Err(TesseraError::UnknownFilterBar(_))
        ));
    }

    #[test]
    fn clear_all_empties_query_string_and_storage() {
        let storage = MemoryStorage::new();
        let query = MemoryQueryString::new();
        let mut store = store_with(&storage, &query);
        store.set("live", FilterValue::Flag(true)).expect("set");
        store.clear_all();
        assert_eq!(query.read(), "");
        assert_eq!(storage.blob(), None);
    }

    #[test]
    fn hydrate_prefers_url_over_storage() {
        let storage = MemoryStorage::with_blob(r#"{"region":["east"],"q":"rev"}"#);
        let query = MemoryQueryString::with_query("?region=north");
        let mut store = store_with(&storage, &query);
        store.hydrate();

        assert_eq!(store.state().get("region"), Some(&FilterValue::list(["north"])));
        assert_eq!(store.state().get("q"), Some(&FilterValue::text("rev")));
    }

    #[test]
    fn hydrate_drops_unknown_and_default_values() {
        let storage = MemoryStorage::with_blob(r#"{"gone":"x","valueRange":[0,500],"live":true}"#);
        let mut store = store_with(&storage, &MemoryQueryString::new());
        store.hydrate();

        assert_eq!(store.state().len(), 1);
        assert_eq!(store.state().get("live"), Some(&FilterValue::Flag(true)));
    }

    #[test]
    fn hydrate_url_default_clears_stored_value() {
        let storage = MemoryStorage::with_blob(r#"{"live":true}"#);
        let query = MemoryQueryString::with_query("live=false");
        let mut store = store_with(&storage, &query);
        store.hydrate();
        assert!(store.state().is_empty());
    }

    #[test]
    fn malformed_blob_is_empty_state() {
        let storage = MemoryStorage::with_blob("{not json");
        let mut store = store_with(&storage, &MemoryQueryString::new());
        store.hydrate();
        assert!(store.state().is_empty());
    }

    #[test]
    fn storage_failures_do_not_propagate() {
        let mut store = FilterStateStore::new(
            bars(),
            Box::new(FailingStorage),
            Box::new(MemoryQueryString::with_query("q=rev")),
        );
        store.hydrate();
        assert_eq!(store.state().get("q"), Some(&FilterValue::text("rev")));
        store.set("live", FilterValue::Flag(true)).expect("save errors are logged");
        assert_eq!(store.state().len(), 2);
    }
}
