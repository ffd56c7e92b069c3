//! # Session Module
//!
//! A `DashboardSession` owns one dashboard's components and its filter
//! state, and keeps the visible component list current: every state change
//! re-runs the engine.
//!
//! ## Storage Backends
//!
//! The session is agnostic to where state lives. Pass any
//! `PersistenceAdapter` (`MemoryStorage`, `RedbStorage`) and
//! `QueryStringAdapter`.

use crate::classify::{Classification, classify};
use crate::engine::{FilterEngine, FilterObserver, NoopObserver};
use crate::resolve::ResolverOptions;
use crate::state::{
    FilterStateStore, MemoryQueryString, MemoryStorage, PersistenceAdapter, QueryStringAdapter,
};
use crate::{
    ActiveFilterState, ComponentDescriptor, DashboardConfig, Exclusion, FilterBar,
    FilterDefinition, FilterResult, FilterValue, TesseraError,
};
use std::sync::Arc;

/// Observer shared with a session; must be usable across threads.
pub type SharedObserver = Arc<dyn FilterObserver + Send + Sync>;

/// Components plus filter state, with the filtered view kept up to date.
pub struct DashboardSession {
    components: Vec<ComponentDescriptor>,
    engine: FilterEngine,
    store: FilterStateStore,
    observer: SharedObserver,
    result: FilterResult,
}

impl std::fmt::Debug for DashboardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardSession")
            .field("components", &self.components.len())
            .field("visible", &self.result.components.len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl DashboardSession {
    /// Create a session. The state starts empty; call [`Self::hydrate`] to
    /// load the persisted and URL copies.
    #[must_use]
    pub fn new(
        config: DashboardConfig,
        options: ResolverOptions,
        storage: Box<dyn PersistenceAdapter>,
        query: Box<dyn QueryStringAdapter>,
    ) -> Self {
        let DashboardConfig {
            components,
            filter_bars,
            ..
        } = config;
        let result = FilterResult {
            components: components.clone(),
            exclusions: Vec::new(),
        };
        Self {
            components,
            engine: FilterEngine::new(options),
            store: FilterStateStore::new(filter_bars, storage, query),
            observer: Arc::new(NoopObserver),
            result,
        }
    }

    /// Create a session backed by in-memory adapters.
    #[must_use]
    pub fn in_memory(config: DashboardConfig) -> Self {
        Self::new(
            config,
            ResolverOptions::default(),
            Box::new(MemoryStorage::new()),
            Box::new(MemoryQueryString::new()),
        )
    }

    /// Route engine diagnostics to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    // =========================================================================
    // STATE CHANGES
    // =========================================================================

    /// Load state from storage and the query string, then re-filter.
    pub fn hydrate(&mut self) {
        self.store.hydrate();
        self.refresh();
    }

    /// Set a filter value, then re-filter.
    pub fn set_filter(&mut self, id: &str, value: FilterValue) -> Result<(), TesseraError> {
        self.store.set(id, value)?;
        self.refresh();
        Ok(())
    }

    /// Reset one filter to its default, then re-filter.
    pub fn reset_filter(&mut self, id: &str) -> Result<(), TesseraError> {
        self.store.reset(id)?;
        self.refresh();
        Ok(())
    }

    /// Reset every filter of one bar, then re-filter.
    pub fn clear_bar(&mut self, bar_id: &str) -> Result<(), TesseraError> {
        self.store.clear_bar(bar_id)?;
        self.refresh();
        Ok(())
    }

    /// Reset every filter, then re-filter.
    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.refresh();
    }

    fn refresh(&mut self) {
        self.result = self.engine.apply_observed(
            &self.components,
            self.store.definitions(),
            self.store.state(),
            self.observer.as_ref(),
        );
        tracing::debug!(
            visible = self.result.components.len(),
            excluded = self.result.exclusions.len(),
            active = self.store.state().len(),
            "dashboard re-filtered"
        );
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    /// Components that pass every active filter, in configuration order.
    #[must_use]
    pub fn visible(&self) -> &[ComponentDescriptor] {
        &self.result.components
    }

    /// Which filter hid which component in the last pass.
    #[must_use]
    pub fn exclusions(&self) -> &[Exclusion] {
        &self.result.exclusions
    }

    /// Every component, filtered or not.
    #[must_use]
    pub fn components(&self) -> &[ComponentDescriptor] {
        &self.components
    }

    /// The active filter state.
    #[must_use]
    pub fn state(&self) -> &ActiveFilterState {
        self.store.state()
    }

    /// The filter bars.
    #[must_use]
    pub fn bars(&self) -> &[FilterBar] {
        self.store.bars()
    }

    /// Every filter definition.
    #[must_use]
    pub fn definitions(&self) -> &[FilterDefinition] {
        self.store.definitions()
    }

    /// The URL form of the active state.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.store.query_string()
    }

    /// The engine in use.
    #[must_use]
    pub fn engine(&self) -> &FilterEngine {
        &self.engine
    }

    /// Classification of every component, in configuration order.
    #[must_use]
    pub fn classify_all(&self) -> Vec<(&str, Classification)> {
        self.components
            .iter()
            .map(|c| (c.id(), classify(c)))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
