//! # tessera-core
//!
//! The deterministic filter-matching engine for Tessera - THE LOGIC.
//!
//! Given loosely typed dashboard components and a set of typed filters,
//! this crate decides which components stay visible:
//! 1. `classify` infers each component's role (card, time series,
//!    aggregation, generic)
//! 2. `resolve` locates the field a filter should look at
//! 3. `matchers` compare that field with the active filter value
//! 4. `engine` AND-combines every active filter
//!
//! `state`, `storage` and `session` keep the active filter state in sync
//! with a URL query string and a persisted blob.
//!
//! ## Architectural Constraints
//!
//! - Pure, synchronous Rust: no async, no network
//! - Filtering is a pure function of its inputs; components are never
//!   mutated
//! - Permissive: a filter whose field cannot be found never excludes
//! - URL and storage access only through adapter traits

// =============================================================================
// MODULES
// =============================================================================

pub mod classify;
pub mod codec;
pub mod dates;
pub mod engine;
pub mod matchers;
pub mod primitives;
pub mod resolve;
pub mod session;
pub mod state;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ActiveFilterState, AffectsComponents, ComponentDescriptor, DEFAULT_BAR_ID, DashboardConfig,
    DatePreset, Exclusion, FilterBar, FilterDefinition, FilterOption, FilterResult, FilterType,
    FilterValue, TesseraError,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use classify::{Classification, ComponentRole, classify};
pub use engine::{FilterEngine, FilterObserver, NoopObserver, SkipReason};
pub use matchers::{FilterMatcher, Verdict, matcher_for};
pub use resolve::{FieldResolver, ResolverOptions};

// =============================================================================
// RE-EXPORTS: State & Storage
// =============================================================================

pub use codec::{decode_value, encode_value, parse_query_string, to_query_string};
pub use session::{DashboardSession, SharedObserver};
pub use state::{
    FilterStateStore, MemoryQueryString, MemoryStorage, PersistenceAdapter, QueryStringAdapter,
};
pub use storage::RedbStorage;
