//! # Filter Engine
//!
//! Applies the active filter state to a list of components.
//!
//! ## Semantics
//!
//! - Empty state: the input comes back unchanged.
//! - Each component is classified once per pass.
//! - A state entry has no effect when it is empty or equal to its
//!   definition's default, when its id is unknown, when its type has no
//!   matcher, or when the definition's scope leaves the component out.
//! - Remaining filters are AND-combined and evaluation stops at the first
//!   exclusion.
//! - Output order equals input order.
//!
//! Diagnostics go through an injected [`FilterObserver`] instead of any
//! global logger.

use crate::classify::classify;
use crate::matchers::{FilterMatcher, MatchContext, Verdict, matcher_for};
use crate::resolve::{FieldResolver, ResolverOptions};
use crate::{
    ActiveFilterState, ComponentDescriptor, Exclusion, FilterDefinition, FilterResult,
    FilterValue,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// OBSERVER
// =============================================================================

/// Why a filter had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The value is empty or equal to the default.
    Inactive,
    /// No definition has this id.
    UnknownFilter,
    /// The definition's type has no matcher.
    UnknownType,
    /// The definition does not apply to this component.
    OutOfScope,
    /// The component has no field of the needed kind.
    Unresolved,
    /// The value's shape does not fit the filter type.
    ShapeMismatch,
}

impl SkipReason {
    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::UnknownFilter => "unknown_filter",
            Self::UnknownType => "unknown_type",
            Self::OutOfScope => "out_of_scope",
            Self::Unresolved => "unresolved",
            Self::ShapeMismatch => "shape_mismatch",
        }
    }
}

/// Structured diagnostic side channel for a filter pass.
///
/// `component_id` is `None` for skips decided once per pass, before any
/// component is looked at.
pub trait FilterObserver {
    /// A component was excluded by a filter.
    fn excluded(&self, component_id: &str, filter_id: &str) {
        let _ = (component_id, filter_id);
    }

    /// A filter had no effect.
    fn skipped(&self, filter_id: &str, component_id: Option<&str>, reason: SkipReason) {
        let _ = (filter_id, component_id, reason);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl FilterObserver for NoopObserver {}

// =============================================================================
// ENGINE
// =============================================================================

/// A filter that survived the per-pass checks.
struct ActiveFilter<'a> {
    id: &'a str,
    definition: &'a FilterDefinition,
    value: &'a FilterValue,
    matcher: &'static dyn FilterMatcher,
}

/// Stateless filter evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEngine {
    resolver: FieldResolver,
}

impl FilterEngine {
    /// Create an engine.
    #[must_use]
    pub const fn new(options: ResolverOptions) -> Self {
        Self {
            resolver: FieldResolver::new(options),
        }
    }

    /// The field resolver used for matching.
    #[must_use]
    pub const fn resolver(&self) -> &FieldResolver {
        &self.resolver
    }

    /// Retained components, in input order.
    #[must_use]
    pub fn apply(
        &self,
        components: &[ComponentDescriptor],
        definitions: &[FilterDefinition],
        state: &ActiveFilterState,
    ) -> Vec<ComponentDescriptor> {
        self.apply_observed(components, definitions, state, &NoopObserver)
            .components
    }

    /// Retained components plus the exclusion trace.
    #[must_use]
    pub fn apply_traced(
        &self,
        components: &[ComponentDescriptor],
        definitions: &[FilterDefinition],
        state: &ActiveFilterState,
    ) -> FilterResult {
        self.apply_observed(components, definitions, state, &NoopObserver)
    }

    /// Like [`Self::apply_traced`], reporting every exclusion and skip to
    /// `observer`.
    pub fn apply_observed(
        &self,
        components: &[ComponentDescriptor],
        definitions: &[FilterDefinition],
        state: &ActiveFilterState,
        observer: &dyn FilterObserver,
    ) -> FilterResult {
        if state.is_empty() {
            return FilterResult {
                components: components.to_vec(),
                exclusions: Vec::new(),
            };
        }

        let active = active_filters(definitions, state, observer);
        let mut result = FilterResult::default();

        for component in components {
            match self.first_failure(component, &active, observer) {
                Some(filter_id) => result.exclusions.push(Exclusion {
                    component_id: component.id().to_string(),
                    filter_id: filter_id.to_string(),
                }),
                None => result.components.push(component.clone()),
            }
        }
        result
    }

    /// Id of the first filter that excludes `component`.
    fn first_failure<'a>(
        &self,
        component: &ComponentDescriptor,
        active: &[ActiveFilter<'a>],
        observer: &dyn FilterObserver,
    ) -> Option<&'a str> {
        let class = classify(component);
        let component_id = component.id();

        for filter in active {
            if !filter.definition.affects_components.includes(component_id) {
                observer.skipped(filter.id, Some(component_id), SkipReason::OutOfScope);
                continue;
            }
            let cx = MatchContext {
                component,
                class,
                filter_id: filter.id,
                resolver: &self.resolver,
            };
            match filter.matcher.evaluate(&cx, filter.value) {
                Verdict::Match => {}
                Verdict::NoMatch => {
                    observer.excluded(component_id, filter.id);
                    return Some(filter.id);
                }
                Verdict::Unconstrained => {
                    observer.skipped(filter.id, Some(component_id), SkipReason::Inactive);
                }
                Verdict::Unresolved => {
                    observer.skipped(filter.id, Some(component_id), SkipReason::Unresolved);
                }
                Verdict::ShapeMismatch => {
                    observer.skipped(filter.id, Some(component_id), SkipReason::ShapeMismatch);
                }
            }
        }
        None
    }
}

/// State entries that can affect at least one component, in id order.
fn active_filters<'a>(
    definitions: &'a [FilterDefinition],
    state: &'a ActiveFilterState,
    observer: &dyn FilterObserver,
) -> Vec<ActiveFilter<'a>> {
    let index: BTreeMap<&str, &FilterDefinition> =
        definitions.iter().map(|d| (d.id.as_str(), d)).collect();

    state
        .iter()
        .filter_map(|(id, value)| {
            let Some(definition) = index.get(id.as_str()).copied() else {
                observer.skipped(id, None, SkipReason::UnknownFilter);
                return None;
            };
            if definition.is_inactive(value) {
                observer.skipped(id, None, SkipReason::Inactive);
                return None;
            }
            let Some(matcher) = matcher_for(definition.kind) else {
                observer.skipped(id, None, SkipReason::UnknownType);
                return None;
            };
            Some(ActiveFilter {
                id,
                definition,
                value,
                matcher,
            })
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
