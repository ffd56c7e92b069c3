//! # Field Resolver
//!
//! Locates the value a filter should be compared against inside a
//! component's loosely shaped `data`.
//!
//! Each intent (date, category, numeric, boolean) walks its search plan
//! (see [`plan`]) and stops at the first candidate its acceptor takes:
//! - date: anything coercible to a timestamp
//! - category: any non-null value except the empty string
//! - numeric: JSON numbers
//! - boolean: JSON booleans, plus `status` strings (`"active"` is true)
//!
//! Resolution never fails. `None` tells the caller to skip the filter for
//! this component rather than exclude it.

pub mod plan;

use crate::classify::Classification;
use crate::dates::value_millis;
use crate::ComponentDescriptor;
use plan::{Candidate, Intent, Target, plan_for, walk};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tunables for field resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverOptions {
    /// Fall back to the component's type name when no category field is
    /// found. With `false`, category filters skip such components instead.
    pub type_name_fallback: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            type_name_fallback: true,
        }
    }
}

/// Plan-driven field lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldResolver {
    options: ResolverOptions,
}

impl FieldResolver {
    /// Create a resolver.
    #[must_use]
    pub const fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    /// The options in effect.
    #[must_use]
    pub const fn options(&self) -> ResolverOptions {
        self.options
    }

    fn run<'a, R>(
        &self,
        intent: Intent,
        component: &'a ComponentDescriptor,
        class: Classification,
        filter_id: &'a str,
        accept: impl FnMut(Candidate<'a>) -> Option<R>,
    ) -> Option<R> {
        let target = Target::new(component, filter_id);
        walk(
            plan_for(intent),
            &target,
            class,
            self.options.type_name_fallback,
            accept,
        )
    }

    /// Resolve a date as UTC epoch milliseconds.
    #[must_use]
    pub fn resolve_date(
        &self,
        component: &ComponentDescriptor,
        class: Classification,
    ) -> Option<i64> {
        self.run(Intent::Date, component, class, "", |c| value_millis(c.value))
    }

    /// Resolve a category: a string, an array of tags, or an object whose
    /// values are compared.
    #[must_use]
    pub fn resolve_category<'a>(
        &self,
        component: &'a ComponentDescriptor,
        class: Classification,
        filter_id: &'a str,
    ) -> Option<&'a Value> {
        self.run(Intent::Category, component, class, filter_id, |c| {
            match c.value {
                Value::String(s) if s.is_empty() => None,
                v => Some(v),
            }
        })
    }

    /// Resolve a numeric value.
    #[must_use]
    pub fn resolve_numeric(
        &self,
        component: &ComponentDescriptor,
        class: Classification,
    ) -> Option<f64> {
        self.run(Intent::Numeric, component, class, "", |c| c.value.as_f64())
    }

    /// Resolve a boolean for the given filter.
    #[must_use]
    pub fn resolve_boolean(
        &self,
        component: &ComponentDescriptor,
        class: Classification,
        filter_id: &str,
    ) -> Option<bool> {
        self.run(Intent::Boolean, component, class, filter_id, |c| {
            match c.value {
                Value::Bool(b) => Some(*b),
                Value::String(s) if c.key == "status" => Some(s.eq_ignore_ascii_case("active")),
                _ => None,
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
