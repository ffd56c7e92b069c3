//! # Filter Matchers
//!
//! One stateless predicate per filter family. Each takes a component (with
//! its classification), the filter it is evaluated for and the active
//! value, and returns a [`Verdict`].
//!
//! Matching is permissive: a component whose relevant field cannot be
//! found is never excluded. Only `Verdict::NoMatch` excludes.

use crate::classify::Classification;
use crate::dates::parse_millis;
use crate::primitives::{EPOCH_MILLIS, FAR_FUTURE_MILLIS, MAX_SCAN_DEPTH};
use crate::resolve::FieldResolver;
use crate::{ComponentDescriptor, FilterType, FilterValue};
use serde_json::Value;

/// Outcome of evaluating one filter against one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The located field satisfies the filter.
    Match,
    /// The located field violates the filter.
    NoMatch,
    /// The active value carries no constraint.
    Unconstrained,
    /// No field of the needed kind was found.
    Unresolved,
    /// The active value has the wrong shape for this filter type.
    ShapeMismatch,
}

impl Verdict {
    /// Whether the component survives this filter.
    #[must_use]
    pub const fn passes(self) -> bool {
        !matches!(self, Self::NoMatch)
    }

    const fn from_bool(hit: bool) -> Self {
        if hit { Self::Match } else { Self::NoMatch }
    }
}

/// Everything a matcher may look at.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub component: &'a ComponentDescriptor,
    pub class: Classification,
    pub filter_id: &'a str,
    pub resolver: &'a FieldResolver,
}

/// A filter predicate.
pub trait FilterMatcher: Send + Sync {
    /// Evaluate the filter.
    fn evaluate(&self, cx: &MatchContext<'_>, value: &FilterValue) -> Verdict;

    /// Whether the component survives the filter.
    fn matches(&self, cx: &MatchContext<'_>, value: &FilterValue) -> bool {
        self.evaluate(cx, value).passes()
    }
}

/// The matcher for a filter type; `None` for unknown types.
#[must_use]
pub fn matcher_for(kind: FilterType) -> Option<&'static dyn FilterMatcher> {
    match kind {
        FilterType::DateRange => Some(&DateRangeMatcher),
        FilterType::Dropdown | FilterType::Checkbox => Some(&MultiSelectMatcher),
        FilterType::Search => Some(&SearchMatcher),
        FilterType::RangeSlider => Some(&NumericRangeMatcher),
        FilterType::Toggle => Some(&ToggleMatcher),
        FilterType::Unknown => None,
    }
}

// =============================================================================
// DATE RANGE
// =============================================================================

/// Inclusive date containment. Open or unparseable bounds extend to the
/// epoch / year 9999.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRangeMatcher;

impl FilterMatcher for DateRangeMatcher {
    fn evaluate(&self, cx: &MatchContext<'_>, value: &FilterValue) -> Verdict {
        let Some((start, end)) = value.date_bounds() else {
            return Verdict::ShapeMismatch;
        };
        if start.is_none() && end.is_none() {
            return Verdict::Unconstrained;
        }
        let Some(at) = cx.resolver.resolve_date(cx.component, cx.class) else {
            return Verdict::Unresolved;
        };

        let lower = start.and_then(parse_millis).unwrap_or(EPOCH_MILLIS);
        let upper = end.and_then(parse_millis).unwrap_or(FAR_FUTURE_MILLIS);
        Verdict::from_bool(lower <= at && at <= upper)
    }
}

// =============================================================================
// MULTI-SELECT
// =============================================================================

/// Dropdown/checkbox selection, case-insensitive.
///
/// Arrays match on element equality, objects on any value, scalars on
/// substring containment.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiSelectMatcher;

impl FilterMatcher for MultiSelectMatcher {
    fn evaluate(&self, cx: &MatchContext<'_>, value: &FilterValue) -> Verdict {
        let selected: Vec<String> = match value {
            FilterValue::List(items) => items
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            FilterValue::Text(s) if !s.trim().is_empty() => vec![s.trim().to_lowercase()],
            FilterValue::Text(_) => Vec::new(),
            _ => return Verdict::ShapeMismatch,
        };
        if selected.is_empty() {
            return Verdict::Unconstrained;
        }
        let Some(field) = cx
            .resolver
            .resolve_category(cx.component, cx.class, cx.filter_id)
        else {
            return Verdict::Unresolved;
        };

        let hit = match field {
            Value::Array(items) => items
                .iter()
                .any(|item| selected.contains(&string_form(item).to_lowercase())),
            Value::Object(map) => map.values().any(|v| contains_any(v, &selected)),
            scalar => contains_any(scalar, &selected),
        };
        Verdict::from_bool(hit)
    }
}

fn contains_any(value: &Value, selected: &[String]) -> bool {
    let form = string_form(value).to_lowercase();
    selected.iter().any(|s| form.contains(s.as_str()))
}

/// The string a value is compared as.
fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// =============================================================================
// SEARCH
// =============================================================================

/// Case-insensitive substring search over the title, card content and
/// every string inside `data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchMatcher;

impl FilterMatcher for SearchMatcher {
    fn evaluate(&self, cx: &MatchContext<'_>, value: &FilterValue) -> Verdict {
        let FilterValue::Text(query) = value else {
            return Verdict::ShapeMismatch;
        };
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Verdict::Unconstrained;
        }
        let hit = |s: &str| s.to_lowercase().contains(&query);

        if cx.component.title().is_some_and(hit) {
            return Verdict::Match;
        }
        let data = cx.component.data();
        if cx.class.is_card
            && data
                .and_then(|d| d.get("content"))
                .and_then(Value::as_str)
                .is_some_and(hit)
        {
            return Verdict::Match;
        }
        Verdict::from_bool(data.is_some_and(|d| any_string(d, &hit, MAX_SCAN_DEPTH)))
    }
}

/// Depth-first scan of every string below `value`.
fn any_string(value: &Value, hit: &impl Fn(&str) -> bool, depth: usize) -> bool {
    match value {
        Value::String(s) => hit(s),
        _ if depth == 0 => false,
        Value::Array(items) => items.iter().any(|v| any_string(v, hit, depth - 1)),
        Value::Object(map) => map.values().any(|v| any_string(v, hit, depth - 1)),
        _ => false,
    }
}

// =============================================================================
// NUMERIC RANGE
// =============================================================================

/// Inclusive `min <= value <= max`; reversed bounds are reordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericRangeMatcher;

impl FilterMatcher for NumericRangeMatcher {
    fn evaluate(&self, cx: &MatchContext<'_>, value: &FilterValue) -> Verdict {
        let FilterValue::Range(a, b) = *value else {
            return Verdict::ShapeMismatch;
        };
        let Some(n) = cx.resolver.resolve_numeric(cx.component, cx.class) else {
            return Verdict::Unresolved;
        };
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        Verdict::from_bool(min <= n && n <= max)
    }
}

// =============================================================================
// TOGGLE
// =============================================================================

/// Must-be-true constraint: excludes only when the toggle is on and the
/// resolved flag is false.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToggleMatcher;

impl FilterMatcher for ToggleMatcher {
    fn evaluate(&self, cx: &MatchContext<'_>, value: &FilterValue) -> Verdict {
        let FilterValue::Flag(on) = *value else {
            return Verdict::ShapeMismatch;
        };
        if !on {
            return Verdict::Unconstrained;
        }
        match cx
            .resolver
            .resolve_boolean(cx.component, cx.class, cx.filter_id)
        {
            Some(flag) => Verdict::from_bool(flag),
            None => Verdict::Unresolved,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use serde_json::json;

    const RESOLVER: FieldResolver = FieldResolver::new(crate::resolve::ResolverOptions {
        type_name_fallback: true,
    });

    fn verdict(
        matcher: &dyn FilterMatcher,
        raw: Value,
        filter_id: &str,
        value: FilterValue,
    ) -> Verdict {
        let component = ComponentDescriptor::from_value(raw).expect("object");
        let cx = MatchContext {
            component: &component,
            class: classify(&component),
            filter_id,
            resolver: &RESOLVER,
        };
        matcher.evaluate(&cx, &value)
    }

    #[test]
    fn unknown_type_has_no_matcher() {
        assert!(matcher_for(FilterType::Unknown).is_none());
        assert!(matcher_for(FilterType::Checkbox).is_some());
    }

    // -------------------------------------------------------------------------
    // DATE RANGE
    // -------------------------------------------------------------------------

    #[test]
    fn date_inside_range() {
        let v = verdict(
            &DateRangeMatcher,
            json!({"id": "a", "type": "Card", "data": {"date": "2025-02-10"}}),
            "when",
            FilterValue::date_range("2025-02-01", "2025-02-28"),
        );
        assert_eq!(v, Verdict::Match);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let v = verdict(
            &DateRangeMatcher,
            json!({"id": "a", "type": "Card", "data": {"date": "2025-01-01"}}),
            "when",
            FilterValue::date_range("2025-01-01", "2025-01-01"),
        );
        assert_eq!(v, Verdict::Match);
    }

    #[test]
    fn date_outside_range() {
        let v = verdict(
            &DateRangeMatcher,
            json!({"id": "a", "type": "Card", "data": {"date": "2024-12-31"}}),
            "when",
            FilterValue::date_range("2025-01-01", ""),
        );
        assert_eq!(v, Verdict::NoMatch);
    }

    #[test]
    fn open_upper_bound_reaches_far_future() {
        let v = verdict(
            &DateRangeMatcher,
            json!({"id": "a", "type": "Card", "data": {"date": "2999-01-01"}}),
            "when",
            FilterValue::date_range("2025-01-01", ""),
        );
        assert_eq!(v, Verdict::Match);
    }

    #[test]
    fn date_missing_field_passes() {
        let v = verdict(
            &DateRangeMatcher,
            json!({"id": "a", "type": "Card", "data": {"value": 1}}),
            "when",
            FilterValue::date_range("2025-01-01", "2025-01-01"),
        );
        assert_eq!(v, Verdict::Unresolved);
        assert!(v.passes());
    }

    #[test]
    fn empty_date_range_is_unconstrained() {
        let v = verdict(
            &DateRangeMatcher,
            json!({"id": "a"}),
            "when",
            FilterValue::date_range("", ""),
        );
        assert_eq!(v, Verdict::Unconstrained);
    }

    // -------------------------------------------------------------------------
    // MULTI-SELECT
    // -------------------------------------------------------------------------

    #[test]
    fn scalar_category_substring_match() {
        let v = verdict(
            &MultiSelectMatcher,
            json!({"id": "a", "data": {"region": "North-East"}}),
            "region",
            FilterValue::list(["north"]),
        );
        assert_eq!(v, Verdict::Match);
    }

    #[test]
    fn array_category_needs_equal_element() {
        let raw = json!({"id": "a", "type": "Card", "data": {"tags": ["Finance", "ops"]}});
        assert_eq!(
            verdict(&MultiSelectMatcher, raw.clone(), "tag", FilterValue::list(["finance"])),
            Verdict::Match
        );
        assert_eq!(
            verdict(&MultiSelectMatcher, raw, "tag", FilterValue::list(["fin"])),
            Verdict::NoMatch
        );
    }

    #[test]
    fn object_category_matches_any_value() {
        let v = verdict(
            &MultiSelectMatcher,
            json!({"id": "a", "data": {"segment": {"primary": "retail", "secondary": "b2b"}}}),
            "segment",
            FilterValue::list(["B2B"]),
        );
        assert_eq!(v, Verdict::Match);
    }

    #[test]
    fn type_name_fallback_can_exclude() {
        let v = verdict(
            &MultiSelectMatcher,
            json!({"id": "c2", "type": "BarChart", "data": {"category": "marketing"}}),
            "region",
            FilterValue::list(["north", "south"]),
        );
        assert_eq!(v, Verdict::NoMatch);
    }

    #[test]
    fn empty_selection_is_unconstrained() {
        let v = verdict(
            &MultiSelectMatcher,
            json!({"id": "a", "type": "BarChart"}),
            "region",
            FilterValue::list(Vec::<String>::new()),
        );
        assert_eq!(v, Verdict::Unconstrained);
    }

    #[test]
    fn numeric_selection_is_a_shape_mismatch() {
        let v = verdict(
            &MultiSelectMatcher,
            json!({"id": "a", "type": "BarChart"}),
            "region",
            FilterValue::Number(3.0),
        );
        assert_eq!(v, Verdict::ShapeMismatch);
        assert!(v.passes());
    }

    // -------------------------------------------------------------------------
    // SEARCH
    // -------------------------------------------------------------------------

    #[test]
    fn search_hits_title() {
        let v = verdict(
            &SearchMatcher,
            json!({"id": "c3", "title": "Q1 Summary"}),
            "q",
            FilterValue::text("q1"),
        );
        assert_eq!(v, Verdict::Match);
    }

    #[test]
    fn search_hits_nested_data_string() {
        let v = verdict(
            &SearchMatcher,
            json!({"id": "a", "type": "Table", "data": {"rows": [{"cells": ["alpha", "Beta"]}]}}),
            "q",
            FilterValue::text("beta"),
        );
        assert_eq!(v, Verdict::Match);
    }

    #[test]
    fn search_miss_excludes() {
        let v = verdict(
            &SearchMatcher,
            json!({"id": "a", "type": "Table", "title": "Orders", "data": {"n": 3}}),
            "q",
            FilterValue::text("revenue"),
        );
        assert_eq!(v, Verdict::NoMatch);
    }

    #[test]
    fn blank_search_is_unconstrained() {
        let v = verdict(&SearchMatcher, json!({"id": "a"}), "q", FilterValue::text("  "));
        assert_eq!(v, Verdict::Unconstrained);
    }

    #[test]
    fn scan_depth_is_bounded() {
        let mut deep = json!("needle");
        for _ in 0..(MAX_SCAN_DEPTH + 2) {
            deep = json!({ "n": deep });
        }
        let v = verdict(
            &SearchMatcher,
            json!({"id": "a", "data": deep}),
            "q",
            FilterValue::text("needle"),
        );
        assert_eq!(v, Verdict::NoMatch);
    }

    // -------------------------------------------------------------------------
    // NUMERIC RANGE
    // -------------------------------------------------------------------------

    #[test]
    fn value_in_range() {
        let raw = json!({"id": "c1", "type": "Card", "data": {"value": 120, "label": "Revenue"}});
        assert_eq!(
            verdict(
                &NumericRangeMatcher,
                raw.clone(),
                "valueRange",
                FilterValue::Range(100.0, 150.0)
            ),
            Verdict::Match
        );
        assert_eq!(
            verdict(&NumericRangeMatcher, raw, "valueRange", FilterValue::Range(200.0, 300.0)),
            Verdict::NoMatch
        );
    }

    #[test]
    fn reversed_bounds_are_reordered() {
        let v = verdict(
            &NumericRangeMatcher,
            json!({"id": "c1", "type": "Card", "data": {"value": 120}}),
            "valueRange",
            FilterValue::Range(150.0, 100.0),
        );
        assert_eq!(v, Verdict::Match);
    }

    #[test]
    fn no_number_passes() {
        let v = verdict(
            &NumericRangeMatcher,
            json!({"id": "a", "data": {"label": "n/a"}}),
            "valueRange",
            FilterValue::Range(1.0, 2.0),
        );
        assert_eq!(v, Verdict::Unresolved);
    }

    // -------------------------------------------------------------------------
    // TOGGLE
    // -------------------------------------------------------------------------

    #[test]
    fn toggle_on_excludes_false() {
        let v = verdict(
            &ToggleMatcher,
            json!({"id": "a", "data": {"isActive": false}}),
            "activeOnly",
            FilterValue::Flag(true),
        );
        assert_eq!(v, Verdict::NoMatch);
    }

    #[test]
    fn toggle_off_never_excludes() {
        let v = verdict(
            &ToggleMatcher,
            json!({"id": "a", "data": {"isActive": false}}),
            "activeOnly",
            FilterValue::Flag(false),
        );
        assert!(v.passes());
    }

    #[test]
    fn toggle_on_keeps_true() {
        let v = verdict(
            &ToggleMatcher,
            json!({"id": "a", "data": {"status": "active"}}),
            "activeOnly",
            FilterValue::Flag(true),
        );
        assert_eq!(v, Verdict::Match);
    }
}
