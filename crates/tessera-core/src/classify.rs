//! # Component Classifier
//!
//! Infers what a loosely typed component descriptor *is* from its type
//! name, naming hints and the shape of its `data`.
//!
//! Roles are evaluated independently; each role walks an ordered list of
//! predicates and stops at the first hit. A component can satisfy several
//! roles at once, or none (`ComponentRole::Generic`).
//!
//! Classification is pure and never fails.

use crate::dates::has_iso_date_prefix;
use crate::primitives::{
    AGGREGATION_TYPE_FRAGMENTS, AGGREGATION_TYPES, CARD_MARKER, TIME_SERIES_TYPE_FRAGMENTS,
    TIME_SERIES_TYPES,
};
use crate::ComponentDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The primary semantic role of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentRole {
    Card,
    TimeSeries,
    Aggregation,
    Generic,
}

impl ComponentRole {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::TimeSeries => "timeSeries",
            Self::Aggregation => "aggregation",
            Self::Generic => "generic",
        }
    }
}

/// Non-exclusive role flags for one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub is_card: bool,
    pub is_time_series: bool,
    pub is_aggregation: bool,
}

impl Classification {
    /// The primary role, with precedence TimeSeries > Aggregation > Card.
    #[must_use]
    pub const fn role(self) -> ComponentRole {
        if self.is_time_series {
            ComponentRole::TimeSeries
        } else if self.is_aggregation {
            ComponentRole::Aggregation
        } else if self.is_card {
            ComponentRole::Card
        } else {
            ComponentRole::Generic
        }
    }

    /// Whether any role was detected.
    #[must_use]
    pub const fn is_generic(self) -> bool {
        !(self.is_card || self.is_time_series || self.is_aggregation)
    }
}

/// Classify a component.
#[must_use]
pub fn classify(component: &ComponentDescriptor) -> Classification {
    let kind = component.kind();
    let kind_lower = kind.to_lowercase();
    let data = component.data();

    Classification {
        is_card: is_card(component, &kind_lower, data),
        is_time_series: is_time_series(kind, &kind_lower, data),
        is_aggregation: is_aggregation(component, kind, &kind_lower, data),
    }
}

/// A `data` field that is present and not `null`.
fn field<'a>(data: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    data.and_then(|d| d.get(key)).filter(|v| !v.is_null())
}

fn mentions_card(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| s.to_lowercase().contains(CARD_MARKER))
}

/// A layout/style hint names "card" either directly (a string) or through
/// its `variant`/`type` keys.
fn hint_names_card(hint: Option<&Value>) -> bool {
    match hint {
        Some(Value::String(_)) => mentions_card(hint),
        Some(Value::Object(map)) => {
            mentions_card(map.get("variant")) || mentions_card(map.get("type"))
        }
        _ => false,
    }
}

fn is_card(component: &ComponentDescriptor, kind_lower: &str, data: Option<&Value>) -> bool {
    if kind_lower.contains(CARD_MARKER) {
        return true;
    }

    let hints = [
        component.get("layout"),
        component.get("style"),
        field(data, "layout"),
        field(data, "style"),
    ];
    if hints.into_iter().any(hint_names_card) {
        return true;
    }

    if ["component", "title", "id"]
        .iter()
        .any(|key| mentions_card(component.get(key)))
    {
        return true;
    }

    if field(data, "cardType").is_some() || field(data, "cardStyle").is_some() {
        return true;
    }

    field(data, "content").is_some_and(Value::is_string)
}

fn is_time_series(kind: &str, kind_lower: &str, data: Option<&Value>) -> bool {
    if TIME_SERIES_TYPES.contains(&kind)
        || TIME_SERIES_TYPE_FRAGMENTS
            .iter()
            .any(|f| kind_lower.contains(f))
    {
        return true;
    }

    if field(data, "timeframe").is_some() {
        return true;
    }

    first_series_is_dated(data)
}

/// `data.series[0]` has at least two points and its first point has an
/// ISO-dated `x`.
fn first_series_is_dated(data: Option<&Value>) -> bool {
    let Some(first) = field(data, "series")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
    else {
        return false;
    };
    let Some(points) = series_points(first) else {
        return false;
    };
    points.len() >= 2
        && points[0]
            .get("x")
            .and_then(Value::as_str)
            .is_some_and(has_iso_date_prefix)
}

/// Points of one series: `{ data: [...] }` or a bare array.
pub(crate) fn series_points(series: &Value) -> Option<&Vec<Value>> {
    match series {
        Value::Array(points) => Some(points),
        Value::Object(map) => map.get("data").and_then(Value::as_array),
        _ => None,
    }
}

fn is_aggregation(
    component: &ComponentDescriptor,
    kind: &str,
    kind_lower: &str,
    data: Option<&Value>,
) -> bool {
    if AGGREGATION_TYPES.contains(&kind)
        || AGGREGATION_TYPE_FRAGMENTS
            .iter()
            .any(|f| kind_lower.contains(f))
    {
        return true;
    }

    if field(data, "metric").is_some() {
        return true;
    }

    let value = field(data, "value");
    if value.is_some()
        && ["label", "title", "description"]
            .iter()
            .any(|key| field(data, key).is_some())
    {
        return true;
    }

    component.title().is_some() && value.is_some_and(Value::is_number)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn component(raw: Value) -> ComponentDescriptor {
        ComponentDescriptor::from_value(raw).expect("object")
    }

    #[test]
    fn card_by_type_name() {
        let c = classify(&component(json!({"id": "a", "type": "StatCard"})));
        assert!(c.is_card);
    }

    #[test]
    fn card_by_layout_hint() {
        let c = classify(&component(
            json!({"id": "a", "type": "Panel", "layout": {"variant": "Card-compact"}}),
        ));
        assert!(c.is_card);
    }

    #[test]
    fn card_by_content_string() {
        let c = classify(&component(
            json!({"id": "a", "type": "Panel", "data": {"content": "hello"}}),
        ));
        assert!(c.is_card);
        assert_eq!(c.role(), ComponentRole::Card);
    }

    #[test]
    fn time_series_by_type_fragment() {
        let c = classify(&component(json!({"id": "a", "type": "SmoothLineChartV2"})));
        assert!(c.is_time_series);
    }

    #[test]
    fn time_series_by_dated_points() {
        let c = classify(&component(json!({
            "id": "a",
            "type": "Chart",
            "data": {"series": [{"name": "s", "data": [
                {"x": "2025-01-01", "y": 1},
                {"x": "2025-01-02", "y": 2}
            ]}]}
        })));
        assert!(c.is_time_series);
        assert_eq!(c.role(), ComponentRole::TimeSeries);
    }

    #[test]
    fn single_point_series_is_not_time_series() {
        let c = classify(&component(json!({
            "id": "a",
            "type": "Chart",
            "data": {"series": [{"data": [{"x": "2025-01-01", "y": 1}]}]}
        })));
        assert!(!c.is_time_series);
    }

    #[test]
    fn aggregation_by_value_and_label() {
        let c = classify(&component(json!({
            "id": "c1", "type": "Card", "data": {"value": 120, "label": "Revenue"}
        })));
        assert!(c.is_card);
        assert!(c.is_aggregation);
        assert_eq!(c.role(), ComponentRole::Aggregation);
    }

    #[test]
    fn aggregation_by_title_and_numeric_value() {
        let c = classify(&component(json!({
            "id": "x", "type": "Tile", "title": "Orders", "data": {"value": 3}
        })));
        assert!(c.is_aggregation);
    }

    #[test]
    fn no_signal_is_generic() {
        let c = classify(&component(json!({
            "id": "c2", "type": "BarChart", "data": {"category": "marketing"}
        })));
        assert!(c.is_generic());
        assert_eq!(c.role(), ComponentRole::Generic);
    }

    #[test]
    fn null_fields_are_absent() {
        let c = classify(&component(json!({
            "id": "n", "type": "Widget",
            "data": {"timeframe": null, "metric": null, "cardType": null}
        })));
        assert!(c.is_generic());

        let c = classify(&component(json!({
            "id": "n", "type": "Tile", "title": "Orders", "data": {"value": null}
        })));
        assert!(!c.is_aggregation);
    }

    #[test]
    fn missing_everything_is_generic() {
        let c = classify(&component(json!({"id": "c3", "title": "Q1 Summary"})));
        assert_eq!(c.role(), ComponentRole::Generic);
    }
}
