//! # Search Plans
//!
//! Each semantic intent has an ordered list of `(role gate, probe)`
//! entries. The walker visits entries in order, skips those whose gate does
//! not match the component's classification, and feeds every candidate a
//! probe yields to the intent's acceptor until one is accepted.
//!
//! Probes never descend more than one level below `data`.

use crate::classify::{series_points, Classification};
use crate::dates::has_iso_date_prefix;
use crate::primitives::{BOOLEAN_FIELD_NAMES, CATEGORY_FIELD_NAMES, DATE_FIELD_NAMES};
use crate::ComponentDescriptor;
use serde_json::Value;

/// What kind of field is being looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Intent {
    Date,
    Category,
    Numeric,
    Boolean,
}

/// Which classifications an entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGate {
    Any,
    Card,
    TimeSeries,
    Aggregation,
    CardOrAggregation,
}

impl RoleGate {
    /// Whether the gate is open for this classification.
    #[must_use]
    pub const fn admits(self, class: Classification) -> bool {
        match self {
            Self::Any => true,
            Self::Card => class.is_card,
            Self::TimeSeries => class.is_time_series,
            Self::Aggregation => class.is_aggregation,
            Self::CardOrAggregation => class.is_card || class.is_aggregation,
        }
    }
}

/// Where to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// A fixed key path below `data`.
    Data(&'static [&'static str]),
    /// Top-level descriptor properties, in order.
    Component(&'static [&'static str]),
    /// `data[<filter id>]`.
    DataFilterKey,
    /// `data.dimensions[<key equal to the filter id, ignoring case>]`.
    DimensionForFilter,
    /// A key on every entry of `data.series`.
    EachSeries(&'static str),
    /// A key on the first point of every entry of `data.series`.
    SeriesFirstPoint(&'static str),
    /// The last point of the first series (`y`, then `value`, then the
    /// point itself).
    FirstSeriesLastPoint,
    /// Named keys at the top of `data`.
    Names(&'static [&'static str]),
    /// Named keys inside every object-valued property of `data`.
    NestedNames(&'static [&'static str]),
    /// Every top-level value of `data`.
    AnyValue,
    /// Every value inside every object-valued property of `data`.
    AnyNestedValue,
    /// Strings with a `YYYY-MM-DD` prefix at the top of `data`, then one
    /// level deeper.
    IsoDatedString,
    /// The descriptor's `type` string.
    ComponentType,
}

/// One step of a search plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanEntry {
    pub gate: RoleGate,
    pub probe: Probe,
    /// The entry reads the component's type name; dropped when the
    /// type-name fallback is disabled.
    pub type_name: bool,
}

impl PlanEntry {
    const fn new(gate: RoleGate, probe: Probe) -> Self {
        Self {
            gate,
            probe,
            type_name: false,
        }
    }

    const fn type_name(gate: RoleGate, probe: Probe) -> Self {
        Self {
            gate,
            probe,
            type_name: true,
        }
    }
}

use Probe::{
    AnyNestedValue, AnyValue, Component, ComponentType, Data, DataFilterKey, DimensionForFilter,
    EachSeries, FirstSeriesLastPoint, IsoDatedString, Names, NestedNames, SeriesFirstPoint,
};
use RoleGate::{Aggregation, Any, Card, CardOrAggregation, TimeSeries};

const DATE_PLAN: &[PlanEntry] = &[
    PlanEntry::new(TimeSeries, SeriesFirstPoint("x")),
    PlanEntry::new(CardOrAggregation, Data(&["period"])),
    PlanEntry::new(CardOrAggregation, Data(&["timestamp"])),
    PlanEntry::new(CardOrAggregation, Data(&["date"])),
    PlanEntry::new(CardOrAggregation, Data(&["timeframe", "start"])),
    PlanEntry::new(CardOrAggregation, Data(&["timeframe", "end"])),
    PlanEntry::new(Aggregation, Data(&["calculationPeriod", "start"])),
    PlanEntry::new(Aggregation, Data(&["calculationPeriod", "end"])),
    PlanEntry::new(Any, Names(DATE_FIELD_NAMES)),
    PlanEntry::new(Any, NestedNames(DATE_FIELD_NAMES)),
    PlanEntry::new(Any, IsoDatedString),
];

const CATEGORY_PLAN: &[PlanEntry] = &[
    PlanEntry::new(Card, Data(&["category"])),
    PlanEntry::new(Card, Data(&["tags"])),
    PlanEntry::new(Card, Data(&["cardType"])),
    PlanEntry::new(TimeSeries, Data(&["metadata", "category"])),
    PlanEntry::new(TimeSeries, Data(&["metadata", "tags"])),
    PlanEntry::new(TimeSeries, EachSeries("category")),
    PlanEntry::new(TimeSeries, EachSeries("tags")),
    PlanEntry::new(Aggregation, Data(&["metadata", "category"])),
    PlanEntry::new(Aggregation, DimensionForFilter),
    PlanEntry::new(Any, Component(&["category"])),
    PlanEntry::type_name(Any, Component(&["type"])),
    PlanEntry::new(Any, Component(&["tags", "group"])),
    PlanEntry::new(Any, DataFilterKey),
    PlanEntry::new(Any, Names(CATEGORY_FIELD_NAMES)),
    PlanEntry::type_name(Any, ComponentType),
];

const NUMERIC_PLAN: &[PlanEntry] = &[
    PlanEntry::new(CardOrAggregation, Data(&["value"])),
    PlanEntry::new(CardOrAggregation, Data(&["total"])),
    PlanEntry::new(CardOrAggregation, Data(&["count"])),
    PlanEntry::new(TimeSeries, Data(&["summary", "average"])),
    PlanEntry::new(TimeSeries, Data(&["summary", "latest"])),
    PlanEntry::new(TimeSeries, FirstSeriesLastPoint),
    PlanEntry::new(Any, AnyValue),
    PlanEntry::new(Any, AnyNestedValue),
];

const BOOLEAN_PLAN: &[PlanEntry] = &[
    PlanEntry::new(Any, DataFilterKey),
    PlanEntry::new(Any, Names(BOOLEAN_FIELD_NAMES)),
];

/// The search plan for an intent.
#[must_use]
pub fn plan_for(intent: Intent) -> &'static [PlanEntry] {
    match intent {
        Intent::Date => DATE_PLAN,
        Intent::Category => CATEGORY_PLAN,
        Intent::Numeric => NUMERIC_PLAN,
        Intent::Boolean => BOOLEAN_PLAN,
    }
}

// =============================================================================
// WALKER
// =============================================================================

/// A value found by a probe, with the key it was found under.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub key: &'a str,
    pub value: &'a Value,
}

/// What a probe searches.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub component: &'a ComponentDescriptor,
    pub filter_id: &'a str,
}

impl<'a> Target<'a> {
    /// Search a component on behalf of a filter.
    #[must_use]
    pub fn new(component: &'a ComponentDescriptor, filter_id: &'a str) -> Self {
        Self {
            component,
            filter_id,
        }
    }

    fn data(&self) -> Option<&'a Value> {
        self.component.data()
    }

    fn data_object(&self) -> Option<&'a serde_json::Map<String, Value>> {
        self.data().and_then(Value::as_object)
    }

    fn series(&self) -> impl Iterator<Item = &'a Value> {
        self.data()
            .and_then(|d| d.get("series"))
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
    }

    fn nested_objects(&self) -> impl Iterator<Item = &'a serde_json::Map<String, Value>> {
        self.data_object()
            .into_iter()
            .flat_map(|m| m.values())
            .filter_map(Value::as_object)
    }
}

/// Offer a candidate unless it is null.
fn offer<'a, R>(
    key: &'a str,
    value: Option<&'a Value>,
    accept: &mut impl FnMut(Candidate<'a>) -> Option<R>,
) -> Option<R> {
    match value {
        Some(v) if !v.is_null() => accept(Candidate { key, value: v }),
        _ => None,
    }
}

impl Probe {
    /// Feed every candidate this probe finds to `accept`, stopping at the
    /// first accepted one.
    pub fn find<'a, R>(
        self,
        target: &Target<'a>,
        accept: &mut impl FnMut(Candidate<'a>) -> Option<R>,
    ) -> Option<R> {
        match self {
            Data(path) => {
                let (last, _) = path.split_last()?;
                let value = path
                    .iter()
                    .try_fold(target.data()?, |node, key| node.get(*key))?;
                offer(last, Some(value), accept)
            }
            Component(names) => names
                .iter()
                .find_map(|name| offer(name, target.component.get(name), accept)),
            DataFilterKey => {
                let data = target.data()?;
                offer(target.filter_id, data.get(target.filter_id), accept)
            }
            DimensionForFilter => target
                .data()?
                .get("dimensions")?
                .as_object()?
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(target.filter_id))
                .find_map(|(k, v)| offer(k, Some(v), accept)),
            EachSeries(key) => target
                .series()
                .find_map(|series| offer(key, series.get(key), accept)),
            SeriesFirstPoint(key) => target.series().find_map(|series| {
                let first = series_points(series)?.first()?;
                offer(key, first.get(key), accept)
            }),
            FirstSeriesLastPoint => {
                let last = series_points(target.series().next()?)?.last()?;
                match last {
                    Value::Object(point) => offer("y", point.get("y"), accept)
                        .or_else(|| offer("value", point.get("value"), accept)),
                    other => offer("y", Some(other), accept),
                }
            }
            Names(names) => {
                let data = target.data_object()?;
                names
                    .iter()
                    .find_map(|name| offer(name, data.get(*name), accept))
            }
            NestedNames(names) => target.nested_objects().find_map(|obj| {
                names
                    .iter()
                    .find_map(|name| offer(name, obj.get(*name), accept))
            }),
            AnyValue => target
                .data_object()?
                .iter()
                .find_map(|(k, v)| offer(k, Some(v), accept)),
            AnyNestedValue => target
                .nested_objects()
                .find_map(|obj| obj.iter().find_map(|(k, v)| offer(k, Some(v), accept))),
            IsoDatedString => {
                let dated = |(k, v): (&'a String, &'a Value)| {
                    v.as_str()
                        .is_some_and(has_iso_date_prefix)
                        .then_some((k, v))
                };
                let top = target.data_object()?.iter().filter_map(dated);
                let nested = target
                    .nested_objects()
                    .flat_map(|obj| obj.iter())
                    .filter_map(dated);
                top.chain(nested)
                    .find_map(|(k, v)| offer(k, Some(v), accept))
            }
            ComponentType => {
                let kind = target.component.get("type");
                match kind.and_then(Value::as_str) {
                    Some(s) if !s.is_empty() => offer("type", kind, accept),
                    _ => None,
                }
            }
        }
    }
}

/// Walk a plan in order and return the first accepted candidate.
pub fn walk<'a, R>(
    plan: &[PlanEntry],
    target: &Target<'a>,
    class: Classification,
    type_name_fallback: bool,
    mut accept: impl FnMut(Candidate<'a>) -> Option<R>,
) -> Option<R> {
    plan.iter()
        .filter(|entry| entry.gate.admits(class))
        .filter(|entry| type_name_fallback || !entry.type_name)
        .find_map(|entry| entry.probe.find(target, &mut accept))
}

// =============================================================================
// TESTS
// =============================================================================
