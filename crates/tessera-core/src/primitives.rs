//! # Heuristic Primitives
//!
//! Fixed tables and bounds used by classification and field resolution.
//!
//! These are compiled into the binary and immutable at runtime. The
//! order of every list is significant: probes stop at the first hit.

/// Field names probed for a date, in priority order.
pub const DATE_FIELD_NAMES: &[&str] = &[
    "date",
    "dateField",
    "timestamp",
    "created",
    "updated",
    "time",
    "datetime",
    "period",
    "reportDate",
    "orderDate",
    "createdAt",
    "updatedAt",
    "startDate",
    "endDate",
];

/// Field names inside `data` probed for a category.
pub const CATEGORY_FIELD_NAMES: &[&str] = &[
    "category",
    "type",
    "tags",
    "group",
    "classification",
    "segment",
    "region",
    "product",
    "department",
];

/// Field names probed for a boolean.
pub const BOOLEAN_FIELD_NAMES: &[&str] = &[
    "isActive",
    "isEnabled",
    "isVisible",
    "active",
    "enabled",
    "visible",
    "status",
    "completed",
    "success",
];

/// Exact type names that mark a time-series chart.
pub const TIME_SERIES_TYPES: &[&str] = &["TimeSeriesChart", "LineChart", "AreaChart"];

/// Lower-case fragments that mark a time-series chart.
pub const TIME_SERIES_TYPE_FRAGMENTS: &[&str] = &["timeseries", "linechart"];

/// Exact type names that mark an aggregation/KPI tile.
pub const AGGREGATION_TYPES: &[&str] = &[
    "Aggregation",
    "KPI",
    "Stat",
    "Value",
    "CounterCard",
    "MetricCard",
];

/// Lower-case fragments that mark an aggregation/KPI tile.
pub const AGGREGATION_TYPE_FRAGMENTS: &[&str] = &["aggregation", "kpi"];

/// Marker searched for (case-insensitive) when detecting cards.
pub const CARD_MARKER: &str = "card";

/// Maximum depth of the recursive string scan used by search.
///
/// All scans must be computationally bounded; deeper values are ignored.
pub const MAX_SCAN_DEPTH: usize = 32;

/// Upper date bound used when a range has no end: 9999-12-31T23:59:59Z.
pub const FAR_FUTURE_MILLIS: i64 = 253_402_300_799_000;

/// Lower date bound used when a range has no start: the Unix epoch.
pub const EPOCH_MILLIS: i64 = 0;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "tessera-filters";
