//! # Value Codec
//!
//! String form of filter values, as used in URL query parameters:
//!
//! | Filter type          | Value                | Encoded            |
//! |----------------------|----------------------|--------------------|
//! | dropdown / checkbox  | `["a", "b"]`         | `a,b`              |
//! | rangeSlider          | `[10, 20]`           | `10,20`            |
//! | toggle               | `true`               | `true`             |
//! | dateRange            | `["2025-01-01", ""]` | `2025-01-01,`      |
//! | search               | `"q1"`               | `q1`               |
//!
//! Decoding never fails: malformed input degrades to the definition's
//! bounds or to `false`.

use crate::{ActiveFilterState, FilterDefinition, FilterType, FilterValue};
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Encode a value for a query parameter.
#[must_use]
pub fn encode_value(value: &FilterValue) -> String {
    match value {
        FilterValue::List(items) => items.join(","),
        FilterValue::Range(min, max) => format!("{min},{max}"),
        FilterValue::Flag(flag) => flag.to_string(),
        FilterValue::Number(n) => n.to_string(),
        FilterValue::Text(s) => s.clone(),
    }
}

/// Decode a query parameter according to the filter's type.
#[must_use]
pub fn decode_value(definition: &FilterDefinition, raw: &str) -> FilterValue {
    match definition.kind {
        FilterType::Dropdown | FilterType::Checkbox => FilterValue::List(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        FilterType::DateRange => {
            let (start, end) = raw.split_once(',').unwrap_or((raw, ""));
            FilterValue::date_range(start.trim(), end.trim())
        }
        FilterType::RangeSlider => {
            let (min, max) = raw.split_once(',').unwrap_or((raw, ""));
            let bound = |s: &str, fallback: f64| {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .unwrap_or(fallback)
            };
            FilterValue::Range(
                bound(min, definition.min_or_default()),
                bound(max, definition.max_or_default()),
            )
        }
        FilterType::Toggle => FilterValue::Flag(matches!(raw.trim(), "true" | "1")),
        FilterType::Search | FilterType::Unknown => FilterValue::Text(raw.to_string()),
    }
}

/// Form-encode a state as a query string, keys in sorted order.
#[must_use]
pub fn to_query_string(state: &ActiveFilterState) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (id, value) in state.iter() {
        serializer.append_pair(id, &encode_value(value));
    }
    serializer.finish()
}

/// Split a query string into raw parameters. A leading `?` is ignored and
/// the last occurrence of a repeated key wins.
#[must_use]
pub fn parse_query_string(query: &str) -> BTreeMap<String, String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}
