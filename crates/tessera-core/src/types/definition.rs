//! Filter configuration as it arrives from the dashboard JSON.

use super::{ComponentDescriptor, FilterValue, TesseraError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Id of the implicit bar holding a flat `filters` array.
pub const DEFAULT_BAR_ID: &str = "default";

// =============================================================================
// FILTER TYPE
// =============================================================================

/// Kind of filter control. Unrecognised names become `Unknown` and
/// match everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    DateRange,
    Dropdown,
    Checkbox,
    Search,
    RangeSlider,
    Toggle,
    #[serde(other)]
    Unknown,
}

impl FilterType {
    /// The configuration name of this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DateRange => "dateRange",
            Self::Dropdown => "dropdown",
            Self::Checkbox => "checkbox",
            Self::Search => "search",
            Self::RangeSlider => "rangeSlider",
            Self::Toggle => "toggle",
            Self::Unknown => "unknown",
        }
    }
}

// =============================================================================
// SCOPE
// =============================================================================

/// Which components a filter applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawAffects", into = "RawAffects")]
pub enum AffectsComponents {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl AffectsComponents {
    /// Whether the filter applies to the component with this id.
    #[must_use]
    pub fn includes(&self, component_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(component_id),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawAffects {
    Keyword(String),
    Ids(Vec<String>),
}

impl From<RawAffects> for AffectsComponents {
    fn from(raw: RawAffects) -> Self {
        match raw {
            RawAffects::Keyword(_) => Self::All,
            RawAffects::Ids(ids) => Self::Only(ids.into_iter().collect()),
        }
    }
}

impl From<AffectsComponents> for RawAffects {
    fn from(scope: AffectsComponents) -> Self {
        match scope {
            AffectsComponents::All => Self::Keyword("all".to_string()),
            AffectsComponents::Only(ids) => Self::Ids(ids.into_iter().collect()),
        }
    }
}

// =============================================================================
// OPTIONS & PRESETS
// =============================================================================

/// A selectable option; bare strings use the value as label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOption")]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Plain(String),
    Labeled {
        value: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl From<RawOption> for FilterOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Plain(value) => Self {
                label: value.clone(),
                value,
            },
            RawOption::Labeled { value, label } => Self {
                label: label.unwrap_or_else(|| value.clone()),
                value,
            },
        }
    }
}

/// A named quick range offered by a date filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePreset {
    pub label: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

// =============================================================================
// FILTER DEFINITION
// =============================================================================

/// Static description of one filter control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FilterType,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FilterValue>,
    #[serde(default)]
    pub affects_components: AffectsComponents,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<DatePreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FilterDefinition {
    /// Create a definition with every optional field unset.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: FilterType) -> Self {
        Self {
            id: id.into(),
            kind,
            label: String::new(),
            default_value: None,
            affects_components: AffectsComponents::All,
            min: None,
            max: None,
            step: None,
            options: Vec::new(),
            on_label: None,
            off_label: None,
            presets: Vec::new(),
            placeholder: None,
        }
    }

    /// Set the configured default.
    #[must_use]
    pub fn with_default(mut self, value: FilterValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Set the slider bounds.
    #[must_use]
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Restrict the filter to the given component ids.
    #[must_use]
    pub fn affecting<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affects_components =
            AffectsComponents::Only(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Lower slider bound, `0` when unset.
    #[must_use]
    pub fn min_or_default(&self) -> f64 {
        self.min.unwrap_or(0.0)
    }

    /// Upper slider bound, `100` when unset.
    #[must_use]
    pub fn max_or_default(&self) -> f64 {
        self.max.unwrap_or(100.0)
    }

    /// The effective default: the configured one, else the neutral value
    /// for this filter type.
    #[must_use]
    pub fn default_value(&self) -> FilterValue {
        if let Some(v) = &self.default_value {
            return v.clone();
        }
        match self.kind {
            FilterType::Dropdown | FilterType::Checkbox => FilterValue::List(Vec::new()),
            FilterType::DateRange => FilterValue::date_range("", ""),
            FilterType::RangeSlider => {
                FilterValue::Range(self.min_or_default(), self.max_or_default())
            }
            FilterType::Toggle => FilterValue::Flag(false),
            FilterType::Search | FilterType::Unknown => FilterValue::Text(String::new()),
        }
    }

    /// Whether `value` carries no constraint for this filter: empty, or
    /// equal to the default.
    #[must_use]
    pub fn is_inactive(&self, value: &FilterValue) -> bool {
        value.is_empty() || *value == self.default_value()
    }
}

// =============================================================================
// FILTER BARS & DASHBOARD
// =============================================================================

/// A named group of filters, cleared together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterBar {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterDefinition>,
}

impl FilterBar {
    /// Create a bar.
    #[must_use]
    pub fn new(id: impl Into<String>, filters: Vec<FilterDefinition>) -> Self {
        Self {
            id: id.into(),
            label: None,
            filters,
        }
    }
}

/// The declarative dashboard: components plus filter bars.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
    #[serde(default)]
    pub filter_bars: Vec<FilterBar>,
    /// Flat filter list; folded into a bar named `default`.
    #[serde(default, skip_serializing)]
    filters: Vec<FilterDefinition>,
}

impl DashboardConfig {
    /// Create a dashboard.
    #[must_use]
    pub fn new(components: Vec<ComponentDescriptor>, filter_bars: Vec<FilterBar>) -> Self {
        Self {
            components,
            filter_bars,
            filters: Vec::new(),
        }
    }

    /// Parse dashboard JSON, folding a flat `filters` array into the
    /// default bar and rejecting duplicate filter ids.
    pub fn from_json(raw: &str) -> Result<Self, TesseraError> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.normalize()?;
        Ok(config)
    }

    /// Like [`Self::from_json`], for an already parsed document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, TesseraError> {
        let mut config: Self = serde_json::from_value(value)?;
        config.normalize()?;
        Ok(config)
    }

    fn normalize(&mut self) -> Result<(), TesseraError> {
        if !self.filters.is_empty() {
            let loose = std::mem::take(&mut self.filters);
            match self.filter_bars.iter_mut().find(|b| b.id == DEFAULT_BAR_ID) {
                Some(bar) => bar.filters.extend(loose),
                None => self.filter_bars.push(FilterBar::new(DEFAULT_BAR_ID, loose)),
            }
        }

        let mut seen = BTreeSet::new();
        for def in self.definitions() {
            if !seen.insert(def.id.as_str()) {
                return Err(TesseraError::ConfigError(format!(
                    "duplicate filter id '{}'",
                    def.id
                )));
            }
        }
        Ok(())
    }

    /// Every filter definition across all bars, in configuration order.
    pub fn definitions(&self) -> impl Iterator<Item = &FilterDefinition> {
        self.filter_bars.iter().flat_map(|b| b.filters.iter())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_type_is_accepted() {
        let def: FilterDefinition =
            serde_json::from_value(json!({"id": "x", "type": "colorPicker"})).expect("parse");
        assert_eq!(def.kind, FilterType::Unknown);
    }

    #[test]
    fn affects_components_accepts_keyword_and_list() {
        let all: AffectsComponents = serde_json::from_value(json!("all")).expect("all");
        assert_eq!(all, AffectsComponents::All);

        let only: AffectsComponents = serde_json::from_value(json!(["c1", "c2"])).expect("ids");
        assert!(only.includes("c1"));
        assert!(!only.includes("c3"));
    }

    #[test]
    fn options_accept_plain_and_labeled() {
        let def: FilterDefinition = serde_json::from_value(json!({
            "id": "region",
            "type": "dropdown",
            "options": ["north", {"value": "south", "label": "South"}]
        }))
        .expect("parse");
        assert_eq!(def.options[0].label, "north");
        assert_eq!(def.options[1].label, "South");
    }

    #[test]
    fn neutral_defaults_per_type() {
        let slider = FilterDefinition::new("v", FilterType::RangeSlider).with_bounds(0.0, 500.0);
        assert_eq!(slider.default_value(), FilterValue::Range(0.0, 500.0));
        assert_eq!(
            FilterDefinition::new("t", FilterType::Toggle).default_value(),
            FilterValue::Flag(false)
        );
        assert!(
            FilterDefinition::new("d", FilterType::DateRange)
                .default_value()
                .is_empty()
        );
    }

    #[test]
    fn inactive_when_equal_to_default() {
        let slider = FilterDefinition::new("v", FilterType::RangeSlider).with_bounds(0.0, 500.0);
        assert!(slider.is_inactive(&FilterValue::Range(0.0, 500.0)));
        assert!(!slider.is_inactive(&FilterValue::Range(10.0, 500.0)));
    }

    #[test]
    fn flat_filters_fold_into_default_bar() {
        let config = DashboardConfig::from_json(
            r#"{"components": [], "filters": [{"id": "q", "type": "search"}]}"#,
        )
        .expect("parse");
        assert_eq!(config.filter_bars.len(), 1);
        assert_eq!(config.filter_bars[0].id, DEFAULT_BAR_ID);
        assert!(config.definitions().any(|d| d.id == "q"));
    }

    #[test]
    fn from_value_normalizes_like_from_json() {
        let config = DashboardConfig::from_value(json!({
            "filters": [{"id": "live", "type": "toggle"}]
        }))
        .expect("parse");
        assert_eq!(config.definitions().count(), 1);
        assert_eq!(config.filter_bars[0].id, DEFAULT_BAR_ID);
    }

    #[test]
    fn duplicate_filter_ids_rejected() {
        let err = DashboardConfig::from_json(
            r#"{"filterBars": [
                {"id": "a", "filters": [{"id": "q", "type": "search"}]},
                {"id": "b", "filters": [{"id": "q", "type": "toggle"}]}
            ]}"#,
        )
        .expect_err("duplicate");
        assert!(matches!(err, TesseraError::ConfigError(_)));
    }
}
