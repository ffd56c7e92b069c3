//! # Scenario Tests
//!
//! End-to-end checks of the filtering contract, from dashboard JSON to the
//! visible component list.
//!
//! ## Groups
//! - Matching scenarios (numeric, category, search, date)
//! - State round trips (set then clear)
//! - Hydration precedence

#![allow(clippy::unwrap_used, clippy::panic)]

use serde_json::json;
use tessera_core::{
    ActiveFilterState, ComponentDescriptor, DashboardConfig, DashboardSession, FilterDefinition,
    FilterEngine, FilterType, FilterValue, MemoryQueryString, MemoryStorage, QueryStringAdapter,
    ResolverOptions,
};

fn component(raw: serde_json::Value) -> ComponentDescriptor {
    ComponentDescriptor::from_value(raw).expect("object")
}

fn revenue_card() -> ComponentDescriptor {
    component(json!({"id": "c1", "type": "Card", "data": {"value": 120, "label": "Revenue"}}))
}

fn ids(list: &[ComponentDescriptor]) -> Vec<&str> {
    list.iter().map(ComponentDescriptor::id).collect()
}

// =============================================================================
// MATCHING SCENARIOS
// =============================================================================

mod matching {
    use super::*;

    fn slider() -> Vec<FilterDefinition> {
        vec![FilterDefinition::new("valueRange", FilterType::RangeSlider).with_bounds(0.0, 1000.0)]
    }

    /// A resolved value inside the range is retained.
    #[test]
    fn card_value_in_range_is_retained() {
        let state = ActiveFilterState::new().with("valueRange", FilterValue::Range(100.0, 150.0));
        let out = FilterEngine::default().apply(&[revenue_card()], &slider(), &state);
        assert_eq!(ids(&out), vec!["c1"]);
    }

    /// A resolved value outside the range is excluded.
    #[test]
    fn card_value_out_of_range_is_excluded() {
        let state = ActiveFilterState::new().with("valueRange", FilterValue::Range(200.0, 300.0));
        let out = FilterEngine::default().apply(&[revenue_card()], &slider(), &state);
        assert!(out.is_empty());
    }

    /// The type-name fallback can exclude a component.
    #[test]
    fn type_name_fallback_excludes() {
        let chart = component(json!({
            "id": "c2", "type": "BarChart", "data": {"category": "marketing"}
        }));
        let defs = vec![FilterDefinition::new("region", FilterType::Dropdown)];
        let state = ActiveFilterState::new().with("region", FilterValue::list(["north", "south"]));

        let out = FilterEngine::default().apply(&[chart.clone()], &defs, &state);
        assert!(out.is_empty());

        // Without the fallback, `data.category` decides, and still misses.
        let strict = FilterEngine::new(ResolverOptions {
            type_name_fallback: false,
        });
        assert!(strict.apply(&[chart], &defs, &state).is_empty());
    }

    /// A title substring match retains a component without data.
    #[test]
    fn title_search_retains() {
        let summary = component(json!({"id": "c3", "title": "Q1 Summary"}));
        let defs = vec![FilterDefinition::new("search", FilterType::Search)];
        let state = ActiveFilterState::new().with("search", FilterValue::text("Q1"));
        let out = FilterEngine::default().apply(&[summary], &defs, &state);
        assert_eq!(ids(&out), vec!["c3"]);
    }

    /// A date filter passes a component with no date-bearing field.
    #[test]
    fn date_filter_without_date_field_passes() {
        let defs = vec![FilterDefinition::new("dateRange", FilterType::DateRange)];
        let state = ActiveFilterState::new()
            .with("dateRange", FilterValue::date_range("2025-01-01", "2025-01-01"));
        let out = FilterEngine::default().apply(&[revenue_card()], &defs, &state);
        assert_eq!(ids(&out), vec!["c1"]);
    }

    /// Time-series points are compared by their first x value.
    #[test]
    fn time_series_first_point_decides() {
        let chart = component(json!({"id": "t1", "type": "LineChart", "data": {"series": [
            {"name": "sales", "data": [{"x": "2025-03-01", "y": 4}, {"x": "2025-03-02", "y": 6}]}
        ]}}));
        let defs = vec![FilterDefinition::new("when", FilterType::DateRange)];

        let march =
            ActiveFilterState::new().with("when", FilterValue::date_range("2025-03-01", ""));
        assert_eq!(
            FilterEngine::default()
                .apply(&[chart.clone()], &defs, &march)
                .len(),
            1
        );

        let april =
            ActiveFilterState::new().with("when", FilterValue::date_range("2025-04-01", ""));
        assert!(FilterEngine::default().apply(&[chart], &defs, &april).is_empty());
    }
}

// =============================================================================
// STATE ROUND TRIPS
// =============================================================================

mod round_trip {
    use super::*;

    const DASHBOARD: &str = r#"{
        "components": [
            {"id": "c1", "type": "Card", "data": {"value": 120, "label": "Revenue"}},
            {"id": "c2", "type": "BarChart", "data": {"category": "marketing"}},
            {"id": "c3", "title": "Q1 Summary"}
        ],
        "filters": [
            {"id": "region", "type": "dropdown", "options": ["north", "south"]},
            {"id": "valueRange", "type": "rangeSlider", "min": 0, "max": 1000}
        ]
    }"#;

    /// Setting then clearing a filter restores the original list and order.
    #[test]
    fn set_then_clear_restores_original() {
        let config = DashboardConfig::from_json(DASHBOARD).expect("parse");
        let original = config.components.clone();
        let mut session = DashboardSession::in_memory(config);

        session
            .set_filter("region", FilterValue::list(["north"]))
            .expect("set");
        assert!(session.visible().len() < original.len());

        session
            .set_filter("region", FilterValue::list(Vec::<String>::new()))
            .expect("clear");
        assert_eq!(session.visible(), original.as_slice());
        assert!(session.state().is_empty());
    }

    /// Clearing the implicit default bar resets flat filters.
    #[test]
    fn clear_default_bar() {
        let config = DashboardConfig::from_json(DASHBOARD).expect("parse");
        let mut session = DashboardSession::in_memory(config);
        session
            .set_filter("valueRange", FilterValue::Range(500.0, 600.0))
            .expect("set");
        session.clear_bar("default").expect("clear");
        assert_eq!(ids(session.visible()), vec!["c1", "c2", "c3"]);
    }
}

// =============================================================================
// HYDRATION
// =============================================================================

mod hydration {
    use super::*;

    const DASHBOARD: &str = r#"{
        "components": [
            {"id": "c1", "type": "Card", "data": {"value": 120, "label": "Revenue"}},
            {"id": "c3", "title": "Q1 Summary"}
        ],
        "filters": [
            {"id": "q", "type": "search"},
            {"id": "valueRange", "type": "rangeSlider", "min": 0, "max": 1000}
        ]
    }"#;

    fn session(
        blob: Option<&str>,
        query: &str,
    ) -> (DashboardSession, MemoryStorage, MemoryQueryString) {
        let storage = blob.map_or_else(MemoryStorage::new, MemoryStorage::with_blob);
        let url = MemoryQueryString::with_query(query);
        let s = DashboardSession::new(
            DashboardConfig::from_json(DASHBOARD).expect("parse"),
            ResolverOptions::default(),
            Box::new(storage.clone()),
            Box::new(url.clone()),
        );
        (s, storage, url)
    }

    /// URL parameters override the persisted blob.
    #[test]
    fn url_wins_over_storage() {
        let (mut s, _, _) = session(Some(r#"{"q":"revenue"}"#), "q=summary");
        s.hydrate();
        assert_eq!(s.state().get("q"), Some(&FilterValue::text("summary")));
        assert_eq!(ids(s.visible()), vec!["c3"]);
    }

    /// Storage fills in what the URL does not mention.
    #[test]
    fn storage_fills_gaps() {
        let (mut s, _, _) = session(Some(r#"{"valueRange":[100,150]}"#), "q=revenue");
        s.hydrate();
        assert_eq!(s.state().len(), 2);
        assert_eq!(ids(s.visible()), vec!["c1"]);
    }

    /// A corrupt blob is treated as empty.
    #[test]
    fn malformed_blob_is_empty() {
        let (mut s, _, _) = session(Some("[[["), "");
        s.hydrate();
        assert!(s.state().is_empty());
        assert_eq!(s.visible().len(), 2);
    }

    /// A mutation writes both copies; a fresh session reads them back.
    #[test]
    fn state_survives_a_new_session() {
        let (mut s, storage, url) = session(None, "");
        s.set_filter("valueRange", FilterValue::Range(100.0, 150.0))
            .expect("set");
        assert_eq!(url.read(), "valueRange=100%2C150");

        let mut fresh = DashboardSession::new(
            DashboardConfig::from_json(DASHBOARD).expect("parse"),
            ResolverOptions::default(),
            Box::new(storage),
            Box::new(MemoryQueryString::new()),
        );
        fresh.hydrate();
        assert_eq!(fresh.state().get("valueRange"), Some(&FilterValue::Range(100.0, 150.0)));
    }
}
