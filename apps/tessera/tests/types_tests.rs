//! Unit tests for API types serialization/deserialization.

#![allow(clippy::unwrap_used, clippy::panic)]

use serde_json::json;
use tessera::api::{
    ClassifiedComponent, ClassifyResponse, ErrorResponse, FilterRequest, HealthResponse,
    SetFilterRequest, StateResponse,
};
use tessera_core::{ActiveFilterState, Classification, ComponentRole, FilterValue};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let health: HealthResponse =
        serde_json::from_str(r#"{"status":"healthy","version":"1.0.0"}"#).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

// =============================================================================
// FILTER REQUEST TESTS
// =============================================================================

#[test]
fn test_set_filter_request_shapes() {
    let cases = [
        (json!({"value": true}), FilterValue::Flag(true)),
        (json!({"value": [1, 5]}), FilterValue::Range(1.0, 5.0)),
        (json!({"value": ["a", "b"]}), FilterValue::list(["a", "b"])),
        (json!({"value": "text"}), FilterValue::text("text")),
    ];
    for (raw, expected) in cases {
        let request: SetFilterRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.value, expected);
    }
}

#[test]
fn test_set_filter_request_requires_value() {
    assert!(serde_json::from_value::<SetFilterRequest>(json!({})).is_err());
}

#[test]
fn test_filter_request_state_defaults_to_empty() {
    let request: FilterRequest =
        serde_json::from_value(json!({"dashboard": {"components": []}})).unwrap();
    assert!(request.state.is_empty());
}

// =============================================================================
// RESPONSE TESTS
// =============================================================================

#[test]
fn test_state_response_serialization() {
    let response = StateResponse {
        active: ActiveFilterState::new().with("live", FilterValue::Flag(true)),
        query: "live=true".to_string(),
        visible: 2,
        total: 3,
    };

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(
        value,
        json!({"active": {"live": true}, "query": "live=true", "visible": 2, "total": 3})
    );
}

#[test]
fn test_classified_component_flattens_flags() {
    let response = ClassifyResponse {
        components: vec![ClassifiedComponent {
            id: "k".to_string(),
            role: ComponentRole::Aggregation,
            classification: Classification {
                is_card: true,
                is_time_series: false,
                is_aggregation: true,
            },
        }],
    };

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(
        value["components"][0],
        json!({
            "id": "k",
            "role": "aggregation",
            "isCard": true,
            "isTimeSeries": false,
            "isAggregation": true
        })
    );
}

#[test]
fn test_error_response_serialization() {
    let error = ErrorResponse {
        error: "Unknown filter: q".to_string(),
    };
    assert_eq!(
        serde_json::to_string(&error).unwrap(),
        r#"{"error":"Unknown filter: q"}"#
    );
}
