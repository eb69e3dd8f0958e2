// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_decode_all_builtin_elements() {
    let registry = ProviderRegistry::with_defaults();

    let req = registry
        .decode("conference", serde_json::json!({"id": "abc"}))
        .unwrap();
    assert!(matches!(req, Request::Conference(_)));

    let req = registry
        .decode(
            "conference-modify",
            serde_json::json!({"meeting-id": "m-1", "create": true}),
        )
        .unwrap();
    assert!(matches!(req, Request::ConferenceModify(_)));

    assert!(matches!(
        registry.decode("health-check", serde_json::json!({})),
        Ok(Request::HealthCheck)
    ));
    assert!(matches!(
        registry.decode("version", serde_json::json!({})),
        Ok(Request::Version)
    ));
}

#[test]
fn unknown_element_is_rejected() {
    let registry = ProviderRegistry::with_defaults();
    let err = registry
        .decode("colibri-wrong", serde_json::json!({}))
        .unwrap_err();
    assert!(matches!(err, ProviderError::UnknownElement(_)));
}

#[test]
fn malformed_payload_reports_the_element() {
    let registry = ProviderRegistry::with_defaults();
    // conference-modify requires meeting-id
    let err = registry
        .decode("conference-modify", serde_json::json!({"create": true}))
        .unwrap_err();
    match err {
        ProviderError::Malformed { element, .. } => assert_eq!(element, "conference-modify"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn custom_provider_can_be_registered() {
    let mut registry = ProviderRegistry::new();
    registry.register("health-check", |_| Ok(Request::HealthCheck));
    assert!(registry.decode("health-check", serde_json::json!({})).is_ok());
    assert!(registry.decode("conference", serde_json::json!({})).is_err());
}
