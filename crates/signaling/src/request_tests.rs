// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn v1_request_uses_wire_attribute_names() {
    let json = serde_json::json!({
        "type": "conference",
        "meeting-id": "m-1",
        "rtcstats-enabled": true,
    });
    let req: Request = serde_json::from_value(json).unwrap();

    let Request::Conference(conf) = req else {
        panic!("expected conference request");
    };
    assert_eq!(conf.meeting_id.as_ref().unwrap(), &MeetingId::new("m-1"));
    assert_eq!(conf.rtcstats_enabled, Some(true));
    assert!(conf.id.is_none());
    assert!(conf.contents.is_empty());
}

#[test]
fn v1_contents_pass_through_opaquely() {
    let json = serde_json::json!({
        "type": "conference",
        "id": "abc",
        "contents": [{"name": "audio", "channels": [{"endpoint": "e-1"}]}],
    });
    let req: Request = serde_json::from_value(json).unwrap();

    let Request::Conference(conf) = req else {
        panic!("expected conference request");
    };
    assert_eq!(conf.contents.len(), 1);
    assert_eq!(conf.contents[0]["name"], "audio");
}

#[test]
fn v2_create_flag_defaults_to_false() {
    let json = serde_json::json!({
        "type": "conference-modify",
        "meeting-id": "m-2",
    });
    let req: Request = serde_json::from_value(json).unwrap();

    let Request::ConferenceModify(modify) = req else {
        panic!("expected conference-modify request");
    };
    assert!(!modify.create);
    assert_eq!(modify.meeting_id, "m-2");
}

#[test]
fn dialect_follows_element() {
    let v1 = Request::Conference(ConferenceRequest::default());
    let v2 = Request::ConferenceModify(ConferenceModifyRequest::lookup("m"));
    assert_eq!(v1.dialect(), Some(Dialect::V1));
    assert_eq!(v2.dialect(), Some(Dialect::V2));
    assert_eq!(Request::HealthCheck.dialect(), None);
}
