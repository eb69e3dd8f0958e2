// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sfb_core::{ConferenceId, MeetingId, NameError};

fn not_found() -> RequestErrorKind {
    RequestErrorKind::not_found_id(ConferenceId::new("does-not-exist"))
}

fn already_exists() -> RequestErrorKind {
    RequestErrorKind::AlreadyExists(MeetingId::new("m-1"))
}

#[yare::parameterized(
    v1_not_found  = { Dialect::V1, not_found(),      ErrorCondition::BadRequest,       None },
    v2_not_found  = { Dialect::V2, not_found(),      ErrorCondition::ItemNotFound,     Some(Reason::ConferenceNotFound) },
    v1_conflict   = { Dialect::V1, already_exists(), ErrorCondition::BadRequest,       None },
    v2_conflict   = { Dialect::V2, already_exists(), ErrorCondition::Conflict,         Some(Reason::ConferenceAlreadyExists) },
    v1_graceful   = { Dialect::V1, RequestErrorKind::GracefulShutdown, ErrorCondition::GracefulShutdown, None },
    v2_graceful   = { Dialect::V2, RequestErrorKind::GracefulShutdown, ErrorCondition::GracefulShutdown, None },
    v1_bad_name   = { Dialect::V1, RequestErrorKind::InvalidName(NameError::Empty), ErrorCondition::BadRequest, None },
    v2_bad_name   = { Dialect::V2, RequestErrorKind::InvalidName(NameError::Empty), ErrorCondition::BadRequest, None },
)]
fn error_encoding_table(
    dialect: Dialect,
    kind: RequestErrorKind,
    condition: ErrorCondition,
    reason: Option<Reason>,
) {
    let reply = error_reply(dialect, &kind);
    assert_eq!(reply.condition, condition);
    assert_eq!(reply.reason, reason);
}

#[test]
fn v1_not_found_message_names_the_id() {
    let reply = error_reply(Dialect::V1, &not_found());
    assert_eq!(
        reply.message.as_deref(),
        Some("Conference not found for ID: does-not-exist")
    );
}

#[test]
fn conditions_serialize_as_kebab_case() {
    let json = serde_json::to_value(ErrorCondition::ItemNotFound).unwrap();
    assert_eq!(json, "item-not-found");
    let json = serde_json::to_value(ErrorCondition::GracefulShutdown).unwrap();
    assert_eq!(json, "graceful-shutdown");
}

#[test]
fn reasons_serialize_as_screaming_snake_case() {
    let json = serde_json::to_value(Reason::ConferenceAlreadyExists).unwrap();
    assert_eq!(json, "CONFERENCE_ALREADY_EXISTS");
}

#[test]
fn error_reply_round_trips_on_the_wire() {
    let reply = Reply::Error(
        ErrorReply::new(ErrorCondition::Conflict)
            .with_message("conference already exists for meeting-id: m-1")
            .with_reason(Reason::ConferenceAlreadyExists),
    );
    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["type"], "error");
    assert_eq!(json["condition"], "conflict");
    assert_eq!(json["reason"], "CONFERENCE_ALREADY_EXISTS");
}

#[test]
fn conference_reply_accessor_covers_both_dialect_echoes() {
    let payload = ConferenceReply {
        id: ConferenceId::new("abc"),
        gid: None,
        name: None,
        meeting_id: None,
    };
    assert!(Reply::Conference(payload.clone()).conference().is_some());
    assert!(Reply::ConferenceModified(payload).conference().is_some());
    assert!(Reply::Result.conference().is_none());
}
