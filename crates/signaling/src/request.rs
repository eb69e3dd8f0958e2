// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request elements delivered by the signalling channel.
//!
//! Serializes with `{"type": "element-name", ...attributes}` format.

use serde::{Deserialize, Serialize};
use sfb_core::{ConferenceId, MeetingId};

/// Which protocol dialect a request arrived on.
///
/// The dialect decides how error conditions are encoded in replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    V1,
    V2,
}

/// A conference control request in either dialect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Dialect v1 `conference` element
    #[serde(rename = "conference")]
    Conference(ConferenceRequest),

    /// Dialect v2 `conference-modify` element
    #[serde(rename = "conference-modify")]
    ConferenceModify(ConferenceModifyRequest),

    /// Liveness probe
    #[serde(rename = "health-check")]
    HealthCheck,

    /// Application name / version / host OS query
    #[serde(rename = "version")]
    Version,
}

impl Request {
    /// The dialect this request belongs to, if it is a conference request.
    pub fn dialect(&self) -> Option<Dialect> {
        match self {
            Request::Conference(_) => Some(Dialect::V1),
            Request::ConferenceModify(_) => Some(Dialect::V2),
            _ => None,
        }
    }
}

/// Dialect v1 `conference` element.
///
/// All attributes are optional; an absent `id` asks the bridge to allocate
/// a conference. Nested content/channel descriptors are carried opaquely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConferenceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ConferenceId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, rename = "meeting-id", skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<MeetingId>,

    #[serde(
        default,
        rename = "rtcstats-enabled",
        skip_serializing_if = "Option::is_none"
    )]
    pub rtcstats_enabled: Option<bool>,

    #[serde(
        default,
        rename = "callstats-enabled",
        skip_serializing_if = "Option::is_none"
    )]
    pub callstats_enabled: Option<bool>,

    /// Content and channel descriptors, opaque to the control plane.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<serde_json::Value>,
}

/// Dialect v2 `conference-modify` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferenceModifyRequest {
    #[serde(rename = "meeting-id")]
    pub meeting_id: MeetingId,

    /// When true, the conference must not already exist.
    #[serde(default)]
    pub create: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        rename = "rtcstats-enabled",
        skip_serializing_if = "Option::is_none"
    )]
    pub rtcstats_enabled: Option<bool>,

    #[serde(
        default,
        rename = "callstats-enabled",
        skip_serializing_if = "Option::is_none"
    )]
    pub callstats_enabled: Option<bool>,
}

impl ConferenceModifyRequest {
    /// Lookup-only request for an existing conference.
    pub fn lookup(meeting_id: impl Into<MeetingId>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            create: false,
            name: None,
            rtcstats_enabled: None,
            callstats_enabled: None,
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
