// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reply values produced for the signalling channel, including the
//! dialect-specific error-condition encoding.

use serde::{Deserialize, Serialize};
use sfb_core::{ConferenceId, MeetingId, RequestErrorKind};

use crate::request::Dialect;

/// A reply to a signalling request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Reply {
    /// Dialect v1 echo of the resolved conference
    #[serde(rename = "conference")]
    Conference(ConferenceReply),

    /// Dialect v2 echo of the resolved conference
    #[serde(rename = "conference-modified")]
    ConferenceModified(ConferenceReply),

    /// Bare success form (health check)
    #[serde(rename = "result")]
    Result,

    #[serde(rename = "version")]
    Version(VersionReply),

    #[serde(rename = "error")]
    Error(ErrorReply),
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// The error payload, if this is an error reply.
    pub fn error(&self) -> Option<&ErrorReply> {
        match self {
            Reply::Error(e) => Some(e),
            _ => None,
        }
    }

    /// The echoed conference payload, if this is a success reply.
    pub fn conference(&self) -> Option<&ConferenceReply> {
        match self {
            Reply::Conference(c) | Reply::ConferenceModified(c) => Some(c),
            _ => None,
        }
    }
}

/// Echoed-back conference attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConferenceReply {
    pub id: ConferenceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, rename = "meeting-id", skip_serializing_if = "Option::is_none")]
    pub meeting_id: Option<MeetingId>,
}

/// Application name, version string, and host OS name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionReply {
    pub name: String,
    pub version: String,
    pub os: String,
}

/// Error wrapper carrying a condition code and optional structured reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub condition: ErrorCondition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Dialect-v2 structured reason extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
}

impl ErrorReply {
    pub fn new(condition: ErrorCondition) -> Self {
        Self {
            condition,
            message: None,
            reason: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_reason(mut self, reason: Reason) -> Self {
        self.reason = Some(reason);
        self
    }
}

/// Wire-level error condition codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCondition {
    BadRequest,
    Conflict,
    ItemNotFound,
    InternalServerError,
    GracefulShutdown,
}

/// Dialect-v2 reason extension values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    ConferenceAlreadyExists,
    ConferenceNotFound,
}

/// Convert an internal error kind to its dialect-specific error reply.
///
/// Dialect v1 folds both NotFound and AlreadyExists into `bad-request` for
/// upstream compatibility; dialect v2 uses distinct conditions with
/// structured reason extensions.
pub fn error_reply(dialect: Dialect, kind: &RequestErrorKind) -> ErrorReply {
    match (dialect, kind) {
        (Dialect::V1, RequestErrorKind::NotFound(_)) => {
            ErrorReply::new(ErrorCondition::BadRequest).with_message(kind.to_string())
        }
        (Dialect::V2, RequestErrorKind::NotFound(_)) => {
            ErrorReply::new(ErrorCondition::ItemNotFound)
                .with_message(kind.to_string())
                .with_reason(Reason::ConferenceNotFound)
        }
        (Dialect::V1, RequestErrorKind::AlreadyExists(_)) => {
            ErrorReply::new(ErrorCondition::BadRequest).with_message(kind.to_string())
        }
        (Dialect::V2, RequestErrorKind::AlreadyExists(_)) => {
            ErrorReply::new(ErrorCondition::Conflict)
                .with_message(kind.to_string())
                .with_reason(Reason::ConferenceAlreadyExists)
        }
        (_, RequestErrorKind::GracefulShutdown) => {
            ErrorReply::new(ErrorCondition::GracefulShutdown).with_message(kind.to_string())
        }
        (_, RequestErrorKind::InvalidName(_)) | (_, RequestErrorKind::BadRequest(_)) => {
            ErrorReply::new(ErrorCondition::BadRequest).with_message(kind.to_string())
        }
    }
}

#[cfg(test)]
#[path = "reply_tests.rs"]
mod tests;
