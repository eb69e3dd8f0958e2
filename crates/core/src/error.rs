// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request-level error taxonomy.
//!
//! These are the internal kinds the router produces while resolving a
//! request; the signalling layer converts each kind into a dialect-specific
//! error reply at the boundary.

use thiserror::Error;

use crate::id::{ConferenceId, MeetingId};
use crate::name::NameError;

/// Key by which a conference lookup failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConferenceKey {
    Id(ConferenceId),
    Meeting(MeetingId),
}

impl std::fmt::Display for ConferenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConferenceKey::Id(id) => write!(f, "ID: {id}"),
            ConferenceKey::Meeting(mid) => write!(f, "meeting-id: {mid}"),
        }
    }
}

/// Errors that can occur while routing a conference control request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestErrorKind {
    #[error("Conference not found for {0}")]
    NotFound(ConferenceKey),
    #[error("conference already exists for meeting-id: {0}")]
    AlreadyExists(MeetingId),
    #[error("bridge is in graceful shutdown")]
    GracefulShutdown,
    #[error("invalid conference name: {0}")]
    InvalidName(#[from] NameError),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl RequestErrorKind {
    /// NotFound for a bridge-local conference id.
    pub fn not_found_id(id: ConferenceId) -> Self {
        Self::NotFound(ConferenceKey::Id(id))
    }

    /// NotFound for an externally supplied meeting id.
    pub fn not_found_meeting(mid: MeetingId) -> Self {
        Self::NotFound(ConferenceKey::Meeting(mid))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
