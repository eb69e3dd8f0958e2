// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sfb-signaling: Wire-level request and reply values for the bridge
//! control protocol.
//!
//! Two dialects are carried side by side: the legacy `conference` element
//! (dialect v1) and the meeting-id-centric `conference-modify` element
//! (dialect v2). The transport that delivers these values is out of scope;
//! this crate only defines the shapes and the error-condition encoding.

pub mod providers;
pub mod reply;
pub mod request;

pub use providers::{ProviderError, ProviderRegistry};
pub use reply::{
    error_reply, ConferenceReply, ErrorCondition, ErrorReply, Reason, Reply, VersionReply,
};
pub use request::{ConferenceModifyRequest, ConferenceRequest, Dialect, Request};
