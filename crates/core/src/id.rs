// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier types and ID generation abstractions

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::clock::Clock;

/// Numeric gid value used when a request carries no gid.
///
/// Dialect-v2 conferences always use this sentinel; the gid concept only
/// exists for dialect-v1 compatibility and is otherwise opaque.
pub const GID_NOT_SET: i64 = -1;

/// Define a newtype ID wrapper around `String`.
///
/// Generates `new()`, `as_str()`, `Display`, `From<String>`, `From<&str>`,
/// `PartialEq<str>`, `PartialEq<&str>`, and `Borrow<str>` implementations.
///
/// ```ignore
/// define_id! {
///     /// Doc comment for the ID type.
///     pub struct MyId;
/// }
/// ```
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Bridge-local conference identifier.
    ///
    /// Unique among live conferences on this bridge instance for the lifetime
    /// of the conference; the value may be reused after expiration.
    pub struct ConferenceId;
}

define_id! {
    /// Externally supplied conference identifier.
    ///
    /// Meaningful to upstream signalling; unique among live conferences only.
    pub struct MeetingId;
}

define_id! {
    /// Identifier for a participant endpoint within a conference.
    pub struct EndpointId;
}

/// Encode a conference id from a millisecond timestamp and a random draw.
///
/// Pure up to its inputs: the registry's insertion retry loop owns
/// uniqueness, not this function.
pub fn encode_conference_id(now_millis: u64, draw: u64) -> String {
    format!("{:x}", now_millis.wrapping_add(draw))
}

/// Generates candidate identifiers
pub trait IdGen: Send + Sync {
    fn next(&self) -> String;
}

/// Time-plus-random ID generator for production use.
///
/// Candidates are not guaranteed unique; collisions are resolved by the
/// caller retrying. The random draw keeps retries distinct without waiting
/// on clock granularity.
pub struct TimeRandIdGen {
    clock: Arc<dyn Clock>,
}

impl TimeRandIdGen {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl IdGen for TimeRandIdGen {
    fn next(&self) -> String {
        let draw: u64 = rand::random();
        encode_conference_id(self.clock.epoch_millis(), draw)
    }
}

/// Sequential ID generator for testing
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("conf")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
