// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol provider registry.
//!
//! Maps signalling element names to decoder functions. The bridge installs
//! the default providers once at `start()`; the transport hands each
//! delivered element's name and attribute payload to `decode()`.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::request::Request;

/// Decoder for one element name
pub type DecodeFn = fn(Value) -> Result<Request, ProviderError>;

/// Provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no provider registered for element: {0}")]
    UnknownElement(String),

    #[error("malformed {element} element: {source}")]
    Malformed {
        element: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Registry of element decoders
pub struct ProviderRegistry {
    by_element: HashMap<&'static str, DecodeFn>,
}

impl ProviderRegistry {
    /// Empty registry with no providers installed.
    pub fn new() -> Self {
        Self {
            by_element: HashMap::new(),
        }
    }

    /// Registry with all built-in element providers installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("conference", decode_conference);
        registry.register("conference-modify", decode_conference_modify);
        registry.register("health-check", |_| Ok(Request::HealthCheck));
        registry.register("version", |_| Ok(Request::Version));
        registry
    }

    pub fn register(&mut self, element: &'static str, decode: DecodeFn) {
        self.by_element.insert(element, decode);
    }

    /// Decode a delivered element by name.
    pub fn decode(&self, element: &str, payload: Value) -> Result<Request, ProviderError> {
        let decode = self
            .by_element
            .get(element)
            .ok_or_else(|| ProviderError::UnknownElement(element.to_string()))?;
        decode(payload)
    }

    pub fn elements(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_element.keys().copied()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn decode_conference(payload: Value) -> Result<Request, ProviderError> {
    serde_json::from_value(payload)
        .map(Request::Conference)
        .map_err(|source| ProviderError::Malformed {
            element: "conference".to_string(),
            source,
        })
}

fn decode_conference_modify(payload: Value) -> Result<Request, ProviderError> {
    serde_json::from_value(payload)
        .map(Request::ConferenceModify)
        .map_err(|source| ProviderError::Malformed {
            element: "conference-modify".to_string(),
            source,
        })
}

#[cfg(test)]
#[path = "providers_tests.rs"]
mod tests;
