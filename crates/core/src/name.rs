// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conference name validation.
//!
//! Conference names are JID-shaped addressable strings of the form
//! `local@domain`. Dialect v2 rejects creates whose name does not parse;
//! dialect v1 carries the name opaquely.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A validated `local@domain` conference name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConferenceName(String);

/// Name validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("conference name is empty")]
    Empty,
    #[error("conference name has no '@' separator: {0}")]
    MissingSeparator(String),
    #[error("conference name has more than one '@': {0}")]
    ExtraSeparator(String),
    #[error("conference name has an empty localpart: {0}")]
    EmptyLocal(String),
    #[error("conference name has an empty domain: {0}")]
    EmptyDomain(String),
    #[error("conference name contains whitespace: {0}")]
    Whitespace(String),
}

impl ConferenceName {
    /// Parse and validate a name.
    pub fn parse(raw: impl Into<String>) -> Result<Self, NameError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(NameError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(NameError::Whitespace(raw));
        }
        let mut parts = raw.split('@');
        let local = parts.next().unwrap_or("");
        let Some(domain) = parts.next() else {
            return Err(NameError::MissingSeparator(raw));
        };
        if parts.next().is_some() {
            return Err(NameError::ExtraSeparator(raw));
        }
        if local.is_empty() {
            return Err(NameError::EmptyLocal(raw));
        }
        if domain.is_empty() {
            return Err(NameError::EmptyDomain(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the `@`.
    pub fn local(&self) -> &str {
        self.0.split('@').next().unwrap_or("")
    }

    /// The part after the `@`.
    pub fn domain(&self) -> &str {
        self.0.split('@').nth(1).unwrap_or("")
    }
}

impl std::fmt::Display for ConferenceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ConferenceName {
    type Error = NameError;

    fn try_from(s: String) -> Result<Self, NameError> {
        Self::parse(s)
    }
}

impl From<ConferenceName> for String {
    fn from(name: ConferenceName) -> String {
        name.0
    }
}

#[cfg(test)]
#[path = "name_tests.rs"]
mod tests;
