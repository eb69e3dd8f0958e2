// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous fan-out of conference lifecycle events.
//!
//! Handlers run on the caller's thread. The handler list has its own
//! mutex and is copied before iteration, so a handler may add or remove
//! observers, and event delivery never happens under the registry mutex.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::conference::Conference;

/// Observer of conference lifecycle events.
///
/// Handlers must not block on the registry mutex; snapshot reads are fine.
pub trait ConferenceObserver: Send + Sync {
    fn conference_created(&self, conference: &Arc<dyn Conference>);
    fn conference_expired(&self, conference: &Arc<dyn Conference>);
}

/// Dynamic list of observers with copy-on-iterate delivery.
#[derive(Default)]
pub struct EventEmitter {
    observers: Mutex<Vec<Arc<dyn ConferenceObserver>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&self, observer: Arc<dyn ConferenceObserver>) {
        self.observers.lock().push(observer);
    }

    pub fn remove_observer(&self, observer: &Arc<dyn ConferenceObserver>) {
        self.observers
            .lock()
            .retain(|o| !Arc::ptr_eq(o, observer));
    }

    pub fn emit_created(&self, conference: &Arc<dyn Conference>) {
        for observer in self.snapshot() {
            observer.conference_created(conference);
        }
    }

    pub fn emit_expired(&self, conference: &Arc<dyn Conference>) {
        for observer in self.snapshot() {
            observer.conference_expired(conference);
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn ConferenceObserver>> {
        self.observers.lock().clone()
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
