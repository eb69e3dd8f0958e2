// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conference registry: the two cross-invariant indices.
//!
//! A single mutex guards both indices. Every mutation that touches them
//! happens in one critical section, so no observer can see a conference in
//! `byMeetingId` that is missing from `byId`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use sfb_core::{ConferenceId, ConferenceName, IdGen, MeetingId, RequestErrorKind, GID_NOT_SET};
use sfb_signaling::ConferenceModifyRequest;

use crate::conference::{Conference, ConferenceFactory, ConferenceParams};

/// Narrow view of the registry for the shutdown coordinator.
pub trait ConferenceCount: Send + Sync {
    fn live_count(&self) -> usize;
}

/// Parameters for a registry-level create.
#[derive(Debug, Clone, Default)]
pub struct CreateConferenceParams {
    pub name: Option<String>,
    pub gid: Option<i64>,
    pub meeting_id: Option<MeetingId>,
    pub rtcstats_enabled: bool,
    pub callstats_enabled: bool,
    /// When true, an existing live conference with the same meeting id
    /// fails the create instead of being tolerated.
    pub strict_meeting_id: bool,
}

/// Outcome of a dialect-v2 resolve.
#[derive(Debug)]
pub struct ModifyResolution {
    pub conference: Arc<dyn Conference>,
    pub created: bool,
}

struct Indices {
    by_id: HashMap<ConferenceId, Arc<dyn Conference>>,
    by_meeting_id: HashMap<MeetingId, Arc<dyn Conference>>,
}

/// The two conference indices behind one mutex.
pub struct ConferenceRegistry {
    inner: Mutex<Indices>,
    id_gen: Arc<dyn IdGen>,
    factory: Arc<dyn ConferenceFactory>,
}

impl ConferenceRegistry {
    pub fn new(id_gen: Arc<dyn IdGen>, factory: Arc<dyn ConferenceFactory>) -> Self {
        Self {
            inner: Mutex::new(Indices {
                by_id: HashMap::new(),
                by_meeting_id: HashMap::new(),
            }),
            id_gen,
            factory,
        }
    }

    pub fn get_by_id(&self, id: &ConferenceId) -> Option<Arc<dyn Conference>> {
        self.inner.lock().by_id.get(id).cloned()
    }

    pub fn get_by_meeting_id(&self, meeting_id: &MeetingId) -> Option<Arc<dyn Conference>> {
        self.inner.lock().by_meeting_id.get(meeting_id).cloned()
    }

    /// Independent snapshot of the live conferences.
    pub fn list(&self) -> Vec<Arc<dyn Conference>> {
        self.inner.lock().by_id.values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().by_id.len()
    }

    /// Create and index a conference.
    ///
    /// Holds the registry mutex across the meeting-id check, the id retry
    /// loop, and both inserts. The caller emits the created event (after
    /// this returns, before any dispatch).
    pub fn create(
        &self,
        params: CreateConferenceParams,
    ) -> Result<Arc<dyn Conference>, RequestErrorKind> {
        let mut indices = self.inner.lock();
        self.create_locked(&mut indices, params)
    }

    /// Resolve a dialect-v2 request: decision and possible create happen
    /// under one hold of the registry mutex.
    pub fn resolve_modify(
        &self,
        request: &ConferenceModifyRequest,
        shutting_down: impl FnOnce() -> bool,
    ) -> Result<ModifyResolution, RequestErrorKind> {
        let mut indices = self.inner.lock();
        let existing = indices.by_meeting_id.get(&request.meeting_id).cloned();

        if !request.create {
            return match existing {
                Some(conference) => Ok(ModifyResolution {
                    conference,
                    created: false,
                }),
                None => Err(RequestErrorKind::not_found_meeting(
                    request.meeting_id.clone(),
                )),
            };
        }

        if existing.is_some() {
            return Err(RequestErrorKind::AlreadyExists(request.meeting_id.clone()));
        }
        if shutting_down() {
            return Err(RequestErrorKind::GracefulShutdown);
        }
        if let Some(raw) = &request.name {
            ConferenceName::parse(raw.as_str())?;
        }

        let conference = self.create_locked(
            &mut indices,
            CreateConferenceParams {
                name: request.name.clone(),
                gid: Some(GID_NOT_SET),
                meeting_id: Some(request.meeting_id.clone()),
                rtcstats_enabled: request.rtcstats_enabled.unwrap_or(false),
                callstats_enabled: request.callstats_enabled.unwrap_or(false),
                strict_meeting_id: true,
            },
        )?;
        Ok(ModifyResolution {
            conference,
            created: true,
        })
    }

    /// Remove a conference from both indices in one critical section.
    ///
    /// Returns false if this exact conference is no longer indexed, which
    /// makes the caller's expire path idempotent.
    pub fn remove(&self, conference: &Arc<dyn Conference>) -> bool {
        let mut indices = self.inner.lock();
        let id = conference.id();
        let indexed = indices
            .by_id
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(current, conference));
        if !indexed {
            return false;
        }
        indices.by_id.remove(id);
        if let Some(mid) = conference.meeting_id() {
            // Only drop the meeting-id entry when it points at this
            // conference; a tolerated v1 duplicate may own the slot.
            let owns_slot = indices
                .by_meeting_id
                .get(mid)
                .is_some_and(|mapped| Arc::ptr_eq(mapped, conference));
            if owns_slot {
                indices.by_meeting_id.remove(mid);
            }
        }
        true
    }

    fn create_locked(
        &self,
        indices: &mut Indices,
        params: CreateConferenceParams,
    ) -> Result<Arc<dyn Conference>, RequestErrorKind> {
        if let Some(mid) = &params.meeting_id {
            if params.strict_meeting_id && indices.by_meeting_id.contains_key(mid) {
                return Err(RequestErrorKind::AlreadyExists(mid.clone()));
            }
        }

        // Candidate ids are not unique; retry until insertion succeeds.
        let id = loop {
            let candidate = ConferenceId::new(self.id_gen.next());
            if !indices.by_id.contains_key(&candidate) {
                break candidate;
            }
            debug!(candidate = %candidate, "conference id collision, retrying");
        };

        let conference = self.factory.create(ConferenceParams {
            id: id.clone(),
            name: params.name,
            gid: params.gid.unwrap_or(GID_NOT_SET),
            meeting_id: params.meeting_id,
            rtcstats_enabled: params.rtcstats_enabled,
            callstats_enabled: params.callstats_enabled,
        });

        indices.by_id.insert(id, Arc::clone(&conference));
        if let Some(mid) = conference.meeting_id() {
            // Legacy dialect tolerance: never displace an existing entry.
            indices
                .by_meeting_id
                .entry(mid.clone())
                .or_insert_with(|| Arc::clone(&conference));
        }
        Ok(conference)
    }
}

impl ConferenceCount for ConferenceRegistry {
    fn live_count(&self) -> usize {
        self.count()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
