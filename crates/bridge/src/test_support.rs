// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for the bridge crate's unit tests.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;

use sfb_core::{Clock, ConferenceId, EndpointId, MeetingId};
use sfb_signaling::{Reply, Request};

use crate::conference::{Conference, ConferenceFactory, ConferenceParams, ConferenceWork};
use crate::emitter::ConferenceObserver;
use crate::load::{LoadReducer, PacketRateMeasurement, PacketRateProvider};
use crate::registry::ConferenceCount;
use crate::shutdown::ShutdownService;

/// Recording conference that processes requests inline.
pub struct FakeConference {
    pub id: ConferenceId,
    pub meeting_id: Option<MeetingId>,
    pub gid: i64,
    pub name: Option<String>,
    pub created_at: Instant,
    pub expired: AtomicBool,
    pub expire_calls: AtomicUsize,
    pub should_expire: AtomicBool,
    pub last_n: AtomicI32,
    pub enqueued: Mutex<Vec<Request>>,
}

impl FakeConference {
    pub fn new(params: ConferenceParams) -> Arc<Self> {
        Self::new_at(params, Instant::now())
    }

    pub fn new_at(params: ConferenceParams, created_at: Instant) -> Arc<Self> {
        Arc::new(Self {
            id: params.id,
            meeting_id: params.meeting_id,
            gid: params.gid,
            name: params.name,
            created_at,
            expired: AtomicBool::new(false),
            expire_calls: AtomicUsize::new(0),
            should_expire: AtomicBool::new(false),
            last_n: AtomicI32::new(25),
            enqueued: Mutex::new(Vec::new()),
        })
    }

    fn echo(&self) -> sfb_signaling::ConferenceReply {
        sfb_signaling::ConferenceReply {
            id: self.id.clone(),
            gid: None,
            name: self.name.clone(),
            meeting_id: self.meeting_id.clone(),
        }
    }
}

impl Conference for FakeConference {
    fn id(&self) -> &ConferenceId {
        &self.id
    }

    fn meeting_id(&self) -> Option<&MeetingId> {
        self.meeting_id.as_ref()
    }

    fn gid(&self) -> i64 {
        self.gid
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn enqueue(&self, work: ConferenceWork) {
        let reply = match &work.request {
            Request::ConferenceModify(_) => Reply::ConferenceModified(self.echo()),
            _ => Reply::Conference(self.echo()),
        };
        self.enqueued.lock().push(work.request);
        let _ = work.reply_tx.send(reply);
    }

    fn handle_sync(&self, request: Request) -> Reply {
        let reply = match &request {
            Request::ConferenceModify(_) => Reply::ConferenceModified(self.echo()),
            _ => Reply::Conference(self.echo()),
        };
        self.enqueued.lock().push(request);
        reply
    }

    fn expire(&self) {
        self.expire_calls.fetch_add(1, Ordering::SeqCst);
        self.expired.store(true, Ordering::SeqCst);
    }

    fn expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    fn should_expire(&self) -> bool {
        self.expired() || self.should_expire.load(Ordering::SeqCst)
    }

    fn created_at(&self) -> Instant {
        self.created_at
    }

    fn last_n(&self) -> i32 {
        self.last_n.load(Ordering::SeqCst)
    }

    fn set_last_n(&self, n: i32) {
        self.last_n.store(n, Ordering::SeqCst);
    }

    fn debug_snapshot(
        &self,
        full: bool,
        _endpoint_id: Option<&EndpointId>,
    ) -> IndexMap<String, Value> {
        let mut map = IndexMap::new();
        map.insert("expired".to_string(), Value::from(self.expired()));
        if full {
            map.insert("lastN".to_string(), Value::from(self.last_n()));
        }
        map
    }
}

/// Factory producing [`FakeConference`]s and remembering them.
#[derive(Default)]
pub struct FakeConferenceFactory {
    pub created: Mutex<Vec<Arc<FakeConference>>>,
    clock: Option<Arc<dyn Clock>>,
}

impl FakeConferenceFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Factory whose conferences take their creation instant from the
    /// given clock, so lifetime math lines up with a fake clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            created: Mutex::new(Vec::new()),
            clock: Some(clock),
        })
    }
}

impl ConferenceFactory for FakeConferenceFactory {
    fn create(&self, params: ConferenceParams) -> Arc<dyn Conference> {
        let created_at = self
            .clock
            .as_ref()
            .map(|clock| clock.now())
            .unwrap_or_else(Instant::now);
        let conference = FakeConference::new_at(params, created_at);
        self.created.lock().push(Arc::clone(&conference));
        conference
    }
}

/// Id generator that replays a scripted sequence, then falls back to a
/// counter. Used to force collisions.
pub struct ScriptedIdGen {
    script: Mutex<Vec<String>>,
    fallback: AtomicUsize,
}

impl ScriptedIdGen {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: Mutex::new(script.iter().rev().map(|s| s.to_string()).collect()),
            fallback: AtomicUsize::new(0),
        }
    }
}

impl sfb_core::IdGen for ScriptedIdGen {
    fn next(&self) -> String {
        if let Some(id) = self.script.lock().pop() {
            return id;
        }
        let n = self.fallback.fetch_add(1, Ordering::SeqCst);
        format!("fallback-{n}")
    }
}

/// Observer recording event order.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<(String, ConferenceId)>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl ConferenceObserver for RecordingObserver {
    fn conference_created(&self, conference: &Arc<dyn Conference>) {
        self.events
            .lock()
            .push(("created".to_string(), conference.id().clone()));
    }

    fn conference_expired(&self, conference: &Arc<dyn Conference>) {
        self.events
            .lock()
            .push(("expired".to_string(), conference.id().clone()));
    }
}

/// Shutdown service counting invocations instead of exiting.
#[derive(Default)]
pub struct RecordingShutdownService {
    pub begin_calls: AtomicUsize,
    pub force_calls: AtomicUsize,
}

impl RecordingShutdownService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl ShutdownService for RecordingShutdownService {
    fn begin_shutdown(&self) {
        self.begin_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn force_exit(&self) {
        self.force_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Conference count backed by an atomic, for shutdown tests.
#[derive(Default)]
pub struct StubConferenceCount(pub AtomicUsize);

impl StubConferenceCount {
    pub fn new(count: usize) -> Arc<Self> {
        Arc::new(Self(AtomicUsize::new(count)))
    }
}

impl ConferenceCount for StubConferenceCount {
    fn live_count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Packet rate provider returning a settable value.
#[derive(Default)]
pub struct StubPacketRateProvider {
    pub rate: Mutex<f64>,
}

impl StubPacketRateProvider {
    pub fn new(rate: f64) -> Arc<Self> {
        Arc::new(Self {
            rate: Mutex::new(rate),
        })
    }
}

impl PacketRateProvider for StubPacketRateProvider {
    fn measure(&self) -> PacketRateMeasurement {
        PacketRateMeasurement {
            packets_per_second: *self.rate.lock(),
        }
    }
}

/// Reducer recording each invocation's conference count.
#[derive(Default)]
pub struct RecordingReducer {
    pub calls: Mutex<Vec<usize>>,
}

impl RecordingReducer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl LoadReducer for RecordingReducer {
    fn reduce(&self, conferences: &[Arc<dyn Conference>]) {
        self.calls.lock().push(conferences.len());
    }
}
