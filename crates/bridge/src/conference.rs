// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conference contract and the default queue-backed implementation.
//!
//! The control plane treats each conference as an opaque actor: requests
//! are handed off to the conference's ingress queue and the conference
//! alone produces the reply. Each conference drains its queue with its own
//! worker, so a slow conference never blocks another one.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use sfb_core::{Clock, ConferenceId, EndpointId, MeetingId, GID_NOT_SET};
use sfb_signaling::{ConferenceReply, ErrorCondition, ErrorReply, Reply, Request};

use crate::stats::QueueStats;

/// A request handed off to a conference, with its reply path.
///
/// Whoever holds the work item owes the reply.
pub struct ConferenceWork {
    pub request: Request,
    pub reply_tx: oneshot::Sender<Reply>,
}

/// What the control plane demands of each conference.
pub trait Conference: Send + Sync {
    fn id(&self) -> &ConferenceId;
    fn meeting_id(&self) -> Option<&MeetingId>;
    fn gid(&self) -> i64;
    fn name(&self) -> Option<&str>;

    /// Non-blocking hand-off onto the conference's ingress queue.
    ///
    /// The conference becomes responsible for producing and sending the
    /// reply.
    fn enqueue(&self, work: ConferenceWork);

    /// Inline dispatch variant for tests; processes the request and
    /// returns the reply directly.
    fn handle_sync(&self, request: Request) -> Reply;

    /// Idempotent terminal operation. Must not call back into the
    /// registry.
    fn expire(&self);

    fn expired(&self) -> bool;

    /// Whether the expiration sweeper should retire this conference.
    fn should_expire(&self) -> bool;

    /// When the conference was constructed, for lifetime accounting.
    fn created_at(&self) -> Instant;

    fn last_n(&self) -> i32;
    fn set_last_n(&self, n: i32);

    /// Per-conference debug projection. Reading it is not activity and
    /// must not defer expiration.
    fn debug_snapshot(&self, full: bool, endpoint_id: Option<&EndpointId>)
        -> IndexMap<String, Value>;
}

impl std::fmt::Debug for dyn Conference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conference").field("id", self.id()).finish()
    }
}

/// Construction parameters handed to a [`ConferenceFactory`].
#[derive(Debug, Clone)]
pub struct ConferenceParams {
    pub id: ConferenceId,
    pub name: Option<String>,
    pub gid: i64,
    pub meeting_id: Option<MeetingId>,
    pub rtcstats_enabled: bool,
    pub callstats_enabled: bool,
}

/// Constructs conference instances for the registry.
pub trait ConferenceFactory: Send + Sync {
    fn create(&self, params: ConferenceParams) -> Arc<dyn Conference>;
}

/// Default conference: a bounded FIFO ingress queue drained by one worker
/// task per conference.
pub struct BridgeConference {
    id: ConferenceId,
    name: Option<String>,
    gid: i64,
    meeting_id: Option<MeetingId>,
    rtcstats_enabled: bool,
    callstats_enabled: bool,
    clock: Arc<dyn Clock>,
    created_at: Instant,
    expire_after: Duration,
    expired: AtomicBool,
    last_n: AtomicI32,
    // Taken on expire so the worker sees the channel close and drains out.
    queue_tx: Mutex<Option<mpsc::Sender<ConferenceWork>>>,
    queue_depth: Arc<QueueDepth>,
    queue_stats: Arc<QueueStats>,
    last_activity: Mutex<Instant>,
}

/// Shared between the conference and its worker to report queue depth.
struct QueueDepth(std::sync::atomic::AtomicUsize);

impl BridgeConference {
    fn new(
        params: ConferenceParams,
        clock: Arc<dyn Clock>,
        expire_after: Duration,
        queue_capacity: usize,
        default_last_n: i32,
        queue_stats: Arc<QueueStats>,
    ) -> Arc<Self> {
        let (queue_tx, queue_rx) = mpsc::channel(queue_capacity);
        let now = clock.now();
        let queue_depth = Arc::new(QueueDepth(std::sync::atomic::AtomicUsize::new(0)));

        let conference = Arc::new(Self {
            id: params.id,
            name: params.name,
            gid: params.gid,
            meeting_id: params.meeting_id,
            rtcstats_enabled: params.rtcstats_enabled,
            callstats_enabled: params.callstats_enabled,
            clock,
            created_at: now,
            expire_after,
            expired: AtomicBool::new(false),
            last_n: AtomicI32::new(default_last_n),
            queue_tx: Mutex::new(Some(queue_tx)),
            queue_depth: Arc::clone(&queue_depth),
            queue_stats,
            last_activity: Mutex::new(now),
        });

        spawn_queue_worker(queue_rx, queue_depth, ConferenceEcho::of(&conference));
        conference
    }

    fn touch(&self) {
        *self.last_activity.lock() = self.clock.now();
    }
}

impl Conference for BridgeConference {
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
        self.touch();
        let tx = self.queue_tx.lock().clone();
        let Some(tx) = tx else {
            let _ = work.reply_tx.send(expired_reply(&self.id));
            return;
        };
        match tx.try_send(work) {
            Ok(()) => {
                self.queue_depth.0.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(work)) => {
                self.queue_stats.dropped_packets.fetch_add(1, Ordering::Relaxed);
                warn!(conference_id = %self.id, "conference ingress queue full, dropping request");
                let _ = work.reply_tx.send(Reply::Error(
                    ErrorReply::new(ErrorCondition::InternalServerError)
                        .with_message("conference queue overflow"),
                ));
            }
            Err(mpsc::error::TrySendError::Closed(work)) => {
                let _ = work.reply_tx.send(expired_reply(&self.id));
            }
        }
    }

    fn handle_sync(&self, request: Request) -> Reply {
        self.touch();
        ConferenceEcho::of_ref(self).process(request)
    }

    fn expire(&self) {
        if self.expired.swap(true, Ordering::SeqCst) {
            return;
        }
        // Dropping the sender lets the worker drain the queue and stop.
        self.queue_tx.lock().take();
        debug!(conference_id = %self.id, "conference expired");
    }

    fn expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    fn should_expire(&self) -> bool {
        if self.expired() {
            return true;
        }
        let idle = self.clock.now() - *self.last_activity.lock();
        idle >= self.expire_after
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
        endpoint_id: Option<&EndpointId>,
    ) -> IndexMap<String, Value> {
        let mut map = IndexMap::new();
        if let Some(mid) = &self.meeting_id {
            map.insert("meetingId".to_string(), Value::from(mid.as_str()));
        }
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::from(name.as_str()));
        }
        map.insert("expired".to_string(), Value::from(self.expired()));
        if full {
            if self.gid != GID_NOT_SET {
                map.insert("gid".to_string(), Value::from(self.gid));
            }
            map.insert("lastN".to_string(), Value::from(self.last_n()));
            map.insert(
                "queueDepth".to_string(),
                Value::from(self.queue_depth.0.load(Ordering::Relaxed) as u64),
            );
            map.insert(
                "rtcstatsEnabled".to_string(),
                Value::from(self.rtcstats_enabled),
            );
            map.insert(
                "callstatsEnabled".to_string(),
                Value::from(self.callstats_enabled),
            );
            // Endpoint internals live in the media plane; the projection
            // keys are stable either way.
            let endpoints: IndexMap<String, Value> = IndexMap::new();
            let _ = endpoint_id;
            map.insert(
                "endpoints".to_string(),
                Value::Object(endpoints.into_iter().collect()),
            );
        }
        map
    }
}

/// Echo data the queue worker needs to produce replies without holding a
/// reference back to the conference.
#[derive(Clone)]
struct ConferenceEcho {
    id: ConferenceId,
    gid: i64,
    name: Option<String>,
    meeting_id: Option<MeetingId>,
}

impl ConferenceEcho {
    fn of(conference: &Arc<BridgeConference>) -> Self {
        Self::of_ref(conference)
    }

    fn of_ref(conference: &BridgeConference) -> Self {
        Self {
            id: conference.id.clone(),
            gid: conference.gid,
            name: conference.name.clone(),
            meeting_id: conference.meeting_id.clone(),
        }
    }

    fn reply_payload(&self) -> ConferenceReply {
        ConferenceReply {
            id: self.id.clone(),
            gid: (self.gid != GID_NOT_SET).then_some(self.gid),
            name: self.name.clone(),
            meeting_id: self.meeting_id.clone(),
        }
    }

    /// Process one request. Channel and content mutation belongs to the
    /// media plane; the control plane's conference echoes its identity.
    fn process(&self, request: Request) -> Reply {
        match request {
            Request::Conference(_) => Reply::Conference(self.reply_payload()),
            Request::ConferenceModify(_) => Reply::ConferenceModified(self.reply_payload()),
            Request::HealthCheck | Request::Version => Reply::Error(
                ErrorReply::new(ErrorCondition::BadRequest)
                    .with_message("not a conference request"),
            ),
        }
    }
}

fn spawn_queue_worker(
    mut queue_rx: mpsc::Receiver<ConferenceWork>,
    queue_depth: Arc<QueueDepth>,
    echo: ConferenceEcho,
) {
    tokio::spawn(async move {
        while let Some(work) = queue_rx.recv().await {
            queue_depth.0.fetch_sub(1, Ordering::Relaxed);
            let reply = echo.process(work.request);
            // Receiver may have gone away; the conference owes no more.
            let _ = work.reply_tx.send(reply);
        }
        debug!(conference_id = %echo.id, "conference queue drained");
    });
}

fn expired_reply(id: &ConferenceId) -> Reply {
    Reply::Error(
        ErrorReply::new(ErrorCondition::BadRequest)
            .with_message(format!("Conference not found for ID: {id}")),
    )
}

/// Factory for [`BridgeConference`] instances.
pub struct BridgeConferenceFactory {
    clock: Arc<dyn Clock>,
    expire_after: Duration,
    queue_capacity: usize,
    default_last_n: i32,
    queue_stats: Arc<QueueStats>,
}

impl BridgeConferenceFactory {
    pub fn new(
        clock: Arc<dyn Clock>,
        expire_after: Duration,
        queue_capacity: usize,
        default_last_n: i32,
        queue_stats: Arc<QueueStats>,
    ) -> Self {
        Self {
            clock,
            expire_after,
            queue_capacity,
            default_last_n,
            queue_stats,
        }
    }
}

impl ConferenceFactory for BridgeConferenceFactory {
    fn create(&self, params: ConferenceParams) -> Arc<dyn Conference> {
        BridgeConference::new(
            params,
            Arc::clone(&self.clock),
            self.expire_after,
            self.queue_capacity,
            self.default_last_n,
            Arc::clone(&self.queue_stats),
        )
    }
}

#[cfg(test)]
#[path = "conference_tests.rs"]
mod tests;
