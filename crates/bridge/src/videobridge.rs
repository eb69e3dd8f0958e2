// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bridge orchestrator: request routing, lifecycle, and the debug
//! surface.
//!
//! Routing resolves (or creates) the target conference and hands the
//! request off to that conference's ingress queue; it never waits for the
//! reply to be produced. Errors are converted to dialect-specific error
//! replies at this boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use sfb_core::{Clock, ConferenceId, EndpointId, IdGen, MeetingId, RequestErrorKind};
use sfb_signaling::{
    error_reply, ConferenceModifyRequest, ConferenceRequest, Dialect, ErrorCondition, ErrorReply,
    ProviderRegistry, Reply, Request, VersionReply,
};

use crate::conference::{Conference, ConferenceFactory, ConferenceWork};
use crate::config::BridgeConfig;
use crate::emitter::{ConferenceObserver, EventEmitter};
use crate::load::{
    LastNReducer, LoadManager, LoadReducer, LoadSampler, LoadState, PacketRateProvider,
    ZeroPacketRateProvider,
};
use crate::registry::{ConferenceCount, ConferenceRegistry, CreateConferenceParams};
use crate::shutdown::{ProcessShutdownService, ShutdownManager, ShutdownService};
use crate::stats::{BridgeStatistics, QueueStatsRegistry, COLIBRI_QUEUE};

/// Application name reported by the version query.
pub const APP_NAME: &str = "sfb";

/// Deeper health probing is delegated here; the bridge itself only maps
/// the outcome onto the wire.
pub trait HealthProbe: Send + Sync {
    fn check(&self) -> Result<(), String>;
}

/// Probe for deployments without a dedicated health checker.
pub struct AlwaysHealthy;

impl HealthProbe for AlwaysHealthy {
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A delivered request with its reply path.
pub struct IncomingRequest {
    pub request: Request,
    pub reply_tx: oneshot::Sender<Reply>,
}

/// Collaborator seams for the bridge.
pub struct VideobridgeDeps {
    pub clock: Arc<dyn Clock>,
    pub id_gen: Arc<dyn IdGen>,
    pub factory: Arc<dyn ConferenceFactory>,
    pub shutdown_service: Arc<dyn ShutdownService>,
    pub packet_rate: Arc<dyn PacketRateProvider>,
    pub reducer: Arc<dyn LoadReducer>,
    pub health: Arc<dyn HealthProbe>,
    pub queue_stats: Arc<QueueStatsRegistry>,
}

/// The conference registry and lifecycle manager.
pub struct Videobridge {
    config: BridgeConfig,
    clock: Arc<dyn Clock>,
    registry: Arc<ConferenceRegistry>,
    emitter: EventEmitter,
    stats: Arc<BridgeStatistics>,
    queue_stats: Arc<QueueStatsRegistry>,
    shutdown_manager: Arc<ShutdownManager>,
    load_manager: Arc<LoadManager>,
    packet_rate: Arc<dyn PacketRateProvider>,
    health: Arc<dyn HealthProbe>,
    drain: AtomicBool,
    providers: OnceLock<ProviderRegistry>,
    sampler: Mutex<Option<LoadSampler>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

enum Resolution {
    Dispatch(Arc<dyn Conference>, Request),
    Immediate(Reply),
}

impl Videobridge {
    pub fn new(config: BridgeConfig, deps: VideobridgeDeps) -> Arc<Self> {
        let stats = BridgeStatistics::new();
        let registry = Arc::new(ConferenceRegistry::new(deps.id_gen, deps.factory));
        let shutdown_manager = ShutdownManager::new(
            config.shutdown.clone(),
            Arc::clone(&deps.clock),
            deps.shutdown_service,
            Arc::clone(&registry) as Arc<dyn ConferenceCount>,
        );
        let load_manager = LoadManager::new(
            config.load.clone(),
            deps.reducer,
            Arc::clone(&registry),
            Arc::clone(&stats),
        );
        Arc::new(Self {
            config,
            clock: deps.clock,
            registry,
            emitter: EventEmitter::new(),
            stats,
            queue_stats: deps.queue_stats,
            shutdown_manager,
            load_manager,
            packet_rate: deps.packet_rate,
            health: deps.health,
            drain: AtomicBool::new(false),
            providers: OnceLock::new(),
            sampler: Mutex::new(None),
            sweeper: Mutex::new(None),
        })
    }

    /// Bridge with production collaborators.
    pub fn production(config: BridgeConfig) -> Arc<Self> {
        let clock: Arc<dyn Clock> = Arc::new(sfb_core::SystemClock);
        let queue_stats = Arc::new(QueueStatsRegistry::new());
        let factory = Arc::new(crate::conference::BridgeConferenceFactory::new(
            Arc::clone(&clock),
            config.conference_expire_after,
            config.conference_queue_capacity,
            config.default_last_n,
            queue_stats.register(COLIBRI_QUEUE),
        ));
        let id_gen = Arc::new(sfb_core::TimeRandIdGen::new(Arc::clone(&clock)));
        Self::new(
            config,
            VideobridgeDeps {
                clock,
                id_gen,
                factory,
                shutdown_service: Arc::new(ProcessShutdownService),
                packet_rate: Arc::new(ZeroPacketRateProvider),
                reducer: Arc::new(LastNReducer::default()),
                health: Arc::new(AlwaysHealthy),
                queue_stats,
            },
        )
    }

    /// Install protocol providers and start the background tasks.
    pub fn start(self: &Arc<Self>) {
        let _ = self.providers.set(ProviderRegistry::with_defaults());

        let sampler = LoadSampler::start(
            self.config.load_sample_interval,
            Arc::clone(&self.packet_rate),
            Arc::clone(&self.load_manager),
        );
        *self.sampler.lock() = Some(sampler);

        let sweeper = spawn_expire_sweeper(Arc::downgrade(self), self.config.expire_check_interval);
        *self.sweeper.lock() = Some(sweeper);

        info!("bridge started");
    }

    /// Stop the sweeper and cancel the load sampler task.
    pub fn stop(&self) {
        if let Some(sampler) = self.sampler.lock().take() {
            sampler.stop();
        }
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.abort();
        }
        info!("bridge stopped");
    }

    /// The installed protocol provider registry, if `start()` has run.
    pub fn providers(&self) -> Option<&ProviderRegistry> {
        self.providers.get()
    }

    // --- conference lifecycle ---------------------------------------------

    /// Create, index, and announce a conference.
    pub fn create_conference(
        &self,
        params: CreateConferenceParams,
    ) -> Result<Arc<dyn Conference>, RequestErrorKind> {
        let conference = self.registry.create(params)?;
        self.announce_created(&conference);
        Ok(conference)
    }

    /// Expire a conference: removal, `expire()`, event, shutdown notify.
    ///
    /// Idempotent; a conference that is no longer indexed is left alone.
    pub fn expire_conference(&self, conference: &Arc<dyn Conference>) {
        if !self.registry.remove(conference) {
            return;
        }
        conference.expire();

        self.stats
            .total_conferences_completed
            .fetch_add(1, Ordering::Relaxed);
        let lifetime = self.clock.now() - conference.created_at();
        self.stats
            .total_conference_seconds
            .fetch_add(lifetime.as_secs(), Ordering::Relaxed);

        info!(conference_id = %conference.id(), "conference expired");
        self.emitter.emit_expired(conference);
        self.shutdown_manager.notify_conference_expired();
    }

    pub fn get_conference(&self, id: &ConferenceId) -> Option<Arc<dyn Conference>> {
        self.registry.get_by_id(id)
    }

    pub fn get_conference_by_meeting_id(
        &self,
        meeting_id: &MeetingId,
    ) -> Option<Arc<dyn Conference>> {
        self.registry.get_by_meeting_id(meeting_id)
    }

    pub fn list_conferences(&self) -> Vec<Arc<dyn Conference>> {
        self.registry.list()
    }

    pub fn conference_count(&self) -> usize {
        self.registry.count()
    }

    // --- request routing --------------------------------------------------

    /// Route a delivered request; the reply arrives on the request's
    /// reply channel. Never blocks on reply production.
    pub fn handle_request(&self, incoming: IncomingRequest) {
        match self.resolve(incoming.request) {
            Resolution::Dispatch(conference, request) => conference.enqueue(ConferenceWork {
                request,
                reply_tx: incoming.reply_tx,
            }),
            Resolution::Immediate(reply) => {
                let _ = incoming.reply_tx.send(reply);
            }
        }
    }

    /// Inline routing variant for tests: processes the request on the
    /// caller's thread and returns the reply.
    pub fn handle_sync(&self, request: Request) -> Reply {
        match self.resolve(request) {
            Resolution::Dispatch(conference, request) => conference.handle_sync(request),
            Resolution::Immediate(reply) => reply,
        }
    }

    fn resolve(&self, request: Request) -> Resolution {
        match request {
            Request::Conference(req) => match self.route_v1(&req) {
                Ok(conference) => Resolution::Dispatch(conference, Request::Conference(req)),
                Err(kind) => {
                    debug!(error = %kind, "v1 request refused");
                    Resolution::Immediate(Reply::Error(error_reply(Dialect::V1, &kind)))
                }
            },
            Request::ConferenceModify(req) => match self.route_v2(&req) {
                Ok(conference) => Resolution::Dispatch(conference, Request::ConferenceModify(req)),
                Err(kind) => {
                    debug!(error = %kind, "v2 request refused");
                    Resolution::Immediate(Reply::Error(error_reply(Dialect::V2, &kind)))
                }
            },
            Request::HealthCheck => Resolution::Immediate(self.handle_health_check()),
            Request::Version => Resolution::Immediate(Reply::Version(version_reply())),
        }
    }

    fn route_v1(&self, req: &ConferenceRequest) -> Result<Arc<dyn Conference>, RequestErrorKind> {
        match &req.id {
            None => {
                if self.shutdown_manager.is_graceful() {
                    return Err(RequestErrorKind::GracefulShutdown);
                }
                self.create_conference(CreateConferenceParams {
                    name: req.name.clone(),
                    gid: req.gid,
                    meeting_id: req.meeting_id.clone(),
                    rtcstats_enabled: req.rtcstats_enabled.unwrap_or(false),
                    callstats_enabled: req.callstats_enabled.unwrap_or(false),
                    strict_meeting_id: false,
                })
            }
            Some(id) => self
                .registry
                .get_by_id(id)
                .ok_or_else(|| RequestErrorKind::not_found_id(id.clone())),
        }
    }

    fn route_v2(
        &self,
        req: &ConferenceModifyRequest,
    ) -> Result<Arc<dyn Conference>, RequestErrorKind> {
        let resolution = self
            .registry
            .resolve_modify(req, || self.shutdown_manager.is_graceful())?;
        if resolution.created {
            self.announce_created(&resolution.conference);
        }
        Ok(resolution.conference)
    }

    fn announce_created(&self, conference: &Arc<dyn Conference>) {
        self.stats
            .total_conferences_created
            .fetch_add(1, Ordering::Relaxed);
        info!(
            conference_id = %conference.id(),
            meeting_id = ?conference.meeting_id(),
            "conference created"
        );
        self.emitter.emit_created(conference);
    }

    fn handle_health_check(&self) -> Reply {
        match self.health.check() {
            Ok(()) => Reply::Result,
            Err(message) => Reply::Error(
                ErrorReply::new(ErrorCondition::InternalServerError).with_message(message),
            ),
        }
    }

    // --- process control --------------------------------------------------

    /// Trigger graceful or forced shutdown.
    pub fn shutdown(&self, graceful: bool) {
        if graceful {
            self.shutdown_manager.request_graceful();
        } else {
            self.shutdown_manager.request_force();
        }
    }

    pub fn shutdown_in_progress(&self) -> bool {
        self.shutdown_manager.shutdown_in_progress()
    }

    pub fn set_drain_mode(&self, enabled: bool) {
        info!(enabled, "drain mode changed");
        self.drain.store(enabled, Ordering::SeqCst);
    }

    pub fn drain_mode(&self) -> bool {
        self.drain.load(Ordering::SeqCst)
    }

    // --- observers and stats ----------------------------------------------

    pub fn add_observer(&self, observer: Arc<dyn ConferenceObserver>) {
        self.emitter.add_observer(observer);
    }

    pub fn remove_observer(&self, observer: &Arc<dyn ConferenceObserver>) {
        self.emitter.remove_observer(observer);
    }

    pub fn statistics(&self) -> &Arc<BridgeStatistics> {
        &self.stats
    }

    pub fn queue_statistics(&self) -> &Arc<QueueStatsRegistry> {
        &self.queue_stats
    }

    pub fn load_manager(&self) -> &Arc<LoadManager> {
        &self.load_manager
    }

    // --- debug surface ----------------------------------------------------

    /// Read-consistent JSON projection of bridge state.
    ///
    /// Looking up a specific conference here does not count as activity
    /// and never defers its expiration.
    pub fn debug_state(
        &self,
        full: bool,
        conference_id: Option<&ConferenceId>,
        endpoint_id: Option<&EndpointId>,
    ) -> IndexMap<String, Value> {
        let mut map = IndexMap::new();
        map.insert(
            "shutdownInProgress".to_string(),
            Value::from(self.shutdown_in_progress()),
        );
        map.insert("drain".to_string(), Value::from(self.drain_mode()));
        map.insert("time".to_string(), Value::from(self.clock.epoch_millis()));
        map.insert(
            "load-management".to_string(),
            Value::Object(self.load_management_state().into_iter().collect()),
        );
        map.insert(
            "jitter".to_string(),
            serde_json::Number::from_f64(self.stats.jitter_aggregate())
                .map(Value::Number)
                .unwrap_or(Value::Null),
        );

        let mut conferences = IndexMap::new();
        match conference_id {
            None => {
                for conference in self.registry.list() {
                    conferences.insert(
                        conference.id().to_string(),
                        Value::Object(
                            conference.debug_snapshot(false, None).into_iter().collect(),
                        ),
                    );
                }
            }
            Some(id) => match self.registry.get_by_id(id) {
                None => {
                    conferences.insert(id.to_string(), Value::from("null"));
                }
                Some(conference) => {
                    conferences.insert(
                        id.to_string(),
                        Value::Object(
                            conference
                                .debug_snapshot(full, endpoint_id)
                                .into_iter()
                                .collect(),
                        ),
                    );
                }
            },
        }
        map.insert(
            "conferences".to_string(),
            Value::Object(conferences.into_iter().collect()),
        );
        map
    }

    fn load_management_state(&self) -> IndexMap<String, Value> {
        let mut map = IndexMap::new();
        map.insert(
            "state".to_string(),
            Value::from(match self.load_manager.state() {
                LoadState::Normal => "normal",
                LoadState::Overloaded => "overloaded",
            }),
        );
        map.insert(
            "stress_level".to_string(),
            serde_json::Number::from_f64(self.load_manager.stress_level())
                .map(Value::Number)
                .unwrap_or(Value::Null),
        );
        if let Some(measurement) = self.load_manager.last_measurement() {
            map.insert(
                "packet_rate".to_string(),
                serde_json::Number::from_f64(measurement.packets_per_second)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            );
        }
        map.insert(
            "loaded_threshold".to_string(),
            serde_json::Number::from_f64(self.load_manager.config().loaded_threshold)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        );
        map.insert(
            "recovery_threshold".to_string(),
            serde_json::Number::from_f64(self.load_manager.config().recovery_threshold)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        );
        map
    }
}

/// Version query payload: application name, version, and host OS.
pub fn version_reply() -> VersionReply {
    VersionReply {
        name: APP_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        os: std::env::consts::OS.to_string(),
    }
}

fn spawn_expire_sweeper(
    bridge: Weak<Videobridge>,
    interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(bridge) = bridge.upgrade() else {
                return;
            };
            for conference in bridge.list_conferences() {
                if conference.should_expire() {
                    debug!(conference_id = %conference.id(), "sweeper retiring conference");
                    bridge.expire_conference(&conference);
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "videobridge_tests.rs"]
mod tests;
