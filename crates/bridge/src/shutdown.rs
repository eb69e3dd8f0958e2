// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shutdown coordinator.
//!
//! Drives the `Running -> GracefulRequested -> ForcingExit` state machine.
//! Graceful shutdown waits for the last conference to expire, then holds
//! the bridge up until the minimum announcement window has passed so
//! upstream observers see the shutdown advertisement at least once and do
//! not misclassify the exit as a crash.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

use sfb_core::Clock;

use crate::registry::ConferenceCount;

/// External shutdown sink.
///
/// `begin_shutdown` is invoked at most once, when graceful shutdown has
/// quiesced. `force_exit` terminates the process.
pub trait ShutdownService: Send + Sync {
    fn begin_shutdown(&self);
    fn force_exit(&self);
}

/// Production service: logs, then exits the process on force.
pub struct ProcessShutdownService;

impl ShutdownService for ProcessShutdownService {
    fn begin_shutdown(&self) {
        info!("graceful shutdown complete, exiting");
        std::process::exit(0);
    }

    fn force_exit(&self) {
        warn!("force shutdown, exiting");
        std::process::exit(0);
    }
}

/// Shutdown timing knobs.
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Minimum time the graceful-shutdown advertisement stays visible
    /// before the bridge goes away.
    pub min_announcement_window: Duration,
    /// Grace delay before a forced exit, so in-flight logging flushes.
    pub force_exit_delay: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            min_announcement_window: Duration::from_secs(15),
            force_exit_delay: Duration::from_secs(1),
        }
    }
}

/// Logical shutdown state, for snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStateKind {
    Running,
    GracefulRequested,
    ForcingExit,
}

enum State {
    Running,
    GracefulRequested { since: Instant },
    ForcingExit,
}

/// The shutdown state machine.
pub struct ShutdownManager {
    state: Mutex<State>,
    begun: AtomicBool,
    exit_requested: AtomicBool,
    config: ShutdownConfig,
    clock: Arc<dyn Clock>,
    service: Arc<dyn ShutdownService>,
    conferences: Arc<dyn ConferenceCount>,
}

impl ShutdownManager {
    pub fn new(
        config: ShutdownConfig,
        clock: Arc<dyn Clock>,
        service: Arc<dyn ShutdownService>,
        conferences: Arc<dyn ConferenceCount>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::Running),
            begun: AtomicBool::new(false),
            exit_requested: AtomicBool::new(false),
            config,
            clock,
            service,
            conferences,
        })
    }

    /// Enter graceful shutdown and schedule the first quiescence check.
    ///
    /// Idempotent: a repeated request keeps the original `since` instant.
    pub fn request_graceful(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            match *state {
                State::Running => {
                    *state = State::GracefulRequested {
                        since: self.clock.now(),
                    };
                }
                State::GracefulRequested { .. } | State::ForcingExit => return,
            }
        }
        info!("graceful shutdown requested");
        self.run_quiescence_check();
    }

    /// Force shutdown: terminal, exits the process after a short delay.
    ///
    /// The delay timer is armed on every call; the exit itself happens
    /// once.
    pub fn request_force(self: &Arc<Self>) {
        {
            let mut state = self.state.lock();
            *state = State::ForcingExit;
        }
        warn!(delay = ?self.config.force_exit_delay, "force shutdown requested");
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(this.config.force_exit_delay).await;
            if !this.exit_requested.swap(true, Ordering::SeqCst) {
                this.service.force_exit();
            }
        });
    }

    /// Called by the lifecycle manager after each conference expires, so
    /// the happy path does not wait for a scheduled tick.
    pub fn notify_conference_expired(self: &Arc<Self>) {
        self.run_quiescence_check();
    }

    /// Whether new-conference creation must be refused.
    pub fn is_graceful(&self) -> bool {
        matches!(*self.state.lock(), State::GracefulRequested { .. })
    }

    /// Whether any shutdown (graceful or forced) is in progress.
    pub fn shutdown_in_progress(&self) -> bool {
        !matches!(*self.state.lock(), State::Running)
    }

    pub fn state_kind(&self) -> ShutdownStateKind {
        match *self.state.lock() {
            State::Running => ShutdownStateKind::Running,
            State::GracefulRequested { .. } => ShutdownStateKind::GracefulRequested,
            State::ForcingExit => ShutdownStateKind::ForcingExit,
        }
    }

    /// How long graceful shutdown has been in progress.
    pub fn graceful_elapsed(&self) -> Option<Duration> {
        match *self.state.lock() {
            State::GracefulRequested { since } => Some(self.clock.now() - since),
            _ => None,
        }
    }

    fn run_quiescence_check(self: &Arc<Self>) {
        // Read the state and drop the guard before counting conferences;
        // the count provider takes the registry mutex.
        let since = match *self.state.lock() {
            State::GracefulRequested { since } => since,
            _ => return,
        };
        if self.conferences.live_count() > 0 {
            // The next expire notification re-runs the check.
            return;
        }
        let elapsed = self.clock.now() - since;
        if elapsed >= self.config.min_announcement_window {
            self.begin_shutdown_once();
        } else {
            let delay = self.config.min_announcement_window - elapsed;
            info!(delay = ?delay, "bridge quiesced, waiting out announcement window");
            let this = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                this.run_quiescence_check();
            });
        }
    }

    fn begin_shutdown_once(&self) {
        if self.begun.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("beginning shutdown");
        self.service.begin_shutdown();
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
