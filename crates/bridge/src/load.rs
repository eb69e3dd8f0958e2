// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Load sampling and hysteresis-based load management.
//!
//! A periodic task measures the bridge-wide packet rate and feeds it to
//! the load manager, which transitions `Normal <-> Overloaded` across the
//! loaded/recovery thresholds and invokes the reducer on overload to shed
//! work by lowering last-n.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::conference::Conference;
use crate::registry::ConferenceRegistry;
use crate::stats::BridgeStatistics;

/// One sample of the bridge-wide packet rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketRateMeasurement {
    pub packets_per_second: f64,
}

/// Measures the current bridge-wide packet rate.
///
/// The real provider aggregates media-plane counters; the control plane
/// only consumes the number.
pub trait PacketRateProvider: Send + Sync {
    fn measure(&self) -> PacketRateMeasurement;
}

/// Provider for deployments without a media-plane feed.
pub struct ZeroPacketRateProvider;

impl PacketRateProvider for ZeroPacketRateProvider {
    fn measure(&self) -> PacketRateMeasurement {
        PacketRateMeasurement {
            packets_per_second: 0.0,
        }
    }
}

/// Invoked with the live conference set when the bridge becomes
/// overloaded.
pub trait LoadReducer: Send + Sync {
    fn reduce(&self, conferences: &[Arc<dyn Conference>]);
}

/// Default reducer: scales every conference's last-n down, shedding
/// forwarded video streams.
pub struct LastNReducer {
    reduction_factor: f64,
}

impl LastNReducer {
    pub fn new(reduction_factor: f64) -> Self {
        Self { reduction_factor }
    }
}

impl Default for LastNReducer {
    fn default() -> Self {
        Self::new(0.75)
    }
}

impl LoadReducer for LastNReducer {
    fn reduce(&self, conferences: &[Arc<dyn Conference>]) {
        for conference in conferences {
            let current = conference.last_n();
            if current <= 1 {
                continue;
            }
            let reduced = ((current as f64) * self.reduction_factor).floor() as i32;
            let reduced = reduced.max(1);
            conference.set_last_n(reduced);
            debug!(
                conference_id = %conference.id(),
                from = current,
                to = reduced,
                "reduced last-n under load"
            );
        }
    }
}

/// Hysteresis thresholds in packets per second.
#[derive(Debug, Clone)]
pub struct LoadManagerConfig {
    pub loaded_threshold: f64,
    pub recovery_threshold: f64,
}

impl Default for LoadManagerConfig {
    fn default() -> Self {
        Self {
            loaded_threshold: 50_000.0,
            recovery_threshold: 40_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Normal,
    Overloaded,
}

/// Smoothing factor for the published stress level.
const STRESS_SMOOTHING: f64 = 0.25;

/// Hysteresis machine fed by the sampler.
pub struct LoadManager {
    config: LoadManagerConfig,
    state: Mutex<LoadState>,
    last_measurement: Mutex<Option<PacketRateMeasurement>>,
    smoothed_stress: Mutex<f64>,
    reducer: Arc<dyn LoadReducer>,
    registry: Arc<ConferenceRegistry>,
    stats: Arc<BridgeStatistics>,
}

impl LoadManager {
    pub fn new(
        config: LoadManagerConfig,
        reducer: Arc<dyn LoadReducer>,
        registry: Arc<ConferenceRegistry>,
        stats: Arc<BridgeStatistics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            state: Mutex::new(LoadState::Normal),
            last_measurement: Mutex::new(None),
            smoothed_stress: Mutex::new(0.0),
            reducer,
            registry,
            stats,
        })
    }

    /// Feed one sample through the hysteresis machine and publish the
    /// smoothed stress level.
    pub fn receive(&self, measurement: PacketRateMeasurement) {
        let rate = measurement.packets_per_second;
        *self.last_measurement.lock() = Some(measurement);

        let stress = {
            let raw = rate / self.config.loaded_threshold;
            let mut smoothed = self.smoothed_stress.lock();
            *smoothed += STRESS_SMOOTHING * (raw - *smoothed);
            *smoothed
        };
        self.stats.set_stress_level(stress);

        let entered_overload = {
            let mut state = self.state.lock();
            match *state {
                LoadState::Normal if rate > self.config.loaded_threshold => {
                    *state = LoadState::Overloaded;
                    true
                }
                LoadState::Overloaded if rate < self.config.recovery_threshold => {
                    *state = LoadState::Normal;
                    info!(rate, "bridge load recovered");
                    false
                }
                _ => false,
            }
        };

        if entered_overload {
            warn!(rate, stress, "bridge overloaded, reducing last-n");
            let conferences = self.registry.list();
            self.reducer.reduce(&conferences);
        }
    }

    pub fn state(&self) -> LoadState {
        *self.state.lock()
    }

    pub fn stress_level(&self) -> f64 {
        *self.smoothed_stress.lock()
    }

    pub fn last_measurement(&self) -> Option<PacketRateMeasurement> {
        *self.last_measurement.lock()
    }

    pub fn config(&self) -> &LoadManagerConfig {
        &self.config
    }
}

/// Periodic sampling task feeding the load manager.
pub struct LoadSampler {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl LoadSampler {
    /// Start sampling at a fixed rate.
    pub fn start(
        interval: Duration,
        provider: Arc<dyn PacketRateProvider>,
        manager: Arc<LoadManager>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so samples are
            // spaced a full interval apart.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let measurement = provider.measure();
                manager.receive(measurement);
            }
        });
        Self {
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Cancel the sampling task.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for LoadSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
