// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge configuration

use std::time::Duration;

use crate::load::LoadManagerConfig;
use crate::shutdown::ShutdownConfig;

/// Control-plane configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Period of the load sampler.
    pub load_sample_interval: Duration,
    /// Load-manager hysteresis thresholds.
    pub load: LoadManagerConfig,
    /// Shutdown timing.
    pub shutdown: ShutdownConfig,
    /// Period of the expiration sweeper.
    pub expire_check_interval: Duration,
    /// Idle time after which a conference is retired by the sweeper.
    pub conference_expire_after: Duration,
    /// Capacity of each conference's ingress queue.
    pub conference_queue_capacity: usize,
    /// Initial last-n for new conferences; -1 means unlimited.
    pub default_last_n: i32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            load_sample_interval: Duration::from_secs(10),
            load: LoadManagerConfig::default(),
            shutdown: ShutdownConfig::default(),
            expire_check_interval: Duration::from_secs(5),
            conference_expire_after: Duration::from_secs(90),
            conference_queue_capacity: 1024,
            default_last_n: 25,
        }
    }
}

impl BridgeConfig {
    /// Load configuration with `SFB_*` environment overrides.
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_u64("SFB_LOAD_SAMPLE_INTERVAL_SECS") {
            config.load_sample_interval = Duration::from_secs(secs);
        }
        if let Some(pps) = env_f64("SFB_LOADED_THRESHOLD") {
            config.load.loaded_threshold = pps;
        }
        if let Some(pps) = env_f64("SFB_RECOVERY_THRESHOLD") {
            config.load.recovery_threshold = pps;
        }
        if let Some(secs) = env_u64("SFB_GRACEFUL_MIN_WINDOW_SECS") {
            config.shutdown.min_announcement_window = Duration::from_secs(secs);
        }
        if let Some(ms) = env_u64("SFB_FORCE_EXIT_DELAY_MS") {
            config.shutdown.force_exit_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("SFB_CONFERENCE_EXPIRE_AFTER_SECS") {
            config.conference_expire_after = Duration::from_secs(secs);
        }
        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
