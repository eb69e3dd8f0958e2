// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge-wide statistics: monotone counters, gauges, and the queue
//! statistics surface.
//!
//! The control plane owns only the aggregate counters; per-conference
//! numbers are maintained by the media plane and merged here when a
//! conference expires.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;

/// Number of discarded-audio energy buckets; scores span 0..=127.
pub const ENERGY_BUCKET_COUNT: usize = 8;

/// Well-known queue names for the queue-statistics surface.
pub const SRTP_SEND_QUEUE: &str = "srtp_send_queue";
pub const OCTO_SEND_QUEUE: &str = "octo_send_queue";
pub const COLIBRI_QUEUE: &str = "colibri_queue";
pub const INCOMING_MESSAGE_QUEUE: &str = "incoming_message_queue";
pub const RTP_RECEIVER_QUEUE: &str = "rtp_receiver_queue";
pub const RTP_SENDER_QUEUE: &str = "rtp_sender_queue";

/// Monotone counters and gauges for the whole bridge.
///
/// All fields are concurrently updated with relaxed atomics; readers see
/// a consistent-enough snapshot for reporting.
#[derive(Default)]
pub struct BridgeStatistics {
    // Conference lifecycle
    pub total_conferences_created: AtomicU64,
    pub total_conferences_completed: AtomicU64,
    pub total_failed_conferences: AtomicU64,
    pub total_partially_failed_conferences: AtomicU64,
    pub total_conference_seconds: AtomicU64,

    // Media traffic
    pub total_bytes_received: AtomicU64,
    pub total_bytes_sent: AtomicU64,
    pub total_packets_received: AtomicU64,
    pub total_packets_sent: AtomicU64,
    pub total_relay_bytes_received: AtomicU64,
    pub total_relay_bytes_sent: AtomicU64,
    pub total_relay_packets_received: AtomicU64,
    pub total_relay_packets_sent: AtomicU64,

    // Topology
    pub total_endpoints: AtomicU64,
    pub total_relays: AtomicU64,

    // ICE
    pub total_ice_succeeded: AtomicU64,
    pub total_ice_succeeded_tcp: AtomicU64,
    pub total_ice_succeeded_relayed: AtomicU64,
    pub total_ice_failed: AtomicU64,

    // Media-plane signals
    pub total_dominant_speaker_changes: AtomicU64,
    pub total_keyframes_received: AtomicU64,
    pub preemptive_keyframe_requests_sent: AtomicU64,
    pub preemptive_keyframe_requests_suppressed: AtomicU64,
    pub total_loss_controlled_participant_ms: AtomicU64,
    pub total_loss_limited_participant_ms: AtomicU64,
    pub total_loss_degraded_participant_ms: AtomicU64,

    // Messaging
    pub total_data_channel_messages_received: AtomicU64,
    pub total_data_channel_messages_sent: AtomicU64,
    pub total_web_socket_messages_received: AtomicU64,
    pub total_web_socket_messages_sent: AtomicU64,

    // Gauges (f64 bit patterns)
    stress_level_bits: AtomicU64,
    jitter_aggregate_bits: AtomicU64,

    // Discarded-audio energy scores
    energy_buckets: [AtomicU64; ENERGY_BUCKET_COUNT],
}

impl BridgeStatistics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_stress_level(&self, stress: f64) {
        self.stress_level_bits
            .store(stress.to_bits(), Ordering::Relaxed);
    }

    pub fn stress_level(&self) -> f64 {
        f64::from_bits(self.stress_level_bits.load(Ordering::Relaxed))
    }

    pub fn set_jitter_aggregate(&self, jitter_ms: f64) {
        self.jitter_aggregate_bits
            .store(jitter_ms.to_bits(), Ordering::Relaxed);
    }

    pub fn jitter_aggregate(&self) -> f64 {
        f64::from_bits(self.jitter_aggregate_bits.load(Ordering::Relaxed))
    }

    /// Record one discarded-audio energy score (0..=127).
    pub fn record_discarded_energy(&self, score: u8) {
        let bucket = (score as usize * ENERGY_BUCKET_COUNT / 128).min(ENERGY_BUCKET_COUNT - 1);
        self.energy_buckets[bucket].fetch_add(1, Ordering::Relaxed);
    }

    pub fn energy_buckets(&self) -> [u64; ENERGY_BUCKET_COUNT] {
        let mut out = [0u64; ENERGY_BUCKET_COUNT];
        for (slot, bucket) in out.iter_mut().zip(self.energy_buckets.iter()) {
            *slot = bucket.load(Ordering::Relaxed);
        }
        out
    }

    /// Ordered projection of every counter and gauge.
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        let mut map = IndexMap::new();
        let mut put = |key: &str, counter: &AtomicU64| {
            map.insert(key.to_string(), Value::from(counter.load(Ordering::Relaxed)));
        };

        put("total_conferences_created", &self.total_conferences_created);
        put(
            "total_conferences_completed",
            &self.total_conferences_completed,
        );
        put("total_failed_conferences", &self.total_failed_conferences);
        put(
            "total_partially_failed_conferences",
            &self.total_partially_failed_conferences,
        );
        put("total_conference_seconds", &self.total_conference_seconds);
        put("total_bytes_received", &self.total_bytes_received);
        put("total_bytes_sent", &self.total_bytes_sent);
        put("total_packets_received", &self.total_packets_received);
        put("total_packets_sent", &self.total_packets_sent);
        put(
            "total_relay_bytes_received",
            &self.total_relay_bytes_received,
        );
        put("total_relay_bytes_sent", &self.total_relay_bytes_sent);
        put(
            "total_relay_packets_received",
            &self.total_relay_packets_received,
        );
        put("total_relay_packets_sent", &self.total_relay_packets_sent);
        put("total_endpoints", &self.total_endpoints);
        put("total_relays", &self.total_relays);
        put("total_ice_succeeded", &self.total_ice_succeeded);
        put("total_ice_succeeded_tcp", &self.total_ice_succeeded_tcp);
        put(
            "total_ice_succeeded_relayed",
            &self.total_ice_succeeded_relayed,
        );
        put("total_ice_failed", &self.total_ice_failed);
        put(
            "total_dominant_speaker_changes",
            &self.total_dominant_speaker_changes,
        );
        put("total_keyframes_received", &self.total_keyframes_received);
        put(
            "preemptive_keyframe_requests_sent",
            &self.preemptive_keyframe_requests_sent,
        );
        put(
            "preemptive_keyframe_requests_suppressed",
            &self.preemptive_keyframe_requests_suppressed,
        );
        put(
            "total_loss_controlled_participant_ms",
            &self.total_loss_controlled_participant_ms,
        );
        put(
            "total_loss_limited_participant_ms",
            &self.total_loss_limited_participant_ms,
        );
        put(
            "total_loss_degraded_participant_ms",
            &self.total_loss_degraded_participant_ms,
        );
        put(
            "total_data_channel_messages_received",
            &self.total_data_channel_messages_received,
        );
        put(
            "total_data_channel_messages_sent",
            &self.total_data_channel_messages_sent,
        );
        put(
            "total_web_socket_messages_received",
            &self.total_web_socket_messages_received,
        );
        put(
            "total_web_socket_messages_sent",
            &self.total_web_socket_messages_sent,
        );

        map.insert("stress_level".to_string(), json_f64(self.stress_level()));
        map.insert("jitter_aggregate".to_string(), json_f64(self.jitter_aggregate()));
        map.insert(
            "discarded_energy_buckets".to_string(),
            Value::from(self.energy_buckets().to_vec()),
        );
        map
    }
}

fn json_f64(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Shallow stats attached to one named queue.
#[derive(Default)]
pub struct QueueStats {
    pub dropped_packets: AtomicU64,
    pub exceptions: AtomicU64,
}

impl QueueStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> IndexMap<String, Value> {
        let mut map = IndexMap::new();
        map.insert(
            "dropped_packets".to_string(),
            Value::from(self.dropped_packets.load(Ordering::Relaxed)),
        );
        map.insert(
            "exceptions".to_string(),
            Value::from(self.exceptions.load(Ordering::Relaxed)),
        );
        map
    }
}

/// Queue-statistics surface keyed by well-known queue names.
pub struct QueueStatsRegistry {
    queues: Mutex<IndexMap<String, Arc<QueueStats>>>,
}

impl QueueStatsRegistry {
    /// Registry with the well-known queues pre-registered.
    pub fn new() -> Self {
        let registry = Self {
            queues: Mutex::new(IndexMap::new()),
        };
        for name in [
            SRTP_SEND_QUEUE,
            OCTO_SEND_QUEUE,
            COLIBRI_QUEUE,
            INCOMING_MESSAGE_QUEUE,
            RTP_RECEIVER_QUEUE,
            RTP_SENDER_QUEUE,
        ] {
            registry.register(name);
        }
        registry
    }

    /// Get or create the stats handle for a queue name.
    pub fn register(&self, name: &str) -> Arc<QueueStats> {
        let mut queues = self.queues.lock();
        if let Some(stats) = queues.get(name) {
            return Arc::clone(stats);
        }
        let stats = QueueStats::new();
        queues.insert(name.to_string(), Arc::clone(&stats));
        stats
    }

    pub fn get(&self, name: &str) -> Option<Arc<QueueStats>> {
        self.queues.lock().get(name).cloned()
    }

    /// Per-queue shallow stats, keyed by queue name.
    pub fn snapshot(&self) -> IndexMap<String, Value> {
        let queues = self.queues.lock();
        queues
            .iter()
            .map(|(name, stats)| {
                (
                    name.clone(),
                    Value::Object(stats.snapshot().into_iter().collect()),
                )
            })
            .collect()
    }
}

impl Default for QueueStatsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
