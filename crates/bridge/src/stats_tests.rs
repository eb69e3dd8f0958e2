// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn counters_accumulate() {
    let stats = BridgeStatistics::new();
    stats.total_conferences_created.fetch_add(3, Ordering::Relaxed);
    stats.total_conferences_completed.fetch_add(2, Ordering::Relaxed);
    stats.total_conference_seconds.fetch_add(120, Ordering::Relaxed);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot["total_conferences_created"], 3);
    assert_eq!(snapshot["total_conferences_completed"], 2);
    assert_eq!(snapshot["total_conference_seconds"], 120);
}

#[test]
fn gauges_round_trip_f64() {
    let stats = BridgeStatistics::new();
    stats.set_stress_level(0.37);
    stats.set_jitter_aggregate(12.5);
    assert_eq!(stats.stress_level(), 0.37);
    assert_eq!(stats.jitter_aggregate(), 12.5);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot["stress_level"], 0.37);
    assert_eq!(snapshot["jitter_aggregate"], 12.5);
}

#[yare::parameterized(
    lowest  = { 0,   0 },
    low     = { 15,  0 },
    mid     = { 64,  4 },
    highest = { 127, 7 },
)]
fn energy_scores_land_in_their_bucket(score: u8, bucket: usize) {
    let stats = BridgeStatistics::new();
    stats.record_discarded_energy(score);
    let buckets = stats.energy_buckets();
    assert_eq!(buckets[bucket], 1);
    assert_eq!(buckets.iter().sum::<u64>(), 1);
}

#[test]
fn snapshot_lists_every_counter() {
    let stats = BridgeStatistics::new();
    let snapshot = stats.snapshot();
    for key in [
        "total_failed_conferences",
        "total_partially_failed_conferences",
        "total_bytes_received",
        "total_bytes_sent",
        "total_relay_packets_sent",
        "total_endpoints",
        "total_relays",
        "total_ice_succeeded_tcp",
        "total_ice_succeeded_relayed",
        "total_ice_failed",
        "total_dominant_speaker_changes",
        "total_keyframes_received",
        "preemptive_keyframe_requests_sent",
        "preemptive_keyframe_requests_suppressed",
        "total_loss_controlled_participant_ms",
        "total_data_channel_messages_received",
        "total_web_socket_messages_sent",
        "discarded_energy_buckets",
    ] {
        assert!(snapshot.contains_key(key), "missing {key}");
    }
}

#[test]
fn queue_registry_pre_registers_well_known_queues() {
    let registry = QueueStatsRegistry::new();
    for name in [
        SRTP_SEND_QUEUE,
        OCTO_SEND_QUEUE,
        COLIBRI_QUEUE,
        INCOMING_MESSAGE_QUEUE,
        RTP_RECEIVER_QUEUE,
        RTP_SENDER_QUEUE,
    ] {
        assert!(registry.get(name).is_some(), "missing {name}");
    }
}

#[test]
fn queue_registry_returns_shared_handles() {
    let registry = QueueStatsRegistry::new();
    let a = registry.register(COLIBRI_QUEUE);
    let b = registry.register(COLIBRI_QUEUE);
    a.dropped_packets.fetch_add(1, Ordering::Relaxed);
    assert_eq!(b.dropped_packets.load(Ordering::Relaxed), 1);
}

#[test]
fn queue_snapshot_exposes_dropped_and_exceptions() {
    let registry = QueueStatsRegistry::new();
    let stats = registry.register("custom_queue");
    stats.dropped_packets.fetch_add(5, Ordering::Relaxed);
    stats.exceptions.fetch_add(1, Ordering::Relaxed);

    let snapshot = registry.snapshot();
    assert_eq!(snapshot["custom_queue"]["dropped_packets"], 5);
    assert_eq!(snapshot["custom_queue"]["exceptions"], 1);
}
