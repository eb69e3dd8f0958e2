// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::conference::{ConferenceFactory, ConferenceParams};
use crate::registry::{ConferenceRegistry, CreateConferenceParams};
use crate::stats::BridgeStatistics;
use crate::test_support::{FakeConferenceFactory, RecordingReducer, StubPacketRateProvider};
use sfb_core::{ConferenceId, SequentialIdGen};

fn sample(pps: f64) -> PacketRateMeasurement {
    PacketRateMeasurement {
        packets_per_second: pps,
    }
}

fn manager_with(
    reducer: Arc<dyn LoadReducer>,
) -> (Arc<LoadManager>, Arc<ConferenceRegistry>, Arc<BridgeStatistics>) {
    let registry = Arc::new(ConferenceRegistry::new(
        Arc::new(SequentialIdGen::new("c")),
        FakeConferenceFactory::new() as Arc<dyn ConferenceFactory>,
    ));
    let stats = BridgeStatistics::new();
    let manager = LoadManager::new(
        LoadManagerConfig {
            loaded_threshold: 100.0,
            recovery_threshold: 50.0,
        },
        reducer,
        Arc::clone(&registry),
        Arc::clone(&stats),
    );
    (manager, registry, stats)
}

#[test]
fn hysteresis_between_thresholds_holds_state() {
    let reducer = RecordingReducer::new();
    let (manager, registry, _) = manager_with(Arc::clone(&reducer) as Arc<dyn LoadReducer>);
    registry.create(CreateConferenceParams::default()).unwrap();

    assert_eq!(manager.state(), LoadState::Normal);

    // Crossing the loaded threshold trips the reducer once.
    manager.receive(sample(120.0));
    assert_eq!(manager.state(), LoadState::Overloaded);
    assert_eq!(*reducer.calls.lock(), vec![1]);

    // Between recovery and loaded: stays overloaded, no second reduction.
    manager.receive(sample(80.0));
    assert_eq!(manager.state(), LoadState::Overloaded);
    assert_eq!(reducer.calls.lock().len(), 1);

    // Below recovery: back to normal.
    manager.receive(sample(40.0));
    assert_eq!(manager.state(), LoadState::Normal);

    // Overload again: reducer runs a second time.
    manager.receive(sample(150.0));
    assert_eq!(reducer.calls.lock().len(), 2);
}

#[test]
fn normal_band_never_invokes_reducer() {
    let reducer = RecordingReducer::new();
    let (manager, _, _) = manager_with(Arc::clone(&reducer) as Arc<dyn LoadReducer>);

    manager.receive(sample(10.0));
    manager.receive(sample(99.0));
    assert_eq!(manager.state(), LoadState::Normal);
    assert!(reducer.calls.lock().is_empty());
}

#[test]
fn stress_is_smoothed_and_published() {
    let reducer = RecordingReducer::new();
    let (manager, _, stats) = manager_with(reducer as Arc<dyn LoadReducer>);

    manager.receive(sample(120.0));
    // One step of exponential smoothing from 0 toward 1.2.
    let expected = 0.25 * 1.2;
    assert!((manager.stress_level() - expected).abs() < 1e-9);
    assert!((stats.stress_level() - expected).abs() < 1e-9);

    let last = manager.last_measurement().unwrap();
    assert_eq!(last.packets_per_second, 120.0);
}

#[test]
fn last_n_reducer_scales_down_with_floor_of_one() {
    let reducer = LastNReducer::new(0.5);
    let factory = FakeConferenceFactory::new();
    let big = factory.create(ConferenceParams {
        id: ConferenceId::new("big"),
        name: None,
        gid: -1,
        meeting_id: None,
        rtcstats_enabled: false,
        callstats_enabled: false,
    });
    big.set_last_n(25);
    let small = factory.create(ConferenceParams {
        id: ConferenceId::new("small"),
        name: None,
        gid: -1,
        meeting_id: None,
        rtcstats_enabled: false,
        callstats_enabled: false,
    });
    small.set_last_n(1);

    reducer.reduce(&[Arc::clone(&big), Arc::clone(&small)]);
    assert_eq!(big.last_n(), 12);
    // Already at the floor; left alone.
    assert_eq!(small.last_n(), 1);
}

#[tokio::test]
async fn sampler_feeds_manager_periodically() {
    let reducer = RecordingReducer::new();
    let (manager, _, _) = manager_with(reducer as Arc<dyn LoadReducer>);
    let provider = StubPacketRateProvider::new(150.0);

    let sampler = LoadSampler::start(
        Duration::from_millis(10),
        Arc::clone(&provider) as Arc<dyn PacketRateProvider>,
        Arc::clone(&manager),
    );

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(manager.state(), LoadState::Overloaded);
    assert!(manager.last_measurement().is_some());

    sampler.stop();
    let measurement_at_stop = manager.last_measurement();
    tokio::time::sleep(Duration::from_millis(40)).await;
    // Cancelled: no further samples arrive.
    assert_eq!(manager.last_measurement(), measurement_at_stop);
}
