// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{RecordingShutdownService, StubConferenceCount};
use sfb_core::SystemClock;
use std::sync::atomic::Ordering;

fn manager(
    window_ms: u64,
    count: usize,
) -> (
    Arc<ShutdownManager>,
    Arc<RecordingShutdownService>,
    Arc<StubConferenceCount>,
) {
    let service = RecordingShutdownService::new();
    let conferences = StubConferenceCount::new(count);
    let manager = ShutdownManager::new(
        ShutdownConfig {
            min_announcement_window: Duration::from_millis(window_ms),
            force_exit_delay: Duration::from_millis(20),
        },
        Arc::new(SystemClock),
        Arc::clone(&service) as Arc<dyn ShutdownService>,
        Arc::clone(&conferences) as Arc<dyn crate::registry::ConferenceCount>,
    );
    (manager, service, conferences)
}

#[tokio::test]
async fn graceful_with_no_conferences_waits_out_the_window() {
    let (manager, service, _) = manager(50, 0);
    manager.request_graceful();
    assert!(manager.is_graceful());

    // Still inside the announcement window.
    assert_eq!(service.begin_calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(service.begin_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn graceful_waits_for_live_conferences() {
    let (manager, service, conferences) = manager(10, 1);
    manager.request_graceful();

    tokio::time::sleep(Duration::from_millis(60)).await;
    // One conference is still live; nothing quiesces on its own.
    assert_eq!(service.begin_calls.load(Ordering::SeqCst), 0);

    conferences.0.store(0, Ordering::SeqCst);
    manager.notify_conference_expired();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(service.begin_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn begin_shutdown_is_invoked_at_most_once() {
    let (manager, service, _) = manager(0, 0);
    manager.request_graceful();
    manager.notify_conference_expired();
    manager.notify_conference_expired();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(service.begin_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn repeated_graceful_requests_keep_original_state() {
    let (manager, _, _) = manager(10_000, 1);
    manager.request_graceful();
    let elapsed_before = manager.graceful_elapsed();
    manager.request_graceful();
    assert_eq!(manager.state_kind(), ShutdownStateKind::GracefulRequested);
    assert!(manager.graceful_elapsed() >= elapsed_before);
}

#[tokio::test]
async fn force_exit_fires_once_even_if_requested_twice() {
    let (manager, service, _) = manager(10_000, 1);
    manager.request_force();
    manager.request_force();
    assert_eq!(manager.state_kind(), ShutdownStateKind::ForcingExit);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(service.force_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn force_is_terminal() {
    let (manager, service, _) = manager(0, 0);
    manager.request_force();
    manager.request_graceful();
    assert_eq!(manager.state_kind(), ShutdownStateKind::ForcingExit);
    assert!(!manager.is_graceful());
    assert!(manager.shutdown_in_progress());

    // The quiescence path must not run after a forced exit.
    manager.notify_conference_expired();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(service.begin_calls.load(Ordering::SeqCst), 0);
}
