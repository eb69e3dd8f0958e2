// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;

#[test]
fn encode_is_compact_lowercase_hex() {
    let id = encode_conference_id(0x1234, 0);
    assert_eq!(id, "1234");

    let id = encode_conference_id(0, 0xdead_beef);
    assert_eq!(id, "deadbeef");
}

#[test]
fn encode_wraps_instead_of_overflowing() {
    let id = encode_conference_id(u64::MAX, 2);
    assert_eq!(id, "1");
}

#[test]
fn time_rand_gen_varies_without_clock_movement() {
    let clock = FakeClock::new();
    let gen = TimeRandIdGen::new(Arc::new(clock));

    // Same millisecond; the random draw must still distinguish candidates.
    let a = gen.next();
    let b = gen.next();
    let c = gen.next();
    assert!(a != b || b != c, "draws should not all collide: {a} {b} {c}");
}

#[test]
fn sequential_gen_is_deterministic() {
    let gen = SequentialIdGen::new("c");
    assert_eq!(gen.next(), "c-1");
    assert_eq!(gen.next(), "c-2");

    let clone = gen.clone();
    assert_eq!(clone.next(), "c-3", "clones share the counter");
}

#[test]
fn conference_id_compares_with_str() {
    let id = ConferenceId::new("abc123");
    assert_eq!(id, "abc123");
    assert_eq!(id.as_str(), "abc123");
    assert_eq!(id.to_string(), "abc123");
}
