// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingPool {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl BufferPool for CountingPool {
    fn acquire(&self, len: usize) -> Vec<u8> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        vec![0u8; len]
    }

    fn release(&self, _buf: Vec<u8>) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

// A single test keeps the process-wide install deterministic.
#[test]
fn install_is_first_wins_and_hooks_route_through_it() {
    // Before any install the hooks fall back to plain allocation.
    let buf = acquire(16);
    assert_eq!(buf.len(), 16);
    release(buf);

    let pool = Arc::new(CountingPool {
        acquired: AtomicUsize::new(0),
        released: AtomicUsize::new(0),
    });
    install(Arc::clone(&pool) as Arc<dyn BufferPool>);

    let buf = acquire(32);
    assert_eq!(buf.len(), 32);
    release(buf);
    assert_eq!(pool.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(pool.released.load(Ordering::SeqCst), 1);

    // A second install is ignored; the original pool keeps serving.
    install(Arc::new(HeapBufferPool));
    let buf = acquire(8);
    release(buf);
    assert_eq!(pool.acquired.load(Ordering::SeqCst), 2);
}
