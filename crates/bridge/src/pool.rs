// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide packet buffer pool hooks.
//!
//! The entry point installs a pool adapter once, before `start()`, so
//! downstream RTP machinery can acquire and return buffers without
//! knowing the allocator. Without an installed pool the hooks fall back
//! to plain allocation.

use std::sync::Arc;
use std::sync::OnceLock;

use tracing::warn;

/// Buffer allocator capability.
pub trait BufferPool: Send + Sync {
    fn acquire(&self, len: usize) -> Vec<u8>;
    fn release(&self, buf: Vec<u8>);
}

/// Pool adapter backed by the global allocator.
pub struct HeapBufferPool;

impl BufferPool for HeapBufferPool {
    fn acquire(&self, len: usize) -> Vec<u8> {
        vec![0u8; len]
    }

    fn release(&self, _buf: Vec<u8>) {}
}

static POOL: OnceLock<Arc<dyn BufferPool>> = OnceLock::new();

/// Install the process-wide pool adapter. First call wins; later calls
/// are ignored with a warning.
pub fn install(pool: Arc<dyn BufferPool>) {
    if POOL.set(pool).is_err() {
        warn!("buffer pool already installed, ignoring");
    }
}

/// Acquire a buffer from the installed pool, or allocate.
pub fn acquire(len: usize) -> Vec<u8> {
    match POOL.get() {
        Some(pool) => pool.acquire(len),
        None => vec![0u8; len],
    }
}

/// Return a buffer to the installed pool, or drop it.
pub fn release(buf: Vec<u8>) {
    if let Some(pool) = POOL.get() {
        pool.release(buf);
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
