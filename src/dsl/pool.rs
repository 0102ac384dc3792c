//! Reusable stack buffers for machines.
//!
//! A machine checks a buffer out when it is built and hands it back when it
//! is dropped, so spawning and removing bots does not churn the allocator.
//! The free list is the only state shared between machines on different
//! workers.

use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

/// Deepest a machine stack may grow. Pushes past this are dropped.
pub const MAX_STACK: usize = 256;

/// Initial capacity of a fresh buffer.
const DEFAULT_CAPACITY: usize = 16;

/// Upper bound on idle buffers kept around for reuse.
const MAX_IDLE: usize = 4096;

static GLOBAL_POOL: LazyLock<Arc<StackPool>> =
    LazyLock::new(|| Arc::new(StackPool::new(DEFAULT_CAPACITY)));

/// Concurrency-safe free list of `i16` buffers.
#[derive(Debug)]
pub struct StackPool {
    free: Mutex<Vec<Vec<i16>>>,
    capacity: usize,
}

impl StackPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Process-wide pool used by `Machine::new`.
    pub fn global() -> Arc<StackPool> {
        Arc::clone(&GLOBAL_POOL)
    }

    /// Check out an empty buffer, reusing an idle one when available.
    pub fn acquire(self: &Arc<Self>) -> PooledStack {
        let buf = self
            .free
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.capacity));
        PooledStack {
            buf,
            pool: Arc::clone(self),
        }
    }

    fn release(&self, mut buf: Vec<i16>) {
        buf.clear();
        let mut free = self.free.lock();
        if free.len() < MAX_IDLE {
            free.push(buf);
        }
    }

    /// Number of buffers waiting to be reused.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

/// A checked-out value stack. Returned to its pool on drop.
#[derive(Debug)]
pub struct PooledStack {
    buf: Vec<i16>,
    pool: Arc<StackPool>,
}

impl PooledStack {
    /// Push a value. Returns `false` (and drops the value) when full.
    pub fn push(&mut self, value: i16) -> bool {
        if self.buf.len() >= MAX_STACK {
            return false;
        }
        self.buf.push(value);
        true
    }

    pub fn pop(&mut self) -> Option<i16> {
        self.buf.pop()
    }

    /// Pop two values, returning them in push order `(a, b)`.
    /// Leaves the stack untouched if fewer than two are present.
    pub fn pop_pair(&mut self) -> Option<(i16, i16)> {
        if self.buf.len() < 2 {
            return None;
        }
        let b = self.buf.pop()?;
        let a = self.buf.pop()?;
        Some((a, b))
    }

    pub fn peek(&self) -> Option<i16> {
        self.buf.last().copied()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Empty the stack, keeping its allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.buf
    }
}

impl Drop for PooledStack {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.release(buf);
    }
}
