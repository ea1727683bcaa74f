//! Cell buffer allocation
//!
//! Every buffer the stripe path allocates (cell copies, encode matrices,
//! encode tables) goes through a [`CellAllocator`]. Allocation failure is a
//! normal, recoverable outcome surfaced as [`Error::OutOfMemory`].
//!
//! [`Allocation`] is the scoped owner of one such buffer: dropping it hands
//! the buffer back to its allocator, so every exit path releases what it
//! acquired without explicit rollback code.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::{Error, Result};

// =============================================================================
// Allocator Port
// =============================================================================

/// Source of zero-initialized byte buffers.
pub trait CellAllocator: Send + Sync + fmt::Debug {
    /// Allocate a zeroed buffer of exactly `size` bytes.
    ///
    /// `what` names the purpose of the buffer for error reporting.
    fn allocate(&self, size: usize, what: &'static str) -> Result<Vec<u8>>;

    /// Return a buffer obtained from [`CellAllocator::allocate`].
    fn release(&self, buf: Vec<u8>) {
        drop(buf);
    }
}

/// Heap allocator that reports failure instead of aborting.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl CellAllocator for HeapAllocator {
    fn allocate(&self, size: usize, what: &'static str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|_| Error::OutOfMemory { size, what })?;
        buf.resize(size, 0);
        Ok(buf)
    }
}

// =============================================================================
// Counting Allocator
// =============================================================================

/// Allocator that counts allocations and can be armed to fail.
///
/// Wraps [`HeapAllocator`]. Used to check that every buffer acquired on a
/// stripe path is released again, and to inject allocation failures at a
/// precise point.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    inner: HeapAllocator,
    allocations: AtomicU64,
    releases: AtomicU64,
    failures: AtomicU64,
    /// Zero-based index of an upcoming allocation to fail
    fail_at: Mutex<Option<u64>>,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the allocation `n` allocations from now (0 = the next one).
    ///
    /// Only one failure is armed at a time; it disarms once it fires.
    pub fn fail_after(&self, n: u64) {
        let mut fail_at = self.fail_at.lock();
        let next = self.allocations.load(Ordering::SeqCst) + self.failures.load(Ordering::SeqCst);
        *fail_at = Some(next + n);
    }

    /// Disarm any pending failure.
    pub fn disarm(&self) {
        *self.fail_at.lock() = None;
    }

    /// Successful allocations so far.
    pub fn allocations(&self) -> u64 {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Buffers handed back so far.
    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::SeqCst)
    }

    /// Injected failures so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Buffers allocated and not yet released.
    pub fn live(&self) -> u64 {
        self.allocations() - self.releases()
    }
}

impl CellAllocator for CountingAllocator {
    fn allocate(&self, size: usize, what: &'static str) -> Result<Vec<u8>> {
        // Counted under the lock so attempt numbering stays exact
        let mut fail_at = self.fail_at.lock();
        let attempt =
            self.allocations.load(Ordering::SeqCst) + self.failures.load(Ordering::SeqCst);
        if *fail_at == Some(attempt) {
            *fail_at = None;
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(Error::OutOfMemory { size, what });
        }
        let buf = self.inner.allocate(size, what)?;
        self.allocations.fetch_add(1, Ordering::SeqCst);
        Ok(buf)
    }

    fn release(&self, buf: Vec<u8>) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.inner.release(buf);
    }
}

// =============================================================================
// Scoped Allocation
// =============================================================================

/// A buffer that is released to its allocator when dropped.
pub struct Allocation<'a> {
    buf: Option<Vec<u8>>,
    allocator: &'a dyn CellAllocator,
}

impl<'a> Allocation<'a> {
    /// Allocate `size` zeroed bytes from `allocator`.
    pub fn new(allocator: &'a dyn CellAllocator, size: usize, what: &'static str) -> Result<Self> {
        let buf = allocator.allocate(size, what)?;
        Ok(Self {
            buf: Some(buf),
            allocator,
        })
    }

    /// Detach the buffer so it outlives this scope.
    ///
    /// The allocator is not told; the caller now owns the memory.
    pub fn into_inner(mut self) -> Vec<u8> {
        self.buf.take().unwrap_or_default()
    }

    fn as_bytes(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or(&[])
    }
}

impl Deref for Allocation<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl DerefMut for Allocation<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or(&mut [])
    }
}

impl fmt::Debug for Allocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocation")
            .field("len", &self.as_bytes().len())
            .finish()
    }
}

impl Drop for Allocation<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.allocator.release(buf);
        }
    }
}
