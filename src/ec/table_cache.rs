//! Encode-table cache
//!
//! Building the Cauchy generator matrix and expanding its parity rows into
//! lookup tables costs far more than encoding one small stripe, and every
//! stripe of a given `(dc, pc)` shape uses the same result. The cache builds
//! each shape once, on first use, and serves the immutable entry to every
//! later caller.
//!
//! # Concurrency
//!
//! Each shape has its own build-once slot. Concurrent first use of a shape
//! runs exactly one build while the other callers wait for it; after that
//! lookups are lock-free reads. A failed build leaves the slot empty so a
//! later call can retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::{debug, instrument};

use crate::alloc::{Allocation, CellAllocator, HeapAllocator};
use crate::config::CodeShape;
use crate::error::Result;
use crate::gf::GfCoder;

// =============================================================================
// Cache Entry
// =============================================================================

/// Generator matrix and expanded encode tables for one code shape.
///
/// Both buffers came from the cache's allocator and go back to it when the
/// last reference to the entry is dropped.
#[derive(Debug)]
pub struct EncodeTables {
    shape: CodeShape,
    /// `(dc+pc) × dc`, identity on top
    matrix: Vec<u8>,
    /// `32 · dc · pc` bytes for the parity rows
    tables: Vec<u8>,
    allocator: Arc<dyn CellAllocator>,
}

impl EncodeTables {
    #[inline]
    pub fn shape(&self) -> CodeShape {
        self.shape
    }

    /// The full `(dc+pc) × dc` generator matrix, row-major.
    #[inline]
    pub fn matrix(&self) -> &[u8] {
        &self.matrix
    }

    /// The bottom `pc` rows of the generator matrix.
    #[inline]
    pub fn parity_rows(&self) -> &[u8] {
        let dc = self.shape.data_cells;
        &self.matrix[dc * dc..]
    }

    /// Expanded tables consumed by [`GfCoder::encode`].
    #[inline]
    pub fn tables(&self) -> &[u8] {
        &self.tables
    }
}

impl PartialEq for EncodeTables {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.matrix == other.matrix && self.tables == other.tables
    }
}

impl Eq for EncodeTables {}

impl Drop for EncodeTables {
    fn drop(&mut self) {
        self.allocator.release(std::mem::take(&mut self.matrix));
        self.allocator.release(std::mem::take(&mut self.tables));
    }
}

type Slot = Arc<OnceCell<Arc<EncodeTables>>>;

// =============================================================================
// Encode Table Cache
// =============================================================================

/// Lazily built `(dc, pc)` → [`EncodeTables`] map.
///
/// Owned by whatever defines stripe shapes (an object class, a pool) and
/// shared by every encoder for those shapes.
#[derive(Debug)]
pub struct EncodeTableCache {
    coder: Arc<dyn GfCoder>,
    allocator: Arc<dyn CellAllocator>,
    entries: DashMap<CodeShape, Slot>,
    builds: AtomicU64,
}

impl EncodeTableCache {
    /// Create an empty cache that builds with `coder` and allocates from
    /// `allocator`.
    pub fn new(coder: Arc<dyn GfCoder>, allocator: Arc<dyn CellAllocator>) -> Self {
        Self {
            coder,
            allocator,
            entries: DashMap::new(),
            builds: AtomicU64::new(0),
        }
    }

    /// Create an empty cache using the heap allocator.
    pub fn with_coder(coder: Arc<dyn GfCoder>) -> Self {
        Self::new(coder, Arc::new(HeapAllocator))
    }

    /// The coder entries are built with.
    pub fn coder(&self) -> &Arc<dyn GfCoder> {
        &self.coder
    }

    /// Return the entry for `shape`, building it on first use.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the shape is not encodable over GF(2^8)
    /// - `OutOfMemory` if the matrix or tables cannot be allocated; the
    ///   shape stays unbuilt and the next call retries
    pub fn get_or_build(&self, shape: CodeShape) -> Result<Arc<EncodeTables>> {
        if let Some(entry) = self.get(shape) {
            return Ok(entry);
        }
        shape.validate()?;

        // Shard lock is released before the build runs
        let slot = self.entries.entry(shape).or_default().value().clone();
        slot.get_or_try_init(|| self.build(shape)).cloned()
    }

    /// Return the entry for `shape` if it has been built.
    pub fn get(&self, shape: CodeShape) -> Option<Arc<EncodeTables>> {
        self.entries
            .get(&shape)
            .and_then(|slot| slot.value().get().cloned())
    }

    /// Whether `shape` has a built entry.
    pub fn contains(&self, shape: CodeShape) -> bool {
        self.get(shape).is_some()
    }

    /// Number of built entries.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|slot| slot.value().get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total successful builds since creation.
    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::SeqCst)
    }

    /// Drop the entry for `shape`.
    ///
    /// Its buffers are released once no encoder holds the entry any more.
    pub fn evict(&self, shape: CodeShape) -> bool {
        let removed = self.entries.remove(&shape).is_some();
        if removed {
            debug!(%shape, "evicted encode tables");
        }
        removed
    }

    /// Drop every entry, releasing buffers no encoder still holds.
    pub fn clear(&self) {
        self.entries.clear();
    }

    #[instrument(skip(self), fields(coder = self.coder.name()))]
    fn build(&self, shape: CodeShape) -> Result<Arc<EncodeTables>> {
        let dc = shape.data_cells;
        let pc = shape.parity_cells;
        let allocator: &dyn CellAllocator = &*self.allocator;

        let mut matrix = Allocation::new(allocator, shape.matrix_len(), "encode matrix")?;
        self.coder.gen_cauchy_matrix(&mut matrix, dc + pc, dc)?;

        // Failing here drops `matrix` back to the allocator
        let mut tables = Allocation::new(allocator, shape.tables_len(), "encode tables")?;
        self.coder
            .init_tables(dc, pc, &matrix[dc * dc..], &mut tables)?;

        let entry = EncodeTables {
            shape,
            matrix: matrix.into_inner(),
            tables: tables.into_inner(),
            allocator: Arc::clone(&self.allocator),
        };

        self.builds.fetch_add(1, Ordering::SeqCst);
        debug!(
            %shape,
            matrix_bytes = entry.matrix.len(),
            table_bytes = entry.tables.len(),
            "built encode tables"
        );
        Ok(Arc::new(entry))
    }
}
