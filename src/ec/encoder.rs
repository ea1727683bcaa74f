//! Stripe encoder
//!
//! Drives one full stripe from caller data to parity:
//!
//! ```text
//!   Idle ─► Assembling ─► TableReady ─► Encoding ─► Done
//!               │              │            │
//!               └──────────────┴────────────┴──► Failed
//! ```
//!
//! 1. Cut `dc` cells from the scatter-gather list at the cursor
//! 2. Fetch (or build) the encode tables for `(dc, pc)`
//! 3. Run the GF(2^8) coder into `parity[parity_index..parity_index + pc]`
//! 4. Release owned cell copies and commit the cursor
//!
//! Every check that can fail without allocating runs before any parity byte
//! is touched, so a failed call never leaves partially written parity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use super::cell::{assemble_stripe_data, CellRef};
use super::sgl::{ScatterGatherList, SglCursor};
use super::table_cache::EncodeTableCache;
use crate::alloc::{CellAllocator, HeapAllocator};
use crate::config::StripeGeometry;
use crate::error::{Error, Result};
use crate::gf::{GfCoder, SoftCoder};

// =============================================================================
// Stripe Phase
// =============================================================================

/// Progress of a single `encode_full_stripe` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StripePhase {
    Idle,
    /// Cutting data cells out of the scatter-gather list
    Assembling,
    /// Data cells in hand; encode tables being fetched or built
    TableReady,
    /// Coder is writing parity
    Encoding,
    Done,
    Failed,
}

impl StripePhase {
    /// Whether the call has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, StripePhase::Done | StripePhase::Failed)
    }
}

// =============================================================================
// Encoder Statistics
// =============================================================================

/// Running counters for a [`StripeEncoder`].
#[derive(Debug, Default)]
pub struct EncoderStats {
    /// Stripes encoded successfully
    pub stripes_encoded: AtomicU64,
    /// Data bytes consumed by successful stripes
    pub bytes_encoded: AtomicU64,
    /// Cells handed to the coder without copying
    pub cells_borrowed: AtomicU64,
    /// Cells gathered across IO vectors into a copy
    pub cells_copied: AtomicU64,
    /// Stripe encodes that returned an error
    pub encode_errors: AtomicU64,
}

impl EncoderStats {
    /// Fraction of cells that needed a copy.
    pub fn copy_ratio(&self) -> f64 {
        let borrowed = self.cells_borrowed.load(Ordering::Relaxed);
        let copied = self.cells_copied.load(Ordering::Relaxed);
        if borrowed + copied == 0 {
            return 0.0;
        }
        copied as f64 / (borrowed + copied) as f64
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> EncoderStatsSnapshot {
        EncoderStatsSnapshot {
            stripes_encoded: self.stripes_encoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            cells_borrowed: self.cells_borrowed.load(Ordering::Relaxed),
            cells_copied: self.cells_copied.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.stripes_encoded.store(0, Ordering::Relaxed);
        self.bytes_encoded.store(0, Ordering::Relaxed);
        self.cells_borrowed.store(0, Ordering::Relaxed);
        self.cells_copied.store(0, Ordering::Relaxed);
        self.encode_errors.store(0, Ordering::Relaxed);
    }
}

/// Plain-value view of [`EncoderStats`], suitable for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EncoderStatsSnapshot {
    pub stripes_encoded: u64,
    pub bytes_encoded: u64,
    pub cells_borrowed: u64,
    pub cells_copied: u64,
    pub encode_errors: u64,
}

// =============================================================================
// Stripe Encoder
// =============================================================================

/// Produces systematic Reed-Solomon parity for full stripes.
///
/// Cheap to share: the table cache is behind an `Arc` and the counters are
/// atomics. Each call borrows its own cursor, so encodes over different
/// scatter-gather lists may run concurrently.
#[derive(Debug)]
pub struct StripeEncoder {
    cache: Arc<EncodeTableCache>,
    allocator: Arc<dyn CellAllocator>,
    stats: EncoderStats,
    /// Phase the most recent failed encode stopped in
    last_failure: Mutex<Option<StripePhase>>,
}

impl StripeEncoder {
    /// Create an encoder over a shared table cache.
    ///
    /// `allocator` supplies the copies of cells that span IO vectors. Parity
    /// is computed with the cache's coder.
    pub fn new(cache: Arc<EncodeTableCache>, allocator: Arc<dyn CellAllocator>) -> Self {
        Self {
            cache,
            allocator,
            stats: EncoderStats::default(),
            last_failure: Mutex::new(None),
        }
    }

    /// Encoder with a private cache for `coder`, allocating from the heap.
    pub fn with_coder(coder: Arc<dyn GfCoder>) -> Self {
        let allocator: Arc<dyn CellAllocator> = Arc::new(HeapAllocator);
        let cache = EncodeTableCache::new(coder, allocator.clone());
        Self::new(Arc::new(cache), allocator)
    }

    /// Encoder using the portable coder and the heap allocator.
    pub fn with_defaults() -> Self {
        Self::with_coder(Arc::new(SoftCoder))
    }

    pub fn cache(&self) -> &Arc<EncodeTableCache> {
        &self.cache
    }

    pub fn stats(&self) -> &EncoderStats {
        &self.stats
    }

    /// Phase in which the most recent failed encode stopped, if any failed.
    ///
    /// `Assembling` means a cell copy or the input failed, `TableReady` means
    /// the encode tables could not be built, `Idle` means the arguments were
    /// rejected before any work started.
    pub fn last_failure_phase(&self) -> Option<StripePhase> {
        *self.last_failure.lock()
    }

    /// Encode the next full stripe at `cursor`.
    ///
    /// Consumes exactly `dc · cell_size` bytes and writes `pc` parity cells
    /// into `parity[parity_index..parity_index + pc]`. Only the first
    /// `cell_size` bytes of each parity buffer are written.
    ///
    /// The cursor moves only when the call succeeds. On failure it is left
    /// where it was, every cell copy made by the call has been released, and
    /// no parity byte has been written, so the caller may simply retry.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a bad geometry or cursor, fewer than one
    ///   stripe of data left, a parity range outside `parity`, or a parity
    ///   buffer shorter than `cell_size`
    /// - `OutOfMemory` if a cell copy or the encode tables cannot be allocated
    #[instrument(
        skip_all,
        fields(
            shape = %geometry.shape(),
            cell_size = geometry.cell_size,
            parity_index = parity_index
        )
    )]
    pub fn encode_full_stripe<P: AsMut<[u8]>>(
        &self,
        sgl: &ScatterGatherList<'_>,
        cursor: &mut SglCursor,
        parity: &mut [P],
        parity_index: usize,
        geometry: &StripeGeometry,
    ) -> Result<()> {
        let mut phase = StripePhase::Idle;
        let result = self.run_stripe(sgl, cursor, parity, parity_index, geometry, &mut phase);

        if let Err(e) = &result {
            let failed_in = phase;
            advance(&mut phase, StripePhase::Failed);
            *self.last_failure.lock() = Some(failed_in);
            self.stats.encode_errors.fetch_add(1, Ordering::Relaxed);
            warn!(
                phase = ?failed_in,
                iov_idx = cursor.iov_index(),
                iov_off = cursor.offset(),
                error = %e,
                "stripe encode failed"
            );
        }
        debug_assert!(phase.is_terminal());
        result
    }

    fn run_stripe<P: AsMut<[u8]>>(
        &self,
        sgl: &ScatterGatherList<'_>,
        cursor: &mut SglCursor,
        parity: &mut [P],
        parity_index: usize,
        geometry: &StripeGeometry,
        phase: &mut StripePhase,
    ) -> Result<()> {
        geometry.validate()?;
        let cell_size = geometry.cell_size;
        let dc = geometry.data_cells;
        let pc = geometry.parity_cells;

        let end = parity_index
            .checked_add(pc)
            .filter(|&end| end <= parity.len())
            .ok_or_else(|| {
                Error::invalid(format!(
                    "parity cells {}..{} outside parity set of {}",
                    parity_index,
                    parity_index.saturating_add(pc),
                    parity.len()
                ))
            })?;
        let targets = &mut parity[parity_index..end];
        for (i, buf) in targets.iter_mut().enumerate() {
            let len = buf.as_mut().len();
            if len < cell_size {
                return Err(Error::invalid(format!(
                    "parity buffer {} has {} bytes, cell_size is {}",
                    parity_index + i,
                    len,
                    cell_size
                )));
            }
        }

        advance(phase, StripePhase::Assembling);
        let mut pos = *cursor;
        let cells = assemble_stripe_data(sgl, &mut pos, cell_size, dc, &*self.allocator)?;
        advance(phase, StripePhase::TableReady);
        let tables = self.cache.get_or_build(geometry.shape())?;

        let borrowed = cells.iter().filter(|c| c.is_borrowed()).count() as u64;
        let copied = cells.len() as u64 - borrowed;

        advance(phase, StripePhase::Encoding);
        {
            let data: Vec<&[u8]> = cells.iter().map(CellRef::as_slice).collect();
            let mut coding: Vec<&mut [u8]> = targets
                .iter_mut()
                .map(|buf| &mut buf.as_mut()[..cell_size])
                .collect();
            self.cache
                .coder()
                .encode(cell_size, tables.tables(), &data, &mut coding)?;
        }

        // Owned copies go back to the allocator here
        drop(cells);
        *cursor = pos;
        advance(phase, StripePhase::Done);

        self.stats.stripes_encoded.fetch_add(1, Ordering::Relaxed);
        self.stats
            .bytes_encoded
            .fetch_add(geometry.stripe_data_size() as u64, Ordering::Relaxed);
        self.stats.cells_borrowed.fetch_add(borrowed, Ordering::Relaxed);
        self.stats.cells_copied.fetch_add(copied, Ordering::Relaxed);
        Ok(())
    }

    /// Encode every full stripe left in `sgl`.
    ///
    /// Stripe `s` of this call writes parity at `parity[s·pc..(s+1)·pc]`.
    /// Stops before a trailing partial stripe and returns the number of
    /// stripes encoded; the cursor then points at the unencoded tail. If a
    /// stripe fails, the stripes before it stay encoded and committed.
    pub fn encode_stripes<P: AsMut<[u8]>>(
        &self,
        sgl: &ScatterGatherList<'_>,
        cursor: &mut SglCursor,
        parity: &mut [P],
        geometry: &StripeGeometry,
    ) -> Result<usize> {
        geometry.validate()?;
        let stripe_size = geometry.stripe_data_size();

        // One scan up front; each stripe consumes exactly `stripe_size`
        let mut remaining = sgl.remaining(cursor)?;
        let mut stripes = 0;
        while remaining >= stripe_size {
            let parity_index = stripes * geometry.parity_cells;
            self.encode_full_stripe(sgl, cursor, parity, parity_index, geometry)?;
            remaining -= stripe_size;
            stripes += 1;
        }

        debug!(
            stripes,
            tail_bytes = remaining,
            shape = %geometry.shape(),
            "encoded stripes"
        );
        Ok(stripes)
    }
}

impl Default for StripeEncoder {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn advance(phase: &mut StripePhase, next: StripePhase) {
    trace!(from = ?*phase, to = ?next, "stripe phase");
    *phase = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::CountingAllocator;
    use assert_matches::assert_matches;
    use reed_solomon_erasure::galois_8;

    /// Parity from a Cauchy matrix built independently of the coder.
    fn reference_parity(data: &[Vec<u8>], pc: usize) -> Vec<Vec<u8>> {
        let dc = data.len();
        let len = data[0].len();
        (0..pc)
            .map(|l| {
                let row = dc + l;
                (0..len)
                    .map(|b| {
                        data.iter().enumerate().fold(0u8, |acc, (j, cell)| {
                            let coeff = galois_8::div(1, (row ^ j) as u8);
                            acc ^ galois_8::mul(coeff, cell[b])
                        })
                    })
                    .collect()
            })
            .collect()
    }

    fn pattern(cells: usize, cell_size: usize) -> Vec<Vec<u8>> {
        (0..cells)
            .map(|i| {
                (0..cell_size)
                    .map(|b| (i * 37 + b * 11 + 5) as u8)
                    .collect()
            })
            .collect()
    }

    /// Encoder whose cell copies come from `alloc`; the cache uses the heap.
    fn counting_encoder() -> (StripeEncoder, Arc<CountingAllocator>) {
        let alloc = Arc::new(CountingAllocator::new());
        let cache = Arc::new(EncodeTableCache::with_coder(Arc::new(SoftCoder)));
        (StripeEncoder::new(cache, alloc.clone()), alloc)
    }

    #[test]
    fn test_encode_matches_reference() {
        let geometry = StripeGeometry::new(16, 4, 2);
        let data = pattern(4, 16);
        let flat: Vec<u8> = data.concat();
        let sgl = ScatterGatherList::from_slices(&[&flat]);
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0u8; 16]; 2];

        let encoder = StripeEncoder::with_defaults();
        encoder
            .encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &geometry)
            .unwrap();

        assert_eq!(parity, reference_parity(&data, 2));
        assert_eq!(cursor, SglCursor::at(1, 0));
        assert!(cursor.is_exhausted(&sgl));
        assert_eq!(encoder.last_failure_phase(), None);
    }

    #[test]
    fn test_fragmented_input_matches_contiguous() {
        let geometry = StripeGeometry::new(16, 4, 2);
        let data = pattern(4, 16);
        let flat: Vec<u8> = data.concat();
        let sgl: ScatterGatherList<'_> = flat.chunks(7).collect();
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0u8; 16]; 2];

        let encoder = StripeEncoder::with_defaults();
        encoder
            .encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &geometry)
            .unwrap();

        assert_eq!(parity, reference_parity(&data, 2));
        let stats = encoder.stats().snapshot();
        assert_eq!(stats.cells_copied, 4);
        assert_eq!(stats.cells_borrowed, 0);
    }

    #[test]
    fn test_two_vector_stripe() {
        let a = b"0123456789";
        let b = b"abcdef";
        let sgl = ScatterGatherList::from_slices(&[a, b]);
        let geometry = StripeGeometry::new(8, 2, 1);
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0u8; 8]];

        let (encoder, alloc) = counting_encoder();
        encoder
            .encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &geometry)
            .unwrap();

        let data = vec![b"01234567".to_vec(), b"89abcdef".to_vec()];
        assert_eq!(parity, reference_parity(&data, 1));
        assert_eq!(cursor, SglCursor::at(1, 6));
        assert_eq!(alloc.allocations(), 1);
        assert_eq!(alloc.live(), 0);

        let stats = encoder.stats().snapshot();
        assert_eq!(stats.cells_borrowed, 1);
        assert_eq!(stats.cells_copied, 1);
        assert_eq!(stats.bytes_encoded, 16);
    }

    #[test]
    fn test_parity_written_at_index() {
        let geometry = StripeGeometry::new(8, 3, 2);
        let data = pattern(3, 8);
        let flat: Vec<u8> = data.concat();
        let sgl = ScatterGatherList::from_slices(&[&flat]);
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0xAAu8; 8]; 5];

        StripeEncoder::with_defaults()
            .encode_full_stripe(&sgl, &mut cursor, &mut parity, 2, &geometry)
            .unwrap();

        let expected = reference_parity(&data, 2);
        assert_eq!(parity[0], vec![0xAA; 8]);
        assert_eq!(parity[1], vec![0xAA; 8]);
        assert_eq!(&parity[2..4], &expected[..]);
        assert_eq!(parity[4], vec![0xAA; 8]);
    }

    #[test]
    fn test_longer_parity_buffers_keep_tail() {
        let geometry = StripeGeometry::new(8, 2, 1);
        let flat = vec![9u8; 16];
        let sgl = ScatterGatherList::from_slices(&[&flat]);
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0xEEu8; 12]];

        StripeEncoder::with_defaults()
            .encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &geometry)
            .unwrap();

        assert_eq!(&parity[0][8..], &[0xEE; 4]);
    }

    #[test]
    fn test_allocation_failure_leaves_state_untouched() {
        // Every cell straddles a vector boundary, so each one is copied
        let parts: Vec<Vec<u8>> = vec![vec![1; 3], vec![2; 3], vec![3; 3], vec![4; 3]];
        let sgl: ScatterGatherList<'_> = parts.iter().map(|p| p.as_slice()).collect();
        let geometry = StripeGeometry::new(4, 3, 2);
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0x5Au8; 4]; 2];

        let (encoder, alloc) = counting_encoder();
        alloc.fail_after(1);
        let result = encoder.encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &geometry);

        assert_matches!(result, Err(Error::OutOfMemory { what: "cell copy", .. }));
        assert_eq!(alloc.allocations(), 1);
        assert_eq!(alloc.releases(), 1);
        assert_eq!(alloc.live(), 0);
        assert_eq!(parity, vec![vec![0x5Au8; 4]; 2]);
        assert_eq!(cursor, SglCursor::new());
        assert_eq!(encoder.stats().snapshot().encode_errors, 1);
        assert_eq!(encoder.last_failure_phase(), Some(StripePhase::Assembling));
        assert!(!encoder.cache().contains(geometry.shape()));

        // Retry reads the same bytes
        encoder
            .encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &geometry)
            .unwrap();
        let data = vec![vec![1, 1, 1, 2], vec![2, 2, 3, 3], vec![3, 4, 4, 4]];
        assert_eq!(parity, reference_parity(&data, 2));
        assert_eq!(cursor, SglCursor::at(3, 3));
        assert_eq!(alloc.live(), 0);
    }

    #[test]
    fn test_table_allocation_failure() {
        let alloc = Arc::new(CountingAllocator::new());
        let cache = Arc::new(EncodeTableCache::new(Arc::new(SoftCoder), alloc.clone()));
        let encoder = StripeEncoder::new(cache, Arc::new(HeapAllocator));

        let flat = vec![1u8; 32];
        let sgl = ScatterGatherList::from_slices(&[&flat]);
        let geometry = StripeGeometry::new(8, 4, 2);
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0u8; 8]; 2];

        alloc.fail_after(1);
        let result = encoder.encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &geometry);

        assert_matches!(result, Err(Error::OutOfMemory { what: "encode tables", .. }));
        assert_eq!(encoder.last_failure_phase(), Some(StripePhase::TableReady));
        assert_eq!(alloc.live(), 0);
        assert_eq!(parity, vec![vec![0u8; 8]; 2]);
        assert_eq!(cursor, SglCursor::new());

        // Retry builds the tables and encodes
        encoder
            .encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &geometry)
            .unwrap();
        assert_eq!(parity, reference_parity(&vec![vec![1u8; 8]; 4], 2));
        assert_eq!(alloc.live(), 2);
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        let flat = vec![0u8; 64];
        let sgl = ScatterGatherList::from_slices(&[&flat]);
        let encoder = StripeEncoder::with_defaults();
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0u8; 8]; 2];

        for geometry in [
            StripeGeometry::new(0, 4, 2),
            StripeGeometry::new(8, 0, 2),
            StripeGeometry::new(8, 4, 0),
        ] {
            assert_matches!(
                encoder.encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &geometry),
                Err(Error::InvalidArgument(_))
            );
        }

        let geometry = StripeGeometry::new(8, 4, 2);
        assert_matches!(
            encoder.encode_full_stripe(&sgl, &mut cursor, &mut parity, 1, &geometry),
            Err(Error::InvalidArgument(_))
        );
        assert_matches!(
            encoder.encode_full_stripe(&sgl, &mut cursor, &mut parity, usize::MAX, &geometry),
            Err(Error::InvalidArgument(_))
        );

        let mut short = vec![vec![0u8; 8], vec![0u8; 7]];
        assert_matches!(
            encoder.encode_full_stripe(&sgl, &mut cursor, &mut short, 0, &geometry),
            Err(Error::InvalidArgument(_))
        );
        assert_eq!(encoder.last_failure_phase(), Some(StripePhase::Idle));

        let mut bad_cursor = SglCursor::at(4, 0);
        assert_matches!(
            encoder.encode_full_stripe(&sgl, &mut bad_cursor, &mut parity, 0, &geometry),
            Err(Error::InvalidArgument(_))
        );

        assert_eq!(encoder.last_failure_phase(), Some(StripePhase::Assembling));

        assert_eq!(cursor, SglCursor::new());
        assert_eq!(encoder.stats().snapshot().encode_errors, 7);
        assert_eq!(encoder.stats().snapshot().stripes_encoded, 0);
    }

    #[test]
    fn test_encode_stripes() {
        let geometry = StripeGeometry::new(8, 2, 2);
        let data = pattern(7, 8);
        let flat: Vec<u8> = data.concat();
        let sgl: ScatterGatherList<'_> = flat.chunks(5).collect();
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0u8; 8]; 6];

        let encoder = StripeEncoder::with_defaults();
        let stripes = encoder
            .encode_stripes(&sgl, &mut cursor, &mut parity, &geometry)
            .unwrap();

        assert_eq!(stripes, 3);
        assert_eq!(sgl.remaining(&cursor).unwrap(), 8);
        for s in 0..3 {
            let expected = reference_parity(&data[s * 2..s * 2 + 2], 2);
            assert_eq!(&parity[s * 2..s * 2 + 2], &expected[..]);
        }
        assert_eq!(encoder.cache().builds(), 1);
        assert_eq!(encoder.stats().snapshot().stripes_encoded, 3);
    }

    #[test]
    fn test_encode_stripes_single_byte_vectors() {
        let geometry = StripeGeometry::new(4, 3, 1);
        let data = pattern(3 * 40, 4);
        let flat: Vec<u8> = data.concat();
        let sgl: ScatterGatherList<'_> = flat[..flat.len() - 5].chunks(1).collect();
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0u8; 4]; 40];

        let encoder = StripeEncoder::with_defaults();
        let stripes = encoder
            .encode_stripes(&sgl, &mut cursor, &mut parity, &geometry)
            .unwrap();

        // 475 bytes: 39 stripes of 12, 7 left over
        assert_eq!(stripes, 39);
        assert_eq!(sgl.remaining(&cursor).unwrap(), 7);
        // The last byte was gathered into a copy, so the cursor stays on it
        assert_eq!(cursor, SglCursor::at(467, 1));
        for s in 0..stripes {
            let expected = reference_parity(&data[s * 3..s * 3 + 3], 1);
            assert_eq!(&parity[s..s + 1], &expected[..]);
        }
        assert_eq!(parity[39], vec![0u8; 4]);
    }

    #[test]
    fn test_stats_reset() {
        let stats = EncoderStats::default();
        assert_eq!(stats.copy_ratio(), 0.0);

        stats.cells_borrowed.fetch_add(3, Ordering::Relaxed);
        stats.cells_copied.fetch_add(1, Ordering::Relaxed);
        assert_eq!(stats.copy_ratio(), 0.25);

        stats.reset();
        assert_eq!(stats.snapshot(), EncoderStatsSnapshot::default());
    }

    #[test]
    fn test_phase_terminal() {
        assert!(StripePhase::Done.is_terminal());
        assert!(StripePhase::Failed.is_terminal());
        assert!(!StripePhase::TableReady.is_terminal());
    }
}
