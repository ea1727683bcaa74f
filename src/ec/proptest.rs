//! Property-Based Tests for Stripe Encoding
//!
//! Uses proptest to check cell assembly and parity generation across
//! arbitrary scatter-gather layouts and code shapes.
//!
//! # Test Properties
//!
//! 1. **Exact Consumption**: a stripe consumes `dc · cell_size` bytes in order
//! 2. **Layout Independence**: parity does not depend on how data is split
//! 3. **Systematic Code**: identity on top, parity rows match a reference
//! 4. **Cache Idempotence**: repeat lookups never rebuild or reallocate

#![cfg(test)]

use std::sync::Arc;

use proptest::prelude::*;
use reed_solomon_erasure::galois_8;

use super::cell::assemble_stripe_data;
use super::encoder::StripeEncoder;
use super::sgl::{ScatterGatherList, SglCursor};
use super::table_cache::EncodeTableCache;
use crate::alloc::{CountingAllocator, HeapAllocator};
use crate::config::{CodeShape, StripeGeometry};
use crate::gf::SoftCoder;

// =============================================================================
// Property Strategies
// =============================================================================

/// Small stripe geometries: cell 1-64 bytes, 1-8 data cells, 1-4 parity.
fn geometry_strategy() -> impl Strategy<Value = StripeGeometry> {
    (1usize..=64, 1usize..=8, 1usize..=4)
        .prop_map(|(cell_size, dc, pc)| StripeGeometry::new(cell_size, dc, pc))
}

/// Split points for cutting a buffer into IO vectors, empty ones included.
fn split_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..48, 0..24)
}

/// Cut `data` into consecutive slices of the given sizes; the rest goes last.
fn split<'a>(data: &'a [u8], sizes: &[usize]) -> ScatterGatherList<'a> {
    let mut sgl = ScatterGatherList::new();
    let mut rest = data;
    for &size in sizes {
        let (head, tail) = rest.split_at(size.min(rest.len()));
        sgl.push(head);
        rest = tail;
    }
    sgl.push(rest);
    sgl
}

fn reference_parity(data: &[u8], geometry: &StripeGeometry) -> Vec<Vec<u8>> {
    let dc = geometry.data_cells;
    let cell_size = geometry.cell_size;
    (0..geometry.parity_cells)
        .map(|l| {
            (0..cell_size)
                .map(|b| {
                    (0..dc).fold(0u8, |acc, j| {
                        let coeff = galois_8::div(1, ((dc + l) ^ j) as u8);
                        acc ^ galois_8::mul(coeff, data[j * cell_size + b])
                    })
                })
                .collect()
        })
        .collect()
}

// =============================================================================
// Assembly Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: the cells of a stripe are the next `dc · cell_size` bytes
    /// of the stream, in order, whatever the vector layout.
    #[test]
    fn prop_stripe_consumes_exact_bytes(
        geometry in geometry_strategy(),
        sizes in split_strategy(),
        extra in 0usize..32,
        seed in any::<u8>(),
    ) {
        let needed = geometry.stripe_data_size();
        let data: Vec<u8> = (0..needed + extra)
            .map(|i| (i as u8).wrapping_mul(31) ^ seed)
            .collect();
        let sgl = split(&data, &sizes);
        let alloc = CountingAllocator::new();
        let mut cursor = SglCursor::new();

        let cells = assemble_stripe_data(
            &sgl,
            &mut cursor,
            geometry.cell_size,
            geometry.data_cells,
            &alloc,
        )?;

        prop_assert_eq!(cells.len(), geometry.data_cells);
        let joined: Vec<u8> = cells.iter().flat_map(|c| c.iter().copied()).collect();
        prop_assert_eq!(&joined[..], &data[..needed]);
        prop_assert_eq!(sgl.remaining(&cursor)?, extra);

        let owned = cells.iter().filter(|c| c.is_owned()).count() as u64;
        prop_assert_eq!(alloc.live(), owned);
        drop(cells);
        prop_assert_eq!(alloc.live(), 0);
    }

    /// Property: a cell split across two vectors at any point equals the
    /// same bytes taken from one contiguous buffer.
    #[test]
    fn prop_spanning_cell_equals_contiguous(
        cell in prop::collection::vec(any::<u8>(), 2..256),
        cut in any::<prop::sample::Index>(),
    ) {
        let at = 1 + cut.index(cell.len() - 1);
        let (head, tail) = cell.split_at(at);
        let sgl = ScatterGatherList::from_slices(&[head, tail]);
        let mut cursor = SglCursor::new();

        let cells = assemble_stripe_data(&sgl, &mut cursor, cell.len(), 1, &HeapAllocator)?;

        prop_assert!(cells[0].is_owned());
        prop_assert_eq!(&cells[0][..], &cell[..]);
        prop_assert!(cursor.is_exhausted(&sgl));
    }
}

// =============================================================================
// Encoding Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: parity depends only on the byte stream, not its layout.
    #[test]
    fn prop_parity_layout_independent(
        geometry in geometry_strategy(),
        sizes in split_strategy(),
        seed in any::<u8>(),
    ) {
        let data: Vec<u8> = (0..geometry.stripe_data_size())
            .map(|i| (i as u8).wrapping_add(seed).rotate_left(3))
            .collect();
        let encoder = StripeEncoder::with_defaults();

        let whole = ScatterGatherList::from_slices(&[&data]);
        let mut cursor = SglCursor::new();
        let mut expected = vec![vec![0u8; geometry.cell_size]; geometry.parity_cells];
        encoder.encode_full_stripe(&whole, &mut cursor, &mut expected, 0, &geometry)?;

        let pieces = split(&data, &sizes);
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0u8; geometry.cell_size]; geometry.parity_cells];
        encoder.encode_full_stripe(&pieces, &mut cursor, &mut parity, 0, &geometry)?;

        prop_assert_eq!(parity, expected);
        prop_assert!(cursor.is_exhausted(&pieces));
    }

    /// Property: the generator matrix is systematic and the parity equals its
    /// Cauchy rows applied to the data in an independent GF(2^8).
    #[test]
    fn prop_systematic_parity(
        geometry in geometry_strategy(),
        data in prop::collection::vec(any::<u8>(), 512),
    ) {
        let data = &data[..geometry.stripe_data_size()];
        let encoder = StripeEncoder::with_defaults();
        let sgl = ScatterGatherList::from_slices(&[data]);
        let mut cursor = SglCursor::new();
        let mut parity = vec![vec![0u8; geometry.cell_size]; geometry.parity_cells];

        encoder.encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &geometry)?;

        let dc = geometry.data_cells;
        let tables = encoder.cache().get_or_build(geometry.shape())?;
        for i in 0..dc {
            for j in 0..dc {
                prop_assert_eq!(tables.matrix()[i * dc + j], u8::from(i == j));
            }
        }
        prop_assert_eq!(parity, reference_parity(data, &geometry));
    }
}

// =============================================================================
// Cache Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: a second lookup returns identical contents with no new
    /// allocation or build.
    #[test]
    fn prop_cache_idempotent(dc in 1usize..=32, pc in 1usize..=16) {
        let alloc = Arc::new(CountingAllocator::new());
        let cache = EncodeTableCache::new(Arc::new(SoftCoder), alloc.clone());
        let shape = CodeShape::new(dc, pc);

        let first = cache.get_or_build(shape)?;
        let allocations = alloc.allocations();
        let second = cache.get_or_build(shape)?;

        prop_assert_eq!(first.matrix(), second.matrix());
        prop_assert_eq!(first.tables(), second.tables());
        prop_assert_eq!(alloc.allocations(), allocations);
        prop_assert_eq!(cache.builds(), 1);
    }
}
