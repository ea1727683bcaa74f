//! Cell assembly
//!
//! Cuts fixed-size data cells out of a scatter-gather list. A cell that
//! lies inside one IO vector is handed out as a zero-copy borrow; a cell
//! that straddles vector boundaries is gathered into a freshly allocated
//! buffer.
//!
//! ```text
//!   iov 0: [0123456789]   iov 1: [abcdef]        cell_size = 8
//!           └─cell 0─┘└──── cell 1 ────┘
//!            Borrowed       Owned("89abcdef")
//! ```

use std::ops::Deref;

use tracing::trace;

use super::sgl::{ScatterGatherList, SglCursor};
use crate::alloc::{Allocation, CellAllocator};
use crate::error::{Error, Result};

// =============================================================================
// Cell Reference
// =============================================================================

/// One data cell: either a view into the caller's buffers or an owned copy.
///
/// Owned copies go back to their allocator when the `CellRef` is dropped.
#[derive(Debug)]
pub enum CellRef<'a> {
    /// Zero-copy view into a single IO vector
    Borrowed(&'a [u8]),
    /// Gathered copy of a cell spanning IO vectors
    Owned(Allocation<'a>),
}

impl CellRef<'_> {
    #[inline]
    pub fn is_borrowed(&self) -> bool {
        matches!(self, CellRef::Borrowed(_))
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self, CellRef::Owned(_))
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            CellRef::Borrowed(bytes) => bytes,
            CellRef::Owned(buf) => buf,
        }
    }
}

impl Deref for CellRef<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for CellRef<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

// =============================================================================
// Assembly
// =============================================================================

/// Extract the next `cell_size` bytes at `cursor` as one cell.
///
/// Advances the cursor by exactly `cell_size` bytes on success and leaves
/// it untouched on failure.
///
/// # Errors
///
/// - `InvalidArgument` if `cell_size` is zero, the cursor is outside the
///   list, or fewer than `cell_size` bytes remain
/// - `OutOfMemory` if the cell spans IO vectors and its copy buffer cannot
///   be allocated
pub fn assemble_cell<'a>(
    sgl: &ScatterGatherList<'a>,
    cursor: &mut SglCursor,
    cell_size: usize,
    allocator: &'a dyn CellAllocator,
) -> Result<CellRef<'a>> {
    if cell_size == 0 {
        return Err(Error::invalid("cell_size must be > 0"));
    }
    sgl.check_cursor(cursor)?;

    let mut pos = *cursor;
    let cell = take_cell(sgl, &mut pos, cell_size, allocator)?;
    *cursor = pos;
    Ok(cell)
}

/// Extract `dc` consecutive cells at `cursor`, in stream order.
///
/// All-or-nothing: if any cell fails, every owned copy already made for
/// this stripe is released and the cursor is left where it was, so a retry
/// reads the same bytes again.
pub fn assemble_stripe_data<'a>(
    sgl: &ScatterGatherList<'a>,
    cursor: &mut SglCursor,
    cell_size: usize,
    dc: usize,
    allocator: &'a dyn CellAllocator,
) -> Result<Vec<CellRef<'a>>> {
    if cell_size == 0 {
        return Err(Error::invalid("cell_size must be > 0"));
    }
    if dc == 0 {
        return Err(Error::invalid("data cell count must be > 0"));
    }
    dc.checked_mul(cell_size)
        .ok_or_else(|| Error::invalid("stripe data size overflows usize"))?;
    sgl.check_cursor(cursor)?;

    let mut pos = *cursor;
    let mut cells = Vec::with_capacity(dc);
    for _ in 0..dc {
        // Dropping `cells` on error releases the copies made so far
        cells.push(take_cell(sgl, &mut pos, cell_size, allocator)?);
    }
    *cursor = pos;
    Ok(cells)
}

// Running short is found while walking the vectors, not by a separate
// scan of the remaining length
fn exhausted(pos: &SglCursor) -> Error {
    Error::invalid(format!(
        "scatter-gather list exhausted at io vector {}",
        pos.iov_idx
    ))
}

fn take_cell<'a>(
    sgl: &ScatterGatherList<'a>,
    pos: &mut SglCursor,
    cell_size: usize,
    allocator: &'a dyn CellAllocator,
) -> Result<CellRef<'a>> {
    pos.skip_exhausted(sgl);
    let iov = sgl.iov(pos.iov_idx).ok_or_else(|| exhausted(pos))?;
    let bytes = iov.as_slice();

    if bytes.len() - pos.iov_off >= cell_size {
        let cell = &bytes[pos.iov_off..pos.iov_off + cell_size];
        pos.iov_off += cell_size;
        if pos.iov_off == bytes.len() {
            pos.iov_idx += 1;
            pos.iov_off = 0;
        }
        return Ok(CellRef::Borrowed(cell));
    }

    let mut buf = Allocation::new(allocator, cell_size, "cell copy")?;
    let mut copied = 0;
    while copied < cell_size {
        let bytes = sgl.iov(pos.iov_idx).ok_or_else(|| exhausted(pos))?.as_slice();
        let avail = &bytes[pos.iov_off..];
        let want = cell_size - copied;

        if avail.len() < want {
            buf[copied..copied + avail.len()].copy_from_slice(avail);
            copied += avail.len();
            pos.iov_idx += 1;
            pos.iov_off = 0;
        } else {
            // Stays on this vector even when it is used up exactly
            buf[copied..].copy_from_slice(&avail[..want]);
            pos.iov_off += want;
            copied += want;
        }
    }
    trace!(
        cell_size,
        iov_idx = pos.iov_idx,
        iov_off = pos.iov_off,
        "gathered cell across io vectors"
    );

    Ok(CellRef::Owned(buf))
}
