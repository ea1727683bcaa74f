//! Scatter-gather lists and the stripe cursor
//!
//! A [`ScatterGatherList`] is the caller's write payload: an ordered list
//! of IO vectors whose concatenation is the logical byte stream. A
//! [`SglCursor`] records how far stripe extraction has progressed through
//! that stream and persists across calls.

use crate::error::{Error, Result};

// =============================================================================
// IO Vector
// =============================================================================

/// A caller buffer plus the number of valid bytes in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoVec<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> IoVec<'a> {
    /// IO vector covering the whole buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            len: buf.len(),
        }
    }

    /// IO vector whose logical length is shorter than its buffer.
    pub fn with_len(buf: &'a [u8], len: usize) -> Result<Self> {
        if len > buf.len() {
            return Err(Error::invalid(format!(
                "io vector length {} exceeds buffer size {}",
                len,
                buf.len()
            )));
        }
        Ok(Self { buf, len })
    }

    /// Number of valid bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the underlying buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The valid bytes.
    #[inline]
    pub fn as_slice(&self) -> &'a [u8] {
        &self.buf[..self.len]
    }
}

// =============================================================================
// Scatter-Gather List
// =============================================================================

/// Ordered sequence of IO vectors forming one logical byte stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScatterGatherList<'a> {
    iovs: Vec<IoVec<'a>>,
}

impl<'a> ScatterGatherList<'a> {
    pub fn new() -> Self {
        Self { iovs: Vec::new() }
    }

    /// Build a list with one full-length IO vector per slice.
    pub fn from_slices(slices: &[&'a [u8]]) -> Self {
        slices.iter().copied().collect()
    }

    /// Append a full-length IO vector.
    pub fn push(&mut self, buf: &'a [u8]) {
        self.iovs.push(IoVec::new(buf));
    }

    /// Append an IO vector.
    pub fn push_iov(&mut self, iov: IoVec<'a>) {
        self.iovs.push(iov);
    }

    /// Number of IO vectors.
    #[inline]
    pub fn nr(&self) -> usize {
        self.iovs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.iovs.is_empty()
    }

    #[inline]
    pub fn iov(&self, index: usize) -> Option<IoVec<'a>> {
        self.iovs.get(index).copied()
    }

    pub fn iovs(&self) -> &[IoVec<'a>] {
        &self.iovs
    }

    /// Total valid bytes across all IO vectors.
    pub fn total_len(&self) -> usize {
        self.iovs.iter().map(IoVec::len).sum()
    }

    /// Bytes not yet consumed at `cursor`.
    ///
    /// Fails if the cursor does not point into this list.
    pub fn remaining(&self, cursor: &SglCursor) -> Result<usize> {
        self.check_cursor(cursor)?;
        let tail: usize = self.iovs[cursor.iov_idx..]
            .iter()
            .map(IoVec::len)
            .sum();
        Ok(tail - cursor.iov_off)
    }

    /// Validate that `cursor` lies within this list.
    ///
    /// An offset equal to the vector length is accepted and means the
    /// start of the next vector.
    pub fn check_cursor(&self, cursor: &SglCursor) -> Result<()> {
        match self.iovs.get(cursor.iov_idx) {
            Some(iov) if cursor.iov_off <= iov.len() => Ok(()),
            Some(iov) => Err(Error::invalid(format!(
                "cursor offset {} beyond io vector {} of length {}",
                cursor.iov_off,
                cursor.iov_idx,
                iov.len()
            ))),
            None if cursor.iov_idx == self.iovs.len() && cursor.iov_off == 0 => Ok(()),
            None => Err(Error::invalid(format!(
                "cursor at io vector {} offset {} but list has {} vectors",
                cursor.iov_idx,
                cursor.iov_off,
                self.iovs.len()
            ))),
        }
    }
}

impl<'a> FromIterator<&'a [u8]> for ScatterGatherList<'a> {
    fn from_iter<I: IntoIterator<Item = &'a [u8]>>(iter: I) -> Self {
        Self {
            iovs: iter.into_iter().map(IoVec::new).collect(),
        }
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Consumption position `(io vector index, byte offset)` within an SGL.
///
/// The cursor is owned by the caller and carried from one stripe encode to
/// the next. It is not synchronized; one owner at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SglCursor {
    pub(crate) iov_idx: usize,
    pub(crate) iov_off: usize,
}

impl SglCursor {
    /// Cursor at the start of a list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor at an explicit position.
    pub fn at(iov_idx: usize, iov_off: usize) -> Self {
        Self { iov_idx, iov_off }
    }

    #[inline]
    pub fn iov_index(&self) -> usize {
        self.iov_idx
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.iov_off
    }

    /// Move past vectors that have nothing left at the current position.
    pub(crate) fn skip_exhausted(&mut self, sgl: &ScatterGatherList<'_>) {
        while let Some(iov) = sgl.iov(self.iov_idx) {
            if self.iov_off < iov.len() {
                break;
            }
            self.iov_idx += 1;
            self.iov_off = 0;
        }
    }

    /// True when no bytes remain in `sgl` at this position.
    pub fn is_exhausted(&self, sgl: &ScatterGatherList<'_>) -> bool {
        let mut next = *self;
        next.skip_exhausted(sgl);
        next.iov_idx >= sgl.nr()
    }
}
