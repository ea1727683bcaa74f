//! GF(2^8) coder backends
//!
//! The stripe encoder treats the Galois-field kernel as a vendor primitive
//! with three operations, mirroring Intel ISA-L:
//!
//! - `gen_cauchy_matrix` - systematic `(k+m) × k` Cauchy generator matrix
//! - `init_tables` - expand the `m × k` parity rows into 32-byte lookup tables
//! - `encode` - multiply-accumulate `k` data cells into `m` parity cells
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   dyn GfCoder                         │
//! ├──────────────────────────┬───────────────────────────┤
//! │        SoftCoder         │        IsalCoder          │
//! │   (portable, default)    │  (feature = "isal", FFI)  │
//! └──────────────────────────┴───────────────────────────┘
//! ```
//!
//! Both backends produce bit-identical matrices, tables and parity.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod soft;

#[cfg(feature = "isal")]
mod ffi;
#[cfg(feature = "isal")]
pub mod isal;

pub use soft::SoftCoder;

#[cfg(feature = "isal")]
pub use isal::IsalCoder;

/// Bytes of expanded table per matrix coefficient.
pub const TABLE_BYTES_PER_COEFFICIENT: usize = 32;

// =============================================================================
// Coder Port
// =============================================================================

/// GF(2^8) matrix generation, table expansion and encoding.
pub trait GfCoder: Send + Sync + fmt::Debug {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Fill `matrix` with a `rows × cols` Cauchy generator matrix whose top
    /// `cols` rows are the identity.
    fn gen_cauchy_matrix(&self, matrix: &mut [u8], rows: usize, cols: usize) -> Result<()>;

    /// Expand a `rows × k` coefficient matrix into `32 · k · rows` bytes of
    /// encode tables.
    fn init_tables(
        &self,
        k: usize,
        rows: usize,
        coefficients: &[u8],
        tables: &mut [u8],
    ) -> Result<()>;

    /// Compute `coding.len()` parity cells of `len` bytes from `data.len()`
    /// data cells, overwriting the first `len` bytes of each parity buffer.
    fn encode(
        &self,
        len: usize,
        tables: &[u8],
        data: &[&[u8]],
        coding: &mut [&mut [u8]],
    ) -> Result<()>;
}

/// Selects a [`GfCoder`] backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CoderKind {
    /// Portable table-driven coder
    #[default]
    Soft,
    /// Intel ISA-L SIMD coder
    Isal,
}

impl CoderKind {
    /// Instantiate the selected backend.
    pub fn build(self) -> Result<Arc<dyn GfCoder>> {
        match self {
            CoderKind::Soft => Ok(Arc::new(SoftCoder)),
            #[cfg(feature = "isal")]
            CoderKind::Isal => Ok(Arc::new(IsalCoder)),
            #[cfg(not(feature = "isal"))]
            CoderKind::Isal => Err(Error::Config(
                "ISA-L coder requested but ecstripe was built without the `isal` feature".into(),
            )),
        }
    }
}

impl fmt::Display for CoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoderKind::Soft => write!(f, "soft"),
            CoderKind::Isal => write!(f, "isal"),
        }
    }
}

// =============================================================================
// Argument Checks
// =============================================================================

pub(crate) fn check_matrix_args(matrix: &[u8], rows: usize, cols: usize) -> Result<()> {
    if cols == 0 || rows < cols {
        return Err(Error::invalid(format!(
            "cauchy matrix needs rows >= cols >= 1, got {}x{}",
            rows, cols
        )));
    }
    if rows > 256 {
        return Err(Error::invalid(format!(
            "cauchy matrix over GF(2^8) allows at most 256 rows, got {}",
            rows
        )));
    }
    if matrix.len() != rows * cols {
        return Err(Error::invalid(format!(
            "matrix buffer is {} bytes, expected {}",
            matrix.len(),
            rows * cols
        )));
    }
    Ok(())
}

pub(crate) fn check_table_args(
    k: usize,
    rows: usize,
    coefficients: &[u8],
    tables: &[u8],
) -> Result<()> {
    if coefficients.len() != k * rows {
        return Err(Error::invalid(format!(
            "coefficient matrix is {} bytes, expected {}",
            coefficients.len(),
            k * rows
        )));
    }
    if tables.len() != TABLE_BYTES_PER_COEFFICIENT * k * rows {
        return Err(Error::invalid(format!(
            "tables buffer is {} bytes, expected {}",
            tables.len(),
            TABLE_BYTES_PER_COEFFICIENT * k * rows
        )));
    }
    Ok(())
}

pub(crate) fn check_encode_args(
    len: usize,
    tables: &[u8],
    data: &[&[u8]],
    coding: &[&mut [u8]],
) -> Result<()> {
    let k = data.len();
    let rows = coding.len();
    if k == 0 || rows == 0 {
        return Err(Error::invalid("encode needs at least one data and one parity cell"));
    }
    if tables.len() != TABLE_BYTES_PER_COEFFICIENT * k * rows {
        return Err(Error::invalid(format!(
            "encode tables are {} bytes, {}+{} needs {}",
            tables.len(),
            k,
            rows,
            TABLE_BYTES_PER_COEFFICIENT * k * rows
        )));
    }
    if let Some((i, cell)) = data.iter().enumerate().find(|(_, c)| c.len() < len) {
        return Err(Error::invalid(format!(
            "data cell {} has {} bytes, expected {}",
            i,
            cell.len(),
            len
        )));
    }
    if let Some((i, cell)) = coding.iter().enumerate().find(|(_, c)| c.len() < len) {
        return Err(Error::invalid(format!(
            "parity cell {} has {} bytes, expected {}",
            i,
            cell.len(),
            len
        )));
    }
    Ok(())
}
