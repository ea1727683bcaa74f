//! Stripe geometry and encoder configuration
//!
//! [`CodeShape`] is the `(dc, pc)` pair that keys the encode-table cache.
//! [`StripeGeometry`] adds the cell size and is passed to every stripe
//! encode. [`EncoderConfig`] is what the command line and config files
//! deserialize into.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gf::CoderKind;

/// Upper bound on `dc + pc` for a Cauchy matrix over GF(2^8).
pub const MAX_TOTAL_CELLS: usize = 255;

/// Default cell size (1 MiB).
pub const DEFAULT_CELL_SIZE: usize = 1024 * 1024;

/// Default IO vector size used when splitting an input stream.
pub const DEFAULT_IOV_SIZE: usize = 4096;

// =============================================================================
// Code Shape
// =============================================================================

/// Number of data and parity cells in a stripe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeShape {
    /// Number of data cells (dc)
    pub data_cells: usize,
    /// Number of parity cells (pc)
    pub parity_cells: usize,
}

impl CodeShape {
    pub fn new(data_cells: usize, parity_cells: usize) -> Self {
        Self {
            data_cells,
            parity_cells,
        }
    }

    /// Total cells per stripe (dc + pc).
    #[inline]
    pub fn total_cells(&self) -> usize {
        self.data_cells + self.parity_cells
    }

    /// Size of the `(dc+pc) × dc` encode matrix in bytes.
    #[inline]
    pub fn matrix_len(&self) -> usize {
        self.total_cells() * self.data_cells
    }

    /// Size of the expanded encode tables in bytes (32 per coefficient).
    #[inline]
    pub fn tables_len(&self) -> usize {
        32 * self.data_cells * self.parity_cells
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_cells == 0 {
            return Err(Error::invalid("data_cells must be >= 1"));
        }
        if self.parity_cells == 0 {
            return Err(Error::invalid("parity_cells must be >= 1"));
        }
        if self.total_cells() > MAX_TOTAL_CELLS {
            return Err(Error::invalid(format!(
                "data_cells + parity_cells must be <= {} for GF(2^8), got {}",
                MAX_TOTAL_CELLS,
                self.total_cells()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for CodeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.data_cells, self.parity_cells)
    }
}

// =============================================================================
// Stripe Geometry
// =============================================================================

/// Cell size plus code shape for one stripe encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeGeometry {
    /// Size of every data and parity cell in bytes
    pub cell_size: usize,
    /// Number of data cells (dc)
    pub data_cells: usize,
    /// Number of parity cells (pc)
    pub parity_cells: usize,
}

impl StripeGeometry {
    pub fn new(cell_size: usize, data_cells: usize, parity_cells: usize) -> Self {
        Self {
            cell_size,
            data_cells,
            parity_cells,
        }
    }

    #[inline]
    pub fn shape(&self) -> CodeShape {
        CodeShape::new(self.data_cells, self.parity_cells)
    }

    /// Bytes of caller data consumed per stripe (dc · cell_size).
    #[inline]
    pub fn stripe_data_size(&self) -> usize {
        self.data_cells * self.cell_size
    }

    pub fn validate(&self) -> Result<()> {
        if self.cell_size == 0 {
            return Err(Error::invalid("cell_size must be > 0"));
        }
        // ISA-L takes the cell length as a C int
        if self.cell_size > i32::MAX as usize {
            return Err(Error::invalid(format!(
                "cell_size must be <= {}, got {}",
                i32::MAX,
                self.cell_size
            )));
        }
        self.shape().validate()?;
        self.data_cells
            .checked_mul(self.cell_size)
            .ok_or_else(|| Error::invalid("stripe data size overflows usize"))?;
        Ok(())
    }
}

impl Default for StripeGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE, 4, 2)
    }
}

// =============================================================================
// Encoder Configuration
// =============================================================================

/// Configuration for the `ecstripe` binary.
///
/// ```yaml
/// geometry:
///   cell_size: 65536
///   data_cells: 8
///   parity_cells: 3
/// coder: soft
/// iov_size: 4096
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Stripe geometry
    pub geometry: StripeGeometry,
    /// GF(2^8) coder backend
    pub coder: CoderKind,
    /// Size of the IO vectors an input stream is split into
    pub iov_size: usize,
}

impl EncoderConfig {
    /// Load a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| Error::Config(format!("invalid encoder config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.iov_size == 0 {
            return Err(Error::Config("iov_size must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            geometry: StripeGeometry::default(),
            coder: CoderKind::default(),
            iov_size: DEFAULT_IOV_SIZE,
        }
    }
}
