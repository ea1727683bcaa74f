//! Portable GF(2^8) coder
//!
//! Reproduces ISA-L's base (non-SIMD) kernels over the field generated by
//! x^8 + x^4 + x^3 + x^2 + 1 (0x11D), so matrices, tables and parity match
//! the native library byte for byte.

use once_cell::sync::Lazy;

use super::{check_encode_args, check_matrix_args, check_table_args, GfCoder};
use super::TABLE_BYTES_PER_COEFFICIENT;
use crate::error::Result;

/// Field polynomial x^8 + x^4 + x^3 + x^2 + 1
const GF_POLYNOMIAL: u16 = 0x11D;

// =============================================================================
// GF(2^8) Arithmetic
// =============================================================================

struct LogTables {
    /// exp[i] = 2^i, doubled so log sums need no reduction
    exp: [u8; 510],
    log: [u8; 256],
}

static GF: Lazy<LogTables> = Lazy::new(|| {
    let mut exp = [0u8; 510];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    for i in 0..255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= GF_POLYNOMIAL;
        }
    }
    for i in 255..510 {
        exp[i] = exp[i - 255];
    }
    LogTables { exp, log }
});

/// Multiply two field elements.
#[inline]
pub fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let gf = &*GF;
    gf.exp[gf.log[a as usize] as usize + gf.log[b as usize] as usize]
}

/// Multiplicative inverse; 0 maps to 0 like ISA-L's `gf_inv`.
#[inline]
pub fn gf_inv(a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    let gf = &*GF;
    gf.exp[255 - gf.log[a as usize] as usize]
}

/// Expand one coefficient into its 32-byte nibble table.
///
/// Bytes 0..16 hold `c·x` for the low nibble, 16..32 hold `c·(x << 4)`.
fn vect_mul_init(c: u8, table: &mut [u8]) {
    for x in 0..16u8 {
        table[x as usize] = gf_mul(c, x);
        table[16 + x as usize] = gf_mul(c, x << 4);
    }
}

// =============================================================================
// Soft Coder
// =============================================================================

/// Table-driven GF(2^8) coder with no native dependencies.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftCoder;

impl GfCoder for SoftCoder {
    fn name(&self) -> &'static str {
        "soft"
    }

    fn gen_cauchy_matrix(&self, matrix: &mut [u8], rows: usize, cols: usize) -> Result<()> {
        check_matrix_args(matrix, rows, cols)?;

        matrix.fill(0);
        for i in 0..cols {
            matrix[i * cols + i] = 1;
        }
        // 1 / (i ^ j), never 1/0 since i >= cols > j
        for i in cols..rows {
            for j in 0..cols {
                matrix[i * cols + j] = gf_inv((i ^ j) as u8);
            }
        }
        Ok(())
    }

    fn init_tables(
        &self,
        k: usize,
        rows: usize,
        coefficients: &[u8],
        tables: &mut [u8],
    ) -> Result<()> {
        check_table_args(k, rows, coefficients, tables)?;

        for (&c, table) in coefficients
            .iter()
            .zip(tables.chunks_exact_mut(TABLE_BYTES_PER_COEFFICIENT))
        {
            vect_mul_init(c, table);
        }
        Ok(())
    }

    fn encode(
        &self,
        len: usize,
        tables: &[u8],
        data: &[&[u8]],
        coding: &mut [&mut [u8]],
    ) -> Result<()> {
        check_encode_args(len, tables, data, coding)?;

        let k = data.len();
        for (l, parity) in coding.iter_mut().enumerate() {
            let out = &mut parity[..len];
            out.fill(0);
            for (j, cell) in data.iter().enumerate() {
                let offset = (l * k + j) * TABLE_BYTES_PER_COEFFICIENT;
                let (lo, hi) = tables[offset..offset + TABLE_BYTES_PER_COEFFICIENT].split_at(16);
                for (o, &d) in out.iter_mut().zip(&cell[..len]) {
                    *o ^= lo[(d & 0x0f) as usize] ^ hi[(d >> 4) as usize];
                }
            }
        }
        Ok(())
    }
}
