//! Intel ISA-L GF(2^8) coder
//!
//! Safe wrapper over the native erasure-code kernels. Argument checks run
//! before any pointer is handed to C.

use std::os::raw::c_int;

use super::ffi::{ec_encode_data, ec_init_tables, gf_gen_cauchy1_matrix};
use super::{check_encode_args, check_matrix_args, check_table_args, GfCoder};
use crate::error::{Error, Result};

/// GF(2^8) coder backed by Intel ISA-L.
#[derive(Debug, Default, Clone, Copy)]
pub struct IsalCoder;

fn to_c_int(value: usize, what: &str) -> Result<c_int> {
    c_int::try_from(value).map_err(|_| Error::invalid(format!("{} {} exceeds c_int", what, value)))
}

impl GfCoder for IsalCoder {
    fn name(&self) -> &'static str {
        "isal"
    }

    fn gen_cauchy_matrix(&self, matrix: &mut [u8], rows: usize, cols: usize) -> Result<()> {
        check_matrix_args(matrix, rows, cols)?;
        let m = to_c_int(rows, "rows")?;
        let k = to_c_int(cols, "cols")?;

        // SAFETY: matrix holds exactly rows * cols bytes (checked above).
        unsafe { gf_gen_cauchy1_matrix(matrix.as_mut_ptr(), m, k) };
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
        let k = to_c_int(k, "k")?;
        let rows = to_c_int(rows, "rows")?;

        // SAFETY: coefficients holds k * rows bytes and tables 32 * k * rows
        // bytes (checked above). ISA-L only reads the coefficient matrix.
        unsafe {
            ec_init_tables(
                k,
                rows,
                coefficients.as_ptr() as *mut u8,
                tables.as_mut_ptr(),
            )
        };
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
        let c_len = to_c_int(len, "len")?;
        let k = to_c_int(data.len(), "k")?;
        let rows = to_c_int(coding.len(), "rows")?;

        let mut data_ptrs: Vec<*mut u8> = data.iter().map(|c| c.as_ptr() as *mut u8).collect();
        let mut coding_ptrs: Vec<*mut u8> = coding.iter_mut().map(|c| c.as_mut_ptr()).collect();

        // SAFETY: every data cell has >= len readable bytes and every parity
        // cell >= len writable bytes; tables match k and rows (checked above).
        // ISA-L does not write through the data or table pointers.
        unsafe {
            ec_encode_data(
                c_len,
                k,
                rows,
                tables.as_ptr() as *mut u8,
                data_ptrs.as_mut_ptr(),
                coding_ptrs.as_mut_ptr(),
            )
        };
        Ok(())
    }
}
