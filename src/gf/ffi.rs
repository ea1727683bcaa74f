//! FFI bindings for Intel ISA-L
//!
//! Minimal bindings for the erasure-code entry points the stripe encoder
//! needs. Linked by `build.rs` when the `isal` feature is enabled.

use std::os::raw::{c_int, c_uchar};

extern "C" {
    /// Generate a Cauchy matrix for Reed-Solomon encoding.
    ///
    /// # Arguments
    /// * `a` - Output matrix (m rows × k columns)
    /// * `m` - Total number of rows (data + parity)
    /// * `k` - Number of data columns
    pub fn gf_gen_cauchy1_matrix(a: *mut c_uchar, m: c_int, k: c_int);

    /// Initialize encoding tables from a generator matrix.
    ///
    /// # Arguments
    /// * `k` - Number of data shards
    /// * `rows` - Number of output rows (typically m for encoding)
    /// * `a` - Encoding matrix (rows × k)
    /// * `gftbls` - Output tables buffer (must be 32 × k × rows bytes)
    pub fn ec_init_tables(k: c_int, rows: c_int, a: *mut c_uchar, gftbls: *mut c_uchar);

    /// Encode data shards to produce parity shards.
    ///
    /// Dispatches to the best SIMD implementation for the running CPU.
    ///
    /// # Safety
    /// - `data` holds `k` pointers to at least `len` readable bytes
    /// - `coding` holds `rows` pointers to at least `len` writable bytes
    /// - `gftbls` was produced by `ec_init_tables` with the same k and rows
    pub fn ec_encode_data(
        len: c_int,
        k: c_int,
        rows: c_int,
        gftbls: *mut c_uchar,
        data: *mut *mut c_uchar,
        coding: *mut *mut c_uchar,
    );
}
