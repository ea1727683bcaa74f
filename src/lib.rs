//! ecstripe - Stripe assembly and systematic Reed-Solomon encoding
//!
//! The write-side core of an erasure-coded object store: takes a caller's
//! scatter-gather payload, cuts it into fixed-size data cells and produces
//! Cauchy Reed-Solomon parity cells over GF(2^8).
//!
//! # Architecture
//!
//! ```text
//! SGL + Cursor → Cell Assembler → Stripe Encoder → GfCoder → Parity
//!                                       ↑
//!                               Encode Table Cache
//! ```
//!
//! # Modules
//!
//! - [`alloc`] - Fallible cell allocation and scoped release
//! - [`config`] - Code shapes, stripe geometry and encoder configuration
//! - [`ec`] - Scatter-gather cursor, cell assembly, table cache, encoder
//! - [`error`] - Error types
//! - [`gf`] - GF(2^8) coder backends (portable and ISA-L)

pub mod alloc;
pub mod config;
pub mod ec;
pub mod error;
pub mod gf;

// Re-export commonly used types
pub use alloc::{Allocation, CellAllocator, CountingAllocator, HeapAllocator};
pub use config::{CodeShape, EncoderConfig, StripeGeometry, MAX_TOTAL_CELLS};
pub use ec::{
    CellRef, EncodeTableCache, EncodeTables, EncoderStats, ScatterGatherList, SglCursor,
    StripeEncoder, StripePhase,
};
pub use error::{Error, Result};
pub use gf::{CoderKind, GfCoder, SoftCoder};
