//! Stripe Encoding Module
//!
//! Turns a caller's scatter-gather write payload into full Reed-Solomon
//! stripes: `dc` data cells taken straight from the payload plus `pc`
//! parity cells computed over GF(2^8).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Stripe Encoding Module                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                          │
//! │  ┌──────────────┐    ┌──────────────┐    ┌───────────────────────────┐  │
//! │  │  SGL + Cursor │──►│    Cell      │──►│      Stripe Encoder       │  │
//! │  │   (sgl.rs)   │    │  Assembler   │    │      (encoder.rs)         │  │
//! │  └──────────────┘    └──────────────┘    └─────────────┬─────────────┘  │
//! │                                                         │                │
//! │                      ┌───────────────────┐    ┌─────────┴─────────┐      │
//! │                      │  Encode Table     │◄──│     GfCoder       │      │
//! │                      │  Cache            │    │  (soft / isal)    │      │
//! │                      └───────────────────┘    └───────────────────┘      │
//! │                                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - **Scatter-gather list** (`sgl.rs`): IO vectors and the persistent
//!   consumption cursor
//! - **Cell assembler** (`cell.rs`): zero-copy cells where possible, owned
//!   copies for cells spanning IO vectors
//! - **Encode table cache** (`table_cache.rs`): Cauchy matrix and expanded
//!   tables, built once per `(dc, pc)`
//! - **Stripe encoder** (`encoder.rs`): assembly, table lookup and parity
//!   generation for one stripe, with cleanup on every exit path
//!
//! # Usage
//!
//! ```rust
//! use ecstripe::ec::{ScatterGatherList, SglCursor, StripeEncoder};
//! use ecstripe::StripeGeometry;
//!
//! let head = b"0123456789";
//! let tail = b"abcdef";
//! let sgl = ScatterGatherList::from_slices(&[head, tail]);
//! let mut cursor = SglCursor::new();
//! let mut parity = vec![vec![0u8; 8]; 2];
//!
//! let encoder = StripeEncoder::with_defaults();
//! encoder.encode_full_stripe(&sgl, &mut cursor, &mut parity, 0, &StripeGeometry::new(8, 2, 2))?;
//!
//! assert_eq!((cursor.iov_index(), cursor.offset()), (1, 6));
//! # Ok::<(), ecstripe::Error>(())
//! ```

pub mod cell;
pub mod encoder;
pub mod sgl;
pub mod table_cache;

#[cfg(test)]
mod proptest;

pub use cell::{assemble_cell, assemble_stripe_data, CellRef};
pub use encoder::{EncoderStats, EncoderStatsSnapshot, StripeEncoder, StripePhase};
pub use sgl::{IoVec, ScatterGatherList, SglCursor};
pub use table_cache::{EncodeTableCache, EncodeTables};
