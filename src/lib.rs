//! Nodedelta: packed-varint wire codec for OSM node coordinate deltas.
//!
//! An on-disk coordinate cache records incremental node position updates as
//! batches of `(id, lat, lon)` delta records. This crate is the wire format
//! for those batches: three packed, zig-zag varint columns plus an opaque
//! trailer that carries any newer producer's fields through unchanged.
//!
//! The crate provides:
//! - The wire-level codec and batch type (`wire`)
//! - Length-framed cache-file helpers (`io`)
//!
//! # Quick Start
//!
//! ```
//! use nodedelta::DeltaBatch;
//!
//! let mut batch = DeltaBatch::new();
//! batch.append(1, 535_060_000, 89_840_000);
//! batch.append(-1, -850_000_000, 0);
//!
//! let bytes = batch.to_bytes();
//! let decoded = DeltaBatch::from_bytes(&bytes).unwrap();
//! assert_eq!(decoded, batch);
//! ```

pub mod io;
pub mod wire;

pub use wire::{DecodeError, DeltaBatch, UnknownFields};
