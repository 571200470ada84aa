// Wire format for node coordinate delta batches.
//
// A batch is a protobuf-style message of three packed, zig-zag varint
// columns plus an opaque trailer for fields this schema version does not
// know about:
//
//   field 1  ids   packed sint64
//   field 2  lats  packed sint32
//   field 3  lons  packed sint32
//
// # Modules
//
// - `varint`  — Base-128 varints (LSB-first) and zig-zag mapping
// - `tag`     — Field tags and wire types
// - `packed`  — Length-delimited packed field encoding/decoding
// - `unknown` — Verbatim capture of unrecognized fields
// - `batch`   — The delta record batch and its stream codec

use std::io;

use thiserror::Error;

pub mod batch;
pub mod packed;
pub mod tag;
pub mod unknown;
pub mod varint;

// Re-export key types for convenience.
pub use batch::DeltaBatch;
pub use tag::{Tag, WireType};
pub use unknown::UnknownFields;
pub use varint::VarintError;

/// Nested unknown groups deeper than this are treated as hostile input.
pub const MAX_GROUP_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Decode error
// ---------------------------------------------------------------------------

/// Error raised while decoding a batch from untrusted bytes.
///
/// Unknown field numbers are never an error; they land in the batch's
/// trailer. Encoding itself cannot fail except through the caller's writer,
/// which surfaces as a plain `io::Error` from the encode call.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A varint never terminated within the input, or exceeded the maximum
    /// byte count for its integer width.
    #[error("malformed varint: {0}")]
    MalformedVarint(#[from] VarintError),

    /// A packed field announced more payload than the stream holds, or an
    /// element ran past the payload boundary.
    #[error("truncated packed field: {declared} payload bytes declared, {available} available")]
    TruncatedPacked { declared: u64, available: u64 },

    /// A tag with field number zero, a reserved wire type, or an end-group
    /// tag that does not match the innermost open group.
    #[error("invalid field tag {tag:#x}")]
    InvalidTag { tag: u32 },

    /// Unknown groups nested past [`MAX_GROUP_DEPTH`].
    #[error("unknown group nesting exceeds the depth limit")]
    RecursionLimit,

    /// The underlying reader failed for a reason other than end of input.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
