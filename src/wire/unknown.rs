// Verbatim capture of fields the current schema does not recognize.
//
// Unknown fields are never an error. Their bytes are preserved in arrival
// order and re-emitted unchanged after the known fields, so data written by
// a newer producer survives a round trip through this consumer.

use std::io::{self, Read, Write};

use super::tag::{Tag, WireType};
use super::varint;
use super::{DecodeError, MAX_GROUP_DEPTH};

/// Raw bytes of every unrecognized field, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownFields {
    bytes: Vec<u8>,
}

impl UnknownFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialized byte-length of the trailer.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The raw trailer bytes as they will be re-emitted.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Append `other`'s trailer after this one's.
    pub fn merge_from(&mut self, other: &Self) {
        self.bytes.extend_from_slice(&other.bytes);
    }

    /// Re-emit the trailer verbatim.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.bytes)
    }

    /// Capture one unrecognized field: the tag, then its body copied
    /// byte-for-byte off the reader.
    pub(crate) fn capture<R: Read>(&mut self, tag: Tag, r: &mut R) -> Result<(), DecodeError> {
        capture_into(&mut self.bytes, tag, r, 0)
    }
}

// Copy exactly `n` body bytes. `take` + `read_to_end` reports how much was
// actually present when the stream falls short.
fn copy_exact<R: Read>(r: &mut R, out: &mut Vec<u8>, n: u64) -> Result<(), DecodeError> {
    let got = r.take(n).read_to_end(out)?;
    if (got as u64) < n {
        return Err(DecodeError::TruncatedPacked {
            declared: n,
            available: got as u64,
        });
    }
    Ok(())
}

fn capture_into<R: Read>(
    out: &mut Vec<u8>,
    tag: Tag,
    r: &mut R,
    depth: usize,
) -> Result<(), DecodeError> {
    tag.write_to(out)?;
    match tag.wire {
        WireType::Varint => {
            varint::stream_copy_u64(r, out)?;
        }
        WireType::Fixed64 => copy_exact(r, out, 8)?,
        WireType::Fixed32 => copy_exact(r, out, 4)?,
        WireType::LengthDelimited => {
            let declared = varint::stream_copy_u64(r, out)?;
            copy_exact(r, out, declared)?;
        }
        WireType::StartGroup => {
            if depth >= MAX_GROUP_DEPTH {
                return Err(DecodeError::RecursionLimit);
            }
            loop {
                // Inside a group, end of input is corruption, not a clean
                // message end, so tags are read strictly here.
                let inner = Tag::from_raw(varint::stream_read_u32(r)?)?;
                if inner.wire == WireType::EndGroup {
                    if inner.field != tag.field {
                        return Err(DecodeError::InvalidTag { tag: inner.raw() });
                    }
                    inner.write_to(out)?;
                    break;
                }
                capture_into(out, inner, r, depth + 1)?;
            }
        }
        // A bare end-group has no body and no matching start: corrupt.
        WireType::EndGroup => return Err(DecodeError::InvalidTag { tag: tag.raw() }),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
