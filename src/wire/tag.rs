// Field tags and wire types.
//
// A tag is the varint `(field_number << 3) | wire_type` that precedes every
// field on the wire. Field numbers start at 1; wire types 6 and 7 are
// reserved and have no defined extent, so they cannot be skipped over.

use std::io::{self, Read, Write};

use super::varint;
use super::DecodeError;

/// Highest representable field number (29 bits).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// On-wire representation of a field's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    /// Map the low three tag bits to a wire type. Reserved values yield
    /// `None`.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            3 => Some(Self::StartGroup),
            4 => Some(Self::EndGroup),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// A decoded field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub field: u32,
    pub wire: WireType,
}

impl Tag {
    pub fn new(field: u32, wire: WireType) -> Self {
        debug_assert!(field >= 1 && field <= MAX_FIELD_NUMBER);
        Self { field, wire }
    }

    /// The raw varint value of this tag.
    #[inline]
    pub fn raw(self) -> u32 {
        (self.field << 3) | self.wire as u32
    }

    /// Encoded byte-length of this tag.
    #[inline]
    pub fn encoded_len(self) -> usize {
        varint::sizeof_u32(self.raw())
    }

    /// Parse a raw tag varint. Field number 0 and reserved wire types are
    /// rejected.
    pub fn from_raw(raw: u32) -> Result<Self, DecodeError> {
        let field = raw >> 3;
        let wire = WireType::from_bits(raw & 0x7);
        match (field, wire) {
            (0, _) | (_, None) => Err(DecodeError::InvalidTag { tag: raw }),
            (field, Some(wire)) => Ok(Self { field, wire }),
        }
    }

    /// Write this tag to a `Write` sink.
    pub fn write_to<W: Write>(self, w: &mut W) -> io::Result<()> {
        varint::write_u32(w, self.raw())
    }
}

/// Read the next field tag from a streaming source.
///
/// End of input at the first tag byte is the normal end of a message and
/// yields `Ok(None)`; end of input anywhere inside the tag varint is a
/// malformed stream.
pub fn read_tag<R: Read>(r: &mut R) -> Result<Option<Tag>, DecodeError> {
    let mut first = [0u8; 1];
    match r.read_exact(&mut first) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let raw = varint::stream_read_u32_cont(r, first[0])?;
    Tag::from_raw(raw).map(Some)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
