// Length-delimited packed field encoding/decoding.
//
// A packed field is one tag, one payload-length varint, then the elements'
// varints back to back with no per-element overhead. Length framing forces
// the measure-then-write discipline: the payload size must be known before
// the first payload byte is emitted.
//
// The non-packed legacy form (one tagged varint per element, same field
// number) is accepted on decode so that both historical and current
// producers parse into the same logical sequence.

use std::io::{self, Read, Write};

use super::tag::{Tag, WireType};
use super::varint;
use super::{DecodeError, VarintError};

// ---------------------------------------------------------------------------
// Payload measurement
// ---------------------------------------------------------------------------

/// Total payload byte-length of a packed sint64 sequence.
pub fn packed_sint64_payload_size(values: &[i64]) -> usize {
    values.iter().map(|&v| varint::sizeof_sint64(v)).sum()
}

/// Total payload byte-length of a packed sint32 sequence.
pub fn packed_sint32_payload_size(values: &[i32]) -> usize {
    values.iter().map(|&v| varint::sizeof_sint32(v)).sum()
}

/// Framed size of a packed field: tag + length prefix + payload. Empty
/// sequences occupy zero bytes because the field is omitted entirely.
pub fn packed_field_size(field: u32, payload_size: usize) -> usize {
    if payload_size == 0 {
        return 0;
    }
    Tag::new(field, WireType::LengthDelimited).encoded_len()
        + varint::sizeof_u64(payload_size as u64)
        + payload_size
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Write a packed sint64 field. `payload_size` must be the value computed
/// by [`packed_sint64_payload_size`] for `values`. Writes nothing when the
/// sequence is empty.
pub fn write_packed_sint64<W: Write>(
    w: &mut W,
    field: u32,
    values: &[i64],
    payload_size: usize,
) -> io::Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    Tag::new(field, WireType::LengthDelimited).write_to(w)?;
    varint::write_u64(w, payload_size as u64)?;
    for &v in values {
        varint::write_sint64(w, v)?;
    }
    Ok(())
}

/// Write a packed sint32 field. Same contract as [`write_packed_sint64`].
pub fn write_packed_sint32<W: Write>(
    w: &mut W,
    field: u32,
    values: &[i32],
    payload_size: usize,
) -> io::Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    Tag::new(field, WireType::LengthDelimited).write_to(w)?;
    varint::write_u64(w, payload_size as u64)?;
    for &v in values {
        varint::write_sint32(w, v)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

// Read exactly the announced payload. `take` + `read_to_end` keeps the
// allocation bounded by the bytes actually present rather than the
// untrusted declared length.
fn read_payload<R: Read>(r: &mut R, declared: u64) -> Result<Vec<u8>, DecodeError> {
    let mut payload = Vec::new();
    let got = r.take(declared).read_to_end(&mut payload)?;
    if (got as u64) < declared {
        return Err(DecodeError::TruncatedPacked {
            declared,
            available: got as u64,
        });
    }
    Ok(payload)
}

// An element whose continuation chain runs off the payload end crossed the
// packed boundary; an overlong element is malformed in its own right.
fn element_error(declared: u64, offset: usize, e: VarintError) -> DecodeError {
    match e {
        VarintError::Truncated => DecodeError::TruncatedPacked {
            declared,
            available: offset as u64,
        },
        VarintError::Overlong => DecodeError::MalformedVarint(e),
    }
}

/// Decode a packed sint64 payload (length prefix already positioned at the
/// reader), appending each element to `out`.
pub fn read_packed_sint64<R: Read>(r: &mut R, out: &mut Vec<i64>) -> Result<(), DecodeError> {
    let declared = varint::stream_read_u64(r)?;
    let payload = read_payload(r, declared)?;
    let mut offset = 0;
    while offset < payload.len() {
        let (raw, n) = varint::read_u64(&payload[offset..])
            .map_err(|e| element_error(declared, offset, e))?;
        out.push(varint::unzigzag64(raw));
        offset += n;
    }
    Ok(())
}

/// Decode a packed sint32 payload, appending each element to `out`.
pub fn read_packed_sint32<R: Read>(r: &mut R, out: &mut Vec<i32>) -> Result<(), DecodeError> {
    let declared = varint::stream_read_u64(r)?;
    let payload = read_payload(r, declared)?;
    let mut offset = 0;
    while offset < payload.len() {
        let (raw, n) = varint::read_u32(&payload[offset..])
            .map_err(|e| element_error(declared, offset, e))?;
        out.push(varint::unzigzag32(raw));
        offset += n;
    }
    Ok(())
}

/// Decode one legacy non-packed sint64 element (wire type Varint).
pub fn read_sint64<R: Read>(r: &mut R) -> Result<i64, DecodeError> {
    Ok(varint::unzigzag64(varint::stream_read_u64(r)?))
}

/// Decode one legacy non-packed sint32 element (wire type Varint).
pub fn read_sint32<R: Read>(r: &mut R) -> Result<i32, DecodeError> {
    let raw = varint::stream_read_u64(r)?;
    let raw = u32::try_from(raw).map_err(|_| DecodeError::MalformedVarint(VarintError::Overlong))?;
    Ok(varint::unzigzag32(raw))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
