// Base-128 variable-length integer encoding, least-significant group first.
//
// Each byte carries 7 payload bits; bit 7 is set on every byte except the
// last. Signed values go through the zig-zag mapping first so that small
// magnitudes (positive or negative) stay short on the wire.

use std::io::{self, Read, Write};

use thiserror::Error;

use super::DecodeError;

/// Maximum encoded length for a 64-bit value (ceil(64/7) = 10).
pub const MAX_VARINT64_LEN: usize = 10;

/// Maximum encoded length for a 32-bit value (ceil(32/7) = 5).
pub const MAX_VARINT32_LEN: usize = 5;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarintError {
    /// The continuation-bit chain ran past the end of the input.
    #[error("varint truncated before its terminating byte")]
    Truncated,
    /// More bytes than the integer width allows, or final-byte bits that do
    /// not fit the width.
    #[error("varint exceeds the maximum length for its integer width")]
    Overlong,
}

// ---------------------------------------------------------------------------
// Zig-zag mapping
// ---------------------------------------------------------------------------

/// Map a signed 64-bit value to unsigned: `(n << 1) ^ (n >> 63)`.
#[inline]
pub fn zigzag64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag64`].
#[inline]
pub fn unzigzag64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Map a signed 32-bit value to unsigned: `(n << 1) ^ (n >> 31)`.
#[inline]
pub fn zigzag32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse of [`zigzag32`].
#[inline]
pub fn unzigzag32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a `u64` into `buf`, least-significant group first.
/// Returns the number of bytes written (1..=10).
#[inline]
pub fn encode_u64(mut num: u64, buf: &mut [u8; MAX_VARINT64_LEN]) -> usize {
    let mut i = 0;
    while num >= 0x80 {
        buf[i] = (num as u8 & 0x7F) | 0x80;
        num >>= 7;
        i += 1;
    }
    buf[i] = num as u8;
    i + 1
}

/// Encode a `u64` and write it to a `Write` sink.
pub fn write_u64<W: Write>(w: &mut W, num: u64) -> io::Result<()> {
    let mut buf = [0u8; MAX_VARINT64_LEN];
    let len = encode_u64(num, &mut buf);
    w.write_all(&buf[..len])
}

/// Encode a `u32` and write it to a `Write` sink.
pub fn write_u32<W: Write>(w: &mut W, num: u32) -> io::Result<()> {
    write_u64(w, u64::from(num))
}

/// Zig-zag a signed 64-bit value and write it.
pub fn write_sint64<W: Write>(w: &mut W, num: i64) -> io::Result<()> {
    write_u64(w, zigzag64(num))
}

/// Zig-zag a signed 32-bit value and write it.
pub fn write_sint32<W: Write>(w: &mut W, num: i32) -> io::Result<()> {
    write_u64(w, u64::from(zigzag32(num)))
}

// ---------------------------------------------------------------------------
// Decoding from byte slices
// ---------------------------------------------------------------------------

/// Decode a `u64` from the front of a byte slice.
/// Returns `(value, bytes_consumed)` or an error.
pub fn read_u64(data: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut val: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if i >= MAX_VARINT64_LEN {
            return Err(VarintError::Overlong);
        }
        // The tenth byte may only contribute the single remaining bit.
        if i == MAX_VARINT64_LEN - 1 && byte & 0x7F > 0x01 {
            return Err(VarintError::Overlong);
        }
        val |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    Err(VarintError::Truncated)
}

/// Decode a `u32` from the front of a byte slice.
pub fn read_u32(data: &[u8]) -> Result<(u32, usize), VarintError> {
    let mut val: u32 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if i >= MAX_VARINT32_LEN {
            return Err(VarintError::Overlong);
        }
        // The fifth byte may only contribute the remaining four bits.
        if i == MAX_VARINT32_LEN - 1 && byte & 0x7F > 0x0F {
            return Err(VarintError::Overlong);
        }
        val |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    Err(VarintError::Truncated)
}

// ---------------------------------------------------------------------------
// Decoding from `Read` (streaming)
// ---------------------------------------------------------------------------

// End of input mid-varint is a parse failure; any other reader failure is
// surfaced as I/O so the caller can tell corrupt data from a broken reader.
fn next_byte<R: Read>(r: &mut R) -> Result<u8, DecodeError> {
    let mut buf = [0u8; 1];
    match r.read_exact(&mut buf) {
        Ok(()) => Ok(buf[0]),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(DecodeError::MalformedVarint(VarintError::Truncated))
        }
        Err(e) => Err(DecodeError::Io(e)),
    }
}

/// Read a `u64` varint from a streaming source.
pub fn stream_read_u64<R: Read>(r: &mut R) -> Result<u64, DecodeError> {
    let mut val: u64 = 0;
    for i in 0..MAX_VARINT64_LEN {
        let byte = next_byte(r)?;
        if i == MAX_VARINT64_LEN - 1 && byte & 0x7F > 0x01 {
            return Err(VarintError::Overlong.into());
        }
        val |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(val);
        }
    }
    Err(VarintError::Overlong.into())
}

/// Read a `u32` varint from a streaming source.
pub fn stream_read_u32<R: Read>(r: &mut R) -> Result<u32, DecodeError> {
    let first = next_byte(r)?;
    stream_read_u32_cont(r, first)
}

/// Continue a `u64` varint whose first byte has already been consumed.
/// Lets callers treat end-of-input at a frame boundary as a clean stop
/// while still parsing the rest of the length strictly.
pub fn stream_read_u64_cont<R: Read>(r: &mut R, first: u8) -> Result<u64, DecodeError> {
    let mut val = u64::from(first & 0x7F);
    if first & 0x80 == 0 {
        return Ok(val);
    }
    for i in 1..MAX_VARINT64_LEN {
        let byte = next_byte(r)?;
        if i == MAX_VARINT64_LEN - 1 && byte & 0x7F > 0x01 {
            return Err(VarintError::Overlong.into());
        }
        val |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(val);
        }
    }
    Err(VarintError::Overlong.into())
}

/// Continue a `u32` varint whose first byte has already been consumed.
/// Lets callers treat end-of-input at a record boundary as a clean stop
/// while still parsing the rest of the tag strictly.
pub fn stream_read_u32_cont<R: Read>(r: &mut R, first: u8) -> Result<u32, DecodeError> {
    let mut val = u32::from(first & 0x7F);
    if first & 0x80 == 0 {
        return Ok(val);
    }
    for i in 1..MAX_VARINT32_LEN {
        let byte = next_byte(r)?;
        if i == MAX_VARINT32_LEN - 1 && byte & 0x7F > 0x0F {
            return Err(VarintError::Overlong.into());
        }
        val |= u32::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(val);
        }
    }
    Err(VarintError::Overlong.into())
}

/// Like [`stream_read_u64`], but also appends the exact bytes consumed to
/// `out`. Non-minimal encodings are preserved verbatim, which is what the
/// unknown-field trailer needs.
pub fn stream_copy_u64<R: Read>(r: &mut R, out: &mut Vec<u8>) -> Result<u64, DecodeError> {
    let mut val: u64 = 0;
    for i in 0..MAX_VARINT64_LEN {
        let byte = next_byte(r)?;
        if i == MAX_VARINT64_LEN - 1 && byte & 0x7F > 0x01 {
            return Err(VarintError::Overlong.into());
        }
        out.push(byte);
        val |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(val);
        }
    }
    Err(VarintError::Overlong.into())
}

// ---------------------------------------------------------------------------
// Encoded-length computation
// ---------------------------------------------------------------------------

/// Encoded byte-length of a `u64` value, without encoding it.
#[inline]
pub fn sizeof_u64(num: u64) -> usize {
    let bits = 64 - num.leading_zeros();
    bits.max(1).div_ceil(7) as usize
}

/// Encoded byte-length of a `u32` value.
#[inline]
pub fn sizeof_u32(num: u32) -> usize {
    sizeof_u64(u64::from(num))
}

/// Encoded byte-length of a zig-zagged signed 64-bit value.
#[inline]
pub fn sizeof_sint64(num: i64) -> usize {
    sizeof_u64(zigzag64(num))
}

/// Encoded byte-length of a zig-zagged signed 32-bit value.
#[inline]
pub fn sizeof_sint32(num: i32) -> usize {
    sizeof_u64(u64::from(zigzag32(num)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
