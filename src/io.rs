// File-level I/O helpers for the batch codec.
//
// A cache file is a concatenation of independently length-framed batches:
// a varint frame length, then the batch bytes, repeated. There is no outer
// container header, so appending a new batch to an existing file never
// rewrites prior content. Clean end of input is only recognized at a frame
// boundary.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;

use crate::wire::{DecodeError, DeltaBatch, varint};

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// FrameWriter
// ---------------------------------------------------------------------------

/// Writes length-framed batches to a byte sink.
#[derive(Debug)]
pub struct FrameWriter<W: Write> {
    inner: W,
    frames: u64,
    bytes: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            frames: 0,
            bytes: 0,
        }
    }

    /// Write one batch as a frame: varint length, then the batch bytes.
    /// Returns the framed size. The batch is borrowed mutably for the size
    /// memoization its serializer relies on.
    pub fn write_batch(&mut self, batch: &mut DeltaBatch) -> io::Result<usize> {
        let size = batch.compute_size();
        varint::write_u64(&mut self.inner, size as u64)?;
        batch.serialize_to(&mut self.inner)?;
        let framed = varint::sizeof_u64(size as u64) + size;
        self.frames += 1;
        self.bytes += framed as u64;
        Ok(framed)
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total framed bytes written so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

// ---------------------------------------------------------------------------
// FrameReader
// ---------------------------------------------------------------------------

/// Reads length-framed batches from a byte source.
#[derive(Debug)]
pub struct FrameReader<R: Read> {
    inner: R,
    frames: u64,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, frames: 0 }
    }

    /// Read the next frame into a fresh batch. Returns `None` on clean end
    /// of input at a frame boundary; a frame shorter than its announced
    /// length is corrupt.
    pub fn read_batch(&mut self) -> Result<Option<DeltaBatch>, DecodeError> {
        let mut batch = DeltaBatch::new();
        Ok(self.read_into(&mut batch)?.then_some(batch))
    }

    /// Read the next frame, merging its records into `batch`. Returns
    /// whether a frame was read.
    pub fn read_into(&mut self, batch: &mut DeltaBatch) -> Result<bool, DecodeError> {
        // Frame length; end of input here is the end of the file.
        let mut first = [0u8; 1];
        match self.inner.read_exact(&mut first) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        let declared = varint::stream_read_u64_cont(&mut self.inner, first[0])?;

        let mut payload = Vec::new();
        let got = (&mut self.inner).take(declared).read_to_end(&mut payload)?;
        if (got as u64) < declared {
            return Err(DecodeError::TruncatedPacked {
                declared,
                available: got as u64,
            });
        }

        batch.deserialize_from(&mut &payload[..])?;
        self.frames += 1;
        Ok(true)
    }

    /// Frames read so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Append one batch to the cache file at `path`, creating it if absent.
/// Returns the framed size written.
pub fn append_batch<P: AsRef<Path>>(path: P, batch: &mut DeltaBatch) -> io::Result<usize> {
    let path = path.as_ref();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = FrameWriter::new(BufWriter::with_capacity(BUF_SIZE, file));
    let framed = writer.write_batch(batch)?;
    writer.into_inner()?;
    debug!(
        "appended batch to {}: {} records, {} framed bytes",
        path.display(),
        batch.len(),
        framed
    );
    Ok(framed)
}

/// Replay every frame of the cache file at `path` into one merged batch,
/// the cache-rebuild read path. Records keep file order, so a consumer
/// applying them front to back sees the newest update for a node last.
pub fn replay_path<P: AsRef<Path>>(path: P) -> Result<DeltaBatch, DecodeError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = FrameReader::new(BufReader::with_capacity(BUF_SIZE, file));
    let mut merged = DeltaBatch::new();
    while reader.read_into(&mut merged)? {}
    debug!(
        "replayed {}: {} frames, {} records",
        path.display(),
        reader.frames(),
        merged.len()
    );
    Ok(merged)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
