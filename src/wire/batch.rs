// The delta record batch and its stream codec.
//
// A batch carries three positionally-aligned columns (node id, latitude,
// longitude) plus the unknown-field trailer. Serialization is two-pass:
// packed fields are length-delimited, so every payload is measured before
// any of its bytes are written. The measured sizes are memoized until the
// next mutation so that a size query followed by serialization measures
// each column once.

use std::io::{self, Read, Write};
use std::mem;

use super::packed;
use super::tag::{WireType, read_tag};
use super::unknown::UnknownFields;
use super::DecodeError;

/// Field number of the node identifier column (packed sint64).
pub const FIELD_IDS: u32 = 1;
/// Field number of the latitude column (packed sint32).
pub const FIELD_LATS: u32 = 2;
/// Field number of the longitude column (packed sint32).
pub const FIELD_LONS: u32 = 3;

// ---------------------------------------------------------------------------
// Memoized sizes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EncodedSizes {
    ids_payload: usize,
    lats_payload: usize,
    lons_payload: usize,
    total: usize,
}

// ---------------------------------------------------------------------------
// DeltaBatch
// ---------------------------------------------------------------------------

/// A batch of node coordinate delta records.
///
/// The three columns are independent packed fields on the wire; a
/// well-formed batch keeps them the same length, with index *i* across all
/// three describing one record. The codec does not enforce that equality:
/// it transports whatever it is given, and tolerates mismatches while a
/// stream is still being merged in.
#[derive(Debug, Clone, Default)]
pub struct DeltaBatch {
    ids: Vec<i64>,
    lats: Vec<i32>,
    lons: Vec<i32>,
    unknown: UnknownFields,
    // Valid only while the contents are untouched since the last
    // measurement.
    sizes: Option<EncodedSizes>,
}

impl PartialEq for DeltaBatch {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
            && self.lats == other.lats
            && self.lons == other.lons
            && self.unknown == other.unknown
    }
}

impl Eq for DeltaBatch {}

impl DeltaBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, taken from the id column.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when the batch holds no records and no trailer bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.lats.is_empty() && self.lons.is_empty() && self.unknown.is_empty()
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn lats(&self) -> &[i32] {
        &self.lats
    }

    pub fn lons(&self) -> &[i32] {
        &self.lons
    }

    /// The preserved bytes of fields this schema version does not know.
    pub fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    /// Iterate positionally-aligned `(id, lat, lon)` records.
    pub fn iter(&self) -> impl Iterator<Item = (i64, i32, i32)> + '_ {
        self.ids
            .iter()
            .zip(&self.lats)
            .zip(&self.lons)
            .map(|((&id, &lat), &lon)| (id, lat, lon))
    }

    /// Append one record. No range validation; lat/lon units are the
    /// caller's concern.
    pub fn append(&mut self, id: i64, lat: i32, lon: i32) {
        self.ids.push(id);
        self.lats.push(lat);
        self.lons.push(lon);
        self.sizes = None;
    }

    /// Append to the id column alone. The columns are independent fields on
    /// the wire; callers growing them separately are responsible for ending
    /// up with aligned lengths.
    pub fn push_id(&mut self, id: i64) {
        self.ids.push(id);
        self.sizes = None;
    }

    /// Append to the latitude column alone.
    pub fn push_lat(&mut self, lat: i32) {
        self.lats.push(lat);
        self.sizes = None;
    }

    /// Append to the longitude column alone.
    pub fn push_lon(&mut self, lon: i32) {
        self.lons.push(lon);
        self.sizes = None;
    }

    /// Empty all columns and the trailer.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.lats.clear();
        self.lons.clear();
        self.unknown.clear();
        self.sizes = Some(EncodedSizes::default());
    }

    /// Concatenate `other`'s columns after this batch's, and `other`'s
    /// trailer after this trailer. Never reorders and never deduplicates:
    /// two updates for the same node id both survive, and last-wins
    /// resolution belongs to whoever applies the batch.
    pub fn merge_from(&mut self, other: &Self) {
        self.ids.extend_from_slice(&other.ids);
        self.lats.extend_from_slice(&other.lats);
        self.lons.extend_from_slice(&other.lons);
        self.unknown.merge_from(&other.unknown);
        self.sizes = None;
    }

    /// Exchange contents with another batch.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    fn encoded_sizes(&mut self) -> EncodedSizes {
        if let Some(sizes) = self.sizes {
            return sizes;
        }
        let ids_payload = packed::packed_sint64_payload_size(&self.ids);
        let lats_payload = packed::packed_sint32_payload_size(&self.lats);
        let lons_payload = packed::packed_sint32_payload_size(&self.lons);
        let total = packed::packed_field_size(FIELD_IDS, ids_payload)
            + packed::packed_field_size(FIELD_LATS, lats_payload)
            + packed::packed_field_size(FIELD_LONS, lons_payload)
            + self.unknown.len();
        let sizes = EncodedSizes {
            ids_payload,
            lats_payload,
            lons_payload,
            total,
        };
        self.sizes = Some(sizes);
        sizes
    }

    /// Total byte-length the batch occupies when serialized now. The result
    /// is memoized until the next mutation.
    pub fn compute_size(&mut self) -> usize {
        self.encoded_sizes().total
    }

    /// Serialize in field-number order: ids, lats, lons, then the trailer
    /// verbatim. Empty columns are omitted entirely. The only failure mode
    /// is the writer's own error, propagated unchanged.
    pub fn serialize_to<W: Write>(&mut self, w: &mut W) -> io::Result<()> {
        let sizes = self.encoded_sizes();
        packed::write_packed_sint64(w, FIELD_IDS, &self.ids, sizes.ids_payload)?;
        packed::write_packed_sint32(w, FIELD_LATS, &self.lats, sizes.lats_payload)?;
        packed::write_packed_sint32(w, FIELD_LONS, &self.lons, sizes.lons_payload)?;
        self.unknown.write_to(w)
    }

    /// Serialize to a fresh byte vector.
    pub fn to_bytes(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.compute_size());
        self.serialize_to(&mut out)
            .expect("writing to a Vec cannot fail");
        out
    }

    /// Decode from a streaming source, merging into this batch.
    ///
    /// Fields may arrive in any order or be absent. Each column accepts the
    /// packed form and the legacy per-element form. Tags this schema does
    /// not recognize (other field numbers, or fields 1-3 under an
    /// unexpected wire type) are captured into the trailer. The loop ends
    /// on clean end of input, or on a top-level end-group tag closing an
    /// enclosing message.
    pub fn deserialize_from<R: Read>(&mut self, r: &mut R) -> Result<(), DecodeError> {
        self.sizes = None;
        while let Some(tag) = read_tag(r)? {
            match (tag.field, tag.wire) {
                (FIELD_IDS, WireType::LengthDelimited) => {
                    packed::read_packed_sint64(r, &mut self.ids)?;
                }
                (FIELD_IDS, WireType::Varint) => {
                    self.ids.push(packed::read_sint64(r)?);
                }
                (FIELD_LATS, WireType::LengthDelimited) => {
                    packed::read_packed_sint32(r, &mut self.lats)?;
                }
                (FIELD_LATS, WireType::Varint) => {
                    self.lats.push(packed::read_sint32(r)?);
                }
                (FIELD_LONS, WireType::LengthDelimited) => {
                    packed::read_packed_sint32(r, &mut self.lons)?;
                }
                (FIELD_LONS, WireType::Varint) => {
                    self.lons.push(packed::read_sint32(r)?);
                }
                (_, WireType::EndGroup) => break,
                _ => self.unknown.capture(tag, r)?,
            }
        }
        Ok(())
    }

    /// Decode a fresh batch from a streaming source.
    pub fn decode_from<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
        let mut batch = Self::new();
        batch.deserialize_from(r)?;
        Ok(batch)
    }

    /// Decode a fresh batch from a byte slice.
    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_from(&mut bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
