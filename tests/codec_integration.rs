// Integration tests for the batch codec.
//
// These tests verify:
//   - End-to-end roundtrip for assorted batch shapes
//   - Byte-exact empty-field omission
//   - Forward compatibility (unknown fields survive a round trip)
//   - Merge semantics (pure concatenation, associativity)
//   - Decoder robustness against truncated input at every offset

use nodedelta::DeltaBatch;
use nodedelta::wire::DecodeError;
use nodedelta::wire::packed::{packed_field_size, packed_sint32_payload_size, packed_sint64_payload_size};

// ===========================================================================
// Helpers
// ===========================================================================

fn batch_of(records: &[(i64, i32, i32)]) -> DeltaBatch {
    let mut batch = DeltaBatch::new();
    for &(id, lat, lon) in records {
        batch.append(id, lat, lon);
    }
    batch
}

fn roundtrip(batch: &mut DeltaBatch) -> DeltaBatch {
    let bytes = batch.to_bytes();
    let decoded = DeltaBatch::from_bytes(&bytes).unwrap();
    assert_eq!(&decoded, batch, "roundtrip mismatch");
    decoded
}

// ===========================================================================
// Roundtrips
// ===========================================================================

#[test]
fn roundtrip_small_batch() {
    roundtrip(&mut batch_of(&[(1, 2, 3), (-1, -2, -3)]));
}

#[test]
fn roundtrip_extreme_values() {
    roundtrip(&mut batch_of(&[
        (i64::MAX, i32::MAX, i32::MIN),
        (i64::MIN, i32::MIN, i32::MAX),
        (0, 0, 0),
    ]));
}

#[test]
fn roundtrip_large_batch() {
    let mut batch = DeltaBatch::new();
    // Deterministic pseudo-random walk over plausible coordinate deltas.
    let mut state: u64 = 0x2545F4914F6CDD1D;
    let mut id: i64 = 100_000;
    for _ in 0..10_000 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        id += (state % 1000) as i64;
        let lat = (state >> 16) as i32 % 900_000_000;
        let lon = (state >> 24) as i32 % 1_800_000_000;
        batch.append(id, lat, lon);
    }
    roundtrip(&mut batch);
}

#[test]
fn roundtrip_empty_batch() {
    let mut batch = DeltaBatch::new();
    assert!(batch.to_bytes().is_empty());
    roundtrip(&mut batch);
}

// ===========================================================================
// Empty-field omission
// ===========================================================================

#[test]
fn empty_lats_column_has_no_field_2_tag() {
    let mut batch = DeltaBatch::new();
    batch.push_id(1);
    batch.push_id(2);
    batch.push_lon(7);

    let bytes = batch.to_bytes();
    // Field 2's length-delimited tag byte must not appear anywhere.
    assert!(!bytes.contains(&0x12), "unexpected field-2 tag in {bytes:?}");

    let decoded = DeltaBatch::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.ids(), &[1, 2]);
    assert!(decoded.lats().is_empty());
    assert_eq!(decoded.lons(), &[7]);
}

// ===========================================================================
// Forward compatibility
// ===========================================================================

#[test]
fn unknown_field_survives_roundtrip() {
    // Valid fields 1-3 with a field-4 length-delimited payload interleaved.
    let mut bytes = vec![0x0A, 0x01, 0x02]; // ids = [1]
    bytes.extend([0x22, 0x04, 0xDE, 0xAD, 0xBE, 0xEF]); // field 4
    bytes.extend([0x12, 0x01, 0x04]); // lats = [2]
    bytes.extend([0x1A, 0x01, 0x06]); // lons = [3]

    let mut batch = DeltaBatch::from_bytes(&bytes).unwrap();
    assert_eq!(batch.ids(), &[1]);
    assert_eq!(batch.lats(), &[2]);
    assert_eq!(batch.lons(), &[3]);
    assert_eq!(
        batch.unknown_fields().as_bytes(),
        &[0x22, 0x04, 0xDE, 0xAD, 0xBE, 0xEF]
    );

    // Re-serialization emits fields 1-3 first, then the trailer unchanged.
    let reserialized = batch.to_bytes();
    assert_eq!(
        reserialized,
        [
            0x0A, 0x01, 0x02, // ids
            0x12, 0x01, 0x04, // lats
            0x1A, 0x01, 0x06, // lons
            0x22, 0x04, 0xDE, 0xAD, 0xBE, 0xEF, // preserved trailer
        ]
    );

    // And a second consumer sees the same batch again.
    let again = DeltaBatch::from_bytes(&reserialized).unwrap();
    assert_eq!(again, batch);
}

#[test]
fn unknown_fields_from_both_merge_sides_concatenate() {
    let a_bytes = [0x0A, 0x01, 0x02, 0x20, 0x01]; // ids=[1], field 4 varint 1
    let b_bytes = [0x0A, 0x01, 0x04, 0x28, 0x02]; // ids=[2], field 5 varint 2
    let mut a = DeltaBatch::from_bytes(&a_bytes).unwrap();
    let b = DeltaBatch::from_bytes(&b_bytes).unwrap();

    a.merge_from(&b);
    assert_eq!(a.ids(), &[1, 2]);
    assert_eq!(a.unknown_fields().as_bytes(), &[0x20, 0x01, 0x28, 0x02]);
}

// ===========================================================================
// Merge
// ===========================================================================

#[test]
fn merge_is_associative_on_content() {
    let a = batch_of(&[(1, 10, 100)]);
    let b = batch_of(&[(2, 20, 200), (3, 30, 300)]);
    let c = batch_of(&[(4, 40, 400)]);

    // merge(merge(a, b), c)
    let mut left = a.clone();
    left.merge_from(&b);
    left.merge_from(&c);

    // merge(a, merge(b, c))
    let mut bc = b.clone();
    bc.merge_from(&c);
    let mut right = a.clone();
    right.merge_from(&bc);

    assert_eq!(left, right);
    assert_eq!(left.ids(), &[1, 2, 3, 4]);
}

#[test]
fn merge_never_deduplicates() {
    let mut a = batch_of(&[(42, 1, 1)]);
    let b = batch_of(&[(42, 2, 2)]);
    a.merge_from(&b);
    assert_eq!(a.iter().collect::<Vec<_>>(), vec![(42, 1, 1), (42, 2, 2)]);
}

// ===========================================================================
// Truncation detection
// ===========================================================================

#[test]
fn truncation_inside_any_field_fails() {
    let mut batch = batch_of(&[(1, -1, 1_000_000), (-312, 850_000_000, -7)]);
    let bytes = batch.to_bytes();

    // With single-byte tags and length prefixes, the only clean cut points
    // are the field boundaries.
    let ids_len = packed_field_size(1, packed_sint64_payload_size(batch.ids()));
    let lats_len = packed_field_size(2, packed_sint32_payload_size(batch.lats()));
    let lons_len = packed_field_size(3, packed_sint32_payload_size(batch.lons()));
    assert_eq!(ids_len + lats_len + lons_len, bytes.len());
    let boundaries = [0, ids_len, ids_len + lats_len, bytes.len()];

    for cut in 0..bytes.len() {
        let result = DeltaBatch::from_bytes(&bytes[..cut]);
        if boundaries.contains(&cut) {
            let partial = result.unwrap_or_else(|e| panic!("cut at boundary {cut}: {e}"));
            assert!(partial.len() <= batch.len());
        } else {
            let err = result.err().unwrap_or_else(|| panic!("cut {cut} decoded silently"));
            assert!(matches!(
                err,
                DecodeError::TruncatedPacked { .. } | DecodeError::MalformedVarint(_)
            ));
        }
    }
}

#[test]
fn announced_length_past_input_fails() {
    // ids field claiming 100 payload bytes with 1 present.
    let bytes = [0x0A, 0x64, 0x02];
    assert!(matches!(
        DeltaBatch::from_bytes(&bytes),
        Err(DecodeError::TruncatedPacked {
            declared: 100,
            available: 1
        })
    ));
}

// ===========================================================================
// Size scenario
// ===========================================================================

#[test]
fn scenario_batch_beats_fixed_width_encoding() {
    let mut batch = DeltaBatch::new();
    for id in [1i64, -1, 1_000_000] {
        batch.push_id(id);
    }
    for lat in [0i32, -850_000_000] {
        batch.push_lat(lat);
    }
    batch.push_lon(0);

    let size = batch.compute_size();
    let bytes = batch.to_bytes();
    assert_eq!(bytes.len(), size);
    assert_eq!(size, 18);

    // Six values at four fixed bytes each.
    assert!(size < 6 * 4);

    let decoded = DeltaBatch::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.ids(), &[1, -1, 1_000_000]);
    assert_eq!(decoded.lats(), &[0, -850_000_000]);
    assert_eq!(decoded.lons(), &[0]);
}

// ===========================================================================
// Field order independence
// ===========================================================================

#[test]
fn fields_decode_in_any_arrival_order() {
    // lons, then ids, then lats.
    let bytes = [0x1A, 0x01, 0x06, 0x0A, 0x01, 0x02, 0x12, 0x01, 0x04];
    let batch = DeltaBatch::from_bytes(&bytes).unwrap();
    assert_eq!(batch.ids(), &[1]);
    assert_eq!(batch.lats(), &[2]);
    assert_eq!(batch.lons(), &[3]);
}

#[test]
fn repeated_packed_runs_concatenate() {
    // Two packed id runs in one message.
    let bytes = [0x0A, 0x02, 0x02, 0x04, 0x0A, 0x01, 0x06];
    let batch = DeltaBatch::from_bytes(&bytes).unwrap();
    assert_eq!(batch.ids(), &[1, 2, 3]);
}
