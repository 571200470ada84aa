#![no_main]
use libfuzzer_sys::fuzz_target;
use nodedelta::DeltaBatch;

fuzz_target!(|data: &[u8]| {
    // Interpret the input as raw records and roundtrip them.
    let mut batch = DeltaBatch::new();
    for chunk in data.chunks_exact(16) {
        let id = i64::from_le_bytes(chunk[0..8].try_into().unwrap());
        let lat = i32::from_le_bytes(chunk[8..12].try_into().unwrap());
        let lon = i32::from_le_bytes(chunk[12..16].try_into().unwrap());
        batch.append(id, lat, lon);
    }

    let bytes = batch.to_bytes();
    assert_eq!(bytes.len(), batch.compute_size());
    let decoded = DeltaBatch::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, batch);
});
