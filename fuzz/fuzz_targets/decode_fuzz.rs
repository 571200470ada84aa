#![no_main]
use libfuzzer_sys::fuzz_target;
use nodedelta::DeltaBatch;

fuzz_target!(|data: &[u8]| {
    // Fuzz the decoder with arbitrary bytes.
    // The decoder must never panic — only return errors.
    let Ok(mut batch) = DeltaBatch::from_bytes(data) else {
        return;
    };

    // Whatever decoded must survive a reserialization cycle, unknown
    // trailer included.
    let bytes = batch.to_bytes();
    assert_eq!(bytes.len(), batch.compute_size());
    let again = DeltaBatch::from_bytes(&bytes).unwrap();
    assert_eq!(again, batch);
});
