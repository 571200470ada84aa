#![no_main]
use libfuzzer_sys::fuzz_target;
use nodedelta::io::FrameReader;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a cache file: frames must decode or error, never
    // panic, and never loop past the input.
    let mut reader = FrameReader::new(data);
    loop {
        match reader.read_batch() {
            Ok(Some(_)) => continue,
            Ok(None) | Err(_) => break,
        }
    }
});
