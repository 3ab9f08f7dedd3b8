#![no_main]

use ctxlz::{compress, decompress, max_compressed_size, DecoderResult, EncoderMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First two bytes pick the parameters
    let quality = (data[0] % 12) as u32;
    let window_bits = 10 + (data[1] % 15) as u32;
    let mode = EncoderMode::from_raw((data[0] / 12 % 3) as i32);
    let payload = &data[2..];

    let compressed = compress(quality, window_bits, mode, payload).unwrap();
    assert!(compressed.len() <= max_compressed_size(payload.len()));

    let (status, output) = decompress(&compressed, payload.len());
    assert_eq!(status, DecoderResult::Success);
    assert_eq!(output, payload);
});
