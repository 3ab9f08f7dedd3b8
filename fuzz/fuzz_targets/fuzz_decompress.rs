#![no_main]

use ctxlz::{decompress, Decoder, DecoderResult};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding may fail on invalid input - that's OK
    // We're looking for panics and overruns, not errors
    let capacity = 1 << 20;
    let (_, output) = decompress(data, capacity);
    assert!(output.len() <= capacity);

    // Byte-at-a-time input must produce the same bytes as the one-shot call
    let mut decoder = Decoder::new();
    let mut streamed = Vec::new();
    for end in 1..=data.len().min(4096) {
        if decoder.decode(&data[..end], &mut streamed, capacity) != DecoderResult::NeedsMoreInput {
            break;
        }
    }
    let common = streamed.len().min(output.len());
    assert_eq!(streamed[..common], output[..common]);
});
