//! Property-based tests for ctxlz.
//!
//! - Any input round-trips at any quality, window and mode
//! - Compressed output never exceeds the size bound
//! - Arbitrary bytes never panic the decoder
//! - Feeding a stream in pieces gives the same result as feeding it whole

use proptest::prelude::*;

use ctxlz::{
    compress, decompress, max_compressed_size, Decoder, DecoderResult, EncoderMode, MAX_QUALITY,
};

fn mode_strategy() -> impl Strategy<Value = EncoderMode> {
    prop_oneof![Just(EncoderMode::Generic), Just(EncoderMode::Text), Just(EncoderMode::Font),]
}

/// Bytes drawn from a small alphabet so that matches are common
fn repetitive_strategy() -> impl Strategy<Value = Vec<u8>> {
    (prop::collection::vec(0u8..4, 1..64), 1usize..200).prop_map(|(pattern, repeats)| {
        pattern.iter().cycle().take(pattern.len() * repeats).map(|b| b"acgt"[*b as usize]).collect()
    })
}

fn input_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![prop::collection::vec(any::<u8>(), 0..4096), repetitive_strategy(),]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_roundtrip(
        data in input_strategy(),
        quality in 0u32..=MAX_QUALITY,
        window_bits in 10u32..=24,
        mode in mode_strategy(),
    ) {
        let compressed = compress(quality, window_bits, mode, &data).unwrap();
        prop_assert!(compressed.len() <= max_compressed_size(data.len()));

        let (status, output) = decompress(&compressed, data.len());
        prop_assert_eq!(status, DecoderResult::Success);
        prop_assert_eq!(output, data);
    }

    #[test]
    fn prop_short_capacity_needs_more_output(
        data in prop::collection::vec(any::<u8>(), 1..2048),
        quality in 0u32..=MAX_QUALITY,
        cut in any::<prop::sample::Index>(),
    ) {
        let compressed = compress(quality, 16, EncoderMode::Generic, &data).unwrap();
        let capacity = cut.index(data.len());
        let (status, output) = decompress(&compressed, capacity);
        prop_assert_eq!(status, DecoderResult::NeedsMoreOutput);
        prop_assert!(output.len() <= capacity);
        prop_assert_eq!(&output[..], &data[..output.len()]);
    }

    #[test]
    fn prop_arbitrary_input_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..1024),
        capacity in 0usize..65_536,
    ) {
        let (_, output) = decompress(&data, capacity);
        prop_assert!(output.len() <= capacity);
    }

    #[test]
    fn prop_piecewise_input_matches_whole(
        data in repetitive_strategy(),
        quality in 0u32..=MAX_QUALITY,
        step in 1usize..64,
    ) {
        let compressed = compress(quality, 18, EncoderMode::Text, &data).unwrap();

        let mut decoder = Decoder::new();
        let mut output = Vec::new();
        let mut end = 0;
        let status = loop {
            end = (end + step).min(compressed.len());
            let status = decoder.decode(&compressed[..end], &mut output, data.len());
            if status != DecoderResult::NeedsMoreInput || end == compressed.len() {
                break status;
            }
        };
        prop_assert_eq!(status, DecoderResult::Success);
        prop_assert_eq!(output, data);
    }
}
