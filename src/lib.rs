//! Lossless context-modeling LZ77 compressor with a one-shot API.
//!
//! ```
//! let data = b"an example, an example, an example".to_vec();
//! let packed = ctxlz::compress(9, 22, ctxlz::EncoderMode::Text, &data).unwrap();
//! let (status, unpacked) = ctxlz::decompress(&packed, data.len());
//! assert_eq!(status, ctxlz::DecoderResult::Success);
//! assert_eq!(unpacked, data);
//! ```

pub mod bits;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod huffman;
pub mod window;

pub use decoder::{Decoder, DecoderResult};
pub use error::{Error, Result};
pub use format::ContextMode;

use format::{MAX_WINDOW_BITS, MIN_WINDOW_BITS};

pub const MIN_QUALITY: u32 = 0;
pub const MAX_QUALITY: u32 = 11;

pub const DEFAULT_QUALITY: u32 = 11;
pub const DEFAULT_WINDOW_BITS: u32 = 22;
pub const DEFAULT_MODE: EncoderMode = EncoderMode::Generic;

/// Hint about the kind of input, used to bias modeling heuristics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum EncoderMode {
    #[default]
    Generic = 0,
    /// UTF-8 text
    Text = 1,
    /// Font data and other signed binary tables
    Font = 2,
}

impl EncoderMode {
    /// Create from the numeric mode value; unknown values fall back to `Generic`
    pub fn from_raw(value: i32) -> Self {
        match value {
            1 => Self::Text,
            2 => Self::Font,
            _ => Self::Generic,
        }
    }

    pub fn as_raw(&self) -> i32 {
        *self as i32
    }

    /// Context modes worth trying for this input kind
    pub fn context_modes(&self, settings: &QualitySettings) -> &'static [ContextMode] {
        match self {
            Self::Text => &[ContextMode::Utf8],
            Self::Font => &[ContextMode::Signed],
            Self::Generic if settings.search_context_modes => &ContextMode::ALL,
            Self::Generic => &[ContextMode::Lsb6],
        }
    }
}

/// How the input is partitioned into meta-blocks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Maximum-size chunks only
    Fixed,
    /// Best of 1, 2 or 4 equal parts by estimated cost
    Candidates,
    /// Many small blocks merged greedily while merging saves bits
    GreedyMerge,
}

/// Search and modeling effort derived from a quality level
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualitySettings {
    /// Hash chain entries probed per position
    pub chain_depth: usize,
    /// How many times a match may be deferred for a better one
    pub lazy_steps: u32,
    /// log2 of the hash table size
    pub hash_bits: u32,
    /// Stop searching once a match this long is found
    pub nice_length: usize,
    /// Probe the four recent distances before the hash chain
    pub check_recent_distances: bool,
    /// Index every position covered by a match (otherwise only its ends)
    pub index_whole_matches: bool,
    /// Advance faster through input where no matches are found
    pub skip_incompressible: bool,
    /// Budget of literal prefix codes per meta-block
    pub max_literal_trees: usize,
    /// Budget of distance prefix codes per meta-block
    pub max_distance_trees: usize,
    /// Try every context mode for generic input
    pub search_context_modes: bool,
    pub split: SplitStrategy,
}

impl QualitySettings {
    /// Settings for `quality`, clamped to 0..=11
    pub fn for_quality(quality: u32) -> Self {
        use SplitStrategy::*;
        #[rustfmt::skip]
        let (chain_depth, lazy_steps, hash_bits, nice_length, max_literal_trees, max_distance_trees, split) =
            match quality.min(MAX_QUALITY) {
                0 => (1, 0, 14, 32, 1, 1, Fixed),
                1 => (2, 0, 14, 32, 1, 1, Fixed),
                2 => (4, 0, 15, 64, 2, 1, Fixed),
                3 => (8, 0, 15, 64, 4, 1, Fixed),
                4 => (16, 1, 15, 128, 8, 1, Candidates),
                5 => (32, 1, 16, 128, 16, 2, Candidates),
                6 => (64, 1, 16, 256, 16, 4, Candidates),
                7 => (128, 1, 16, 256, 32, 4, Candidates),
                8 => (256, 1, 16, 512, 32, 4, Candidates),
                9 => (512, 1, 17, 512, 64, 4, Candidates),
                10 => (1024, 2, 17, 1024, 64, 4, GreedyMerge),
                _ => (4096, 2, 17, 2048, 64, 4, GreedyMerge),
            };
        Self {
            chain_depth,
            lazy_steps,
            hash_bits,
            nice_length,
            check_recent_distances: quality >= 2,
            index_whole_matches: quality >= 4,
            skip_incompressible: quality <= 3,
            max_literal_trees,
            max_distance_trees,
            search_context_modes: quality >= 5,
            split,
        }
    }
}

/// Parameters for one compression call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderParams {
    /// Effort level (0-11)
    pub quality: u32,
    /// log2 of the back-reference window (10-24)
    pub window_bits: u32,
    pub mode: EncoderMode,
}

impl EncoderParams {
    pub fn new(quality: u32, window_bits: u32, mode: EncoderMode) -> Result<Self> {
        let params = Self { quality, window_bits, mode };
        params.validate()?;
        Ok(params)
    }

    /// Check ranges before any work is done
    pub fn validate(&self) -> Result<()> {
        if self.quality > MAX_QUALITY {
            return Err(Error::invalid_parameter(
                "quality",
                self.quality as i64,
                MIN_QUALITY as i64,
                MAX_QUALITY as i64,
            ));
        }
        if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&self.window_bits) {
            return Err(Error::invalid_parameter(
                "window_bits",
                self.window_bits as i64,
                MIN_WINDOW_BITS as i64,
                MAX_WINDOW_BITS as i64,
            ));
        }
        Ok(())
    }

    pub fn settings(&self) -> QualitySettings {
        QualitySettings::for_quality(self.quality)
    }
}

impl Default for EncoderParams {
    fn default() -> Self {
        Self { quality: DEFAULT_QUALITY, window_bits: DEFAULT_WINDOW_BITS, mode: DEFAULT_MODE }
    }
}

/// Upper bound on the compressed size of `input_len` bytes, for any parameters
pub fn max_compressed_size(input_len: usize) -> usize {
    input_len + (input_len >> 14) + 13
}

/// Compress `input` in one call
pub fn compress(quality: u32, window_bits: u32, mode: EncoderMode, input: &[u8]) -> Result<Vec<u8>> {
    compress_with(&EncoderParams { quality, window_bits, mode }, input)
}

/// Compress `input` with explicit parameters
pub fn compress_with(params: &EncoderParams, input: &[u8]) -> Result<Vec<u8>> {
    params.validate()?;
    if input.len() > u32::MAX as usize {
        return Err(Error::invalid_parameter("input length", input.len() as i64, 0, u32::MAX as i64));
    }
    Ok(encoder::compress_stream(params, input))
}

/// Compress `input` into `output`, returning the encoded length
///
/// Fails with `OutputBufferTooSmall` when the stream does not fit; a buffer
/// of `max_compressed_size(input.len())` bytes always suffices.
pub fn compress_into(params: &EncoderParams, input: &[u8], output: &mut [u8]) -> Result<usize> {
    let encoded = compress_with(params, input)?;
    if encoded.len() > output.len() {
        return Err(Error::OutputBufferTooSmall { needed: encoded.len(), available: output.len() });
    }
    output[..encoded.len()].copy_from_slice(&encoded);
    Ok(encoded.len())
}

/// Decompress a complete stream, producing at most `output_capacity` bytes
///
/// On anything but `Success` the returned bytes are the prefix decoded so far.
pub fn decompress(input: &[u8], output_capacity: usize) -> (DecoderResult, Vec<u8>) {
    let mut decoder = Decoder::new();
    let mut output = Vec::new();
    let status = decoder.decode(input, &mut output, output_capacity);
    (status, output)
}

/// Decompress into a caller-provided buffer, returning the status and bytes written
pub fn decompress_into(input: &[u8], output: &mut [u8]) -> (DecoderResult, usize) {
    let (status, decoded) = decompress(input, output.len());
    output[..decoded.len()].copy_from_slice(&decoded);
    (status, decoded.len())
}

/// Decompress, turning every non-success status into an `Error`
pub fn try_decompress(input: &[u8], output_capacity: usize) -> Result<Vec<u8>> {
    let mut decoder = Decoder::new();
    let mut output = Vec::new();
    match decoder.decode(input, &mut output, output_capacity) {
        DecoderResult::Success => Ok(output),
        DecoderResult::NeedsMoreInput => Err(Error::InsufficientInput),
        DecoderResult::NeedsMoreOutput => Err(Error::OutputBufferTooSmall {
            needed: output_capacity + 1,
            available: output_capacity,
        }),
        DecoderResult::Error => {
            Err(decoder.last_error().cloned().unwrap_or_else(|| Error::Internal("decoder failed".into())))
        }
    }
}
