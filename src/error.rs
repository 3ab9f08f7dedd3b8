use thiserror::Error;

use crate::decoder::DecoderResult;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Caller errors
    #[error("Invalid {name}: {value} (expected {min}-{max})")]
    InvalidParameter { name: &'static str, value: i64, min: i64, max: i64 },

    #[error("Output buffer too small: need {needed} bytes, have {available}")]
    OutputBufferTooSmall { needed: usize, available: usize },

    // Truncation
    #[error("Unexpected end of input")]
    InsufficientInput,

    // Stream and meta-block header errors
    #[error("Reserved window size code: {0}")]
    InvalidWindowBits(u32),

    #[error("Invalid meta-block length encoding")]
    InvalidMetaBlockLength,

    #[error("Non-zero padding bits before byte boundary")]
    NonZeroPadding,

    // Prefix code errors
    #[error("Invalid prefix code length: {0} (max 15)")]
    InvalidCodeLength(u8),

    #[error("Prefix code oversubscribed: more codes than possible for bit length")]
    HuffmanOversubscribed,

    #[error("Prefix code incomplete: not all codes assigned")]
    HuffmanIncomplete,

    #[error("No prefix code matches the input bits")]
    InvalidCode,

    #[error("Invalid symbol {symbol} for alphabet of size {alphabet_size}")]
    InvalidSymbol { symbol: u32, alphabet_size: usize },

    #[error("Invalid context map: {0}")]
    InvalidContextMap(&'static str),

    // Reconstruction errors
    #[error("Back-reference distance {distance} exceeds available window {available}")]
    InvalidBackReference { distance: usize, available: usize },

    #[error("Command overruns meta-block: {needed} bytes left, command wants {wanted}")]
    MetaBlockOverrun { needed: usize, wanted: usize },

    // Trailer errors
    #[error("CRC32 mismatch: expected 0x{expected:08x}, got 0x{found:08x}")]
    ChecksumMismatch { expected: u32, found: u32 },

    #[error("{0} bytes of trailing data after end of stream")]
    TrailingData(usize),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an `InvalidParameter` for a value outside `min..=max`
    pub fn invalid_parameter(name: &'static str, value: i64, min: i64, max: i64) -> Self {
        Error::InvalidParameter { name, value, min, max }
    }

    /// The decoder status this error is reported as
    pub fn decoder_result(&self) -> DecoderResult {
        match self {
            Error::InsufficientInput => DecoderResult::NeedsMoreInput,
            Error::OutputBufferTooSmall { .. } => DecoderResult::NeedsMoreOutput,
            _ => DecoderResult::Error,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_result_mapping() {
        assert_eq!(Error::InsufficientInput.decoder_result(), DecoderResult::NeedsMoreInput);
        assert_eq!(
            Error::OutputBufferTooSmall { needed: 10, available: 5 }.decoder_result(),
            DecoderResult::NeedsMoreOutput
        );
        assert_eq!(Error::InvalidCode.decoder_result(), DecoderResult::Error);
        assert_eq!(
            Error::InvalidBackReference { distance: 9, available: 3 }.decoder_result(),
            DecoderResult::Error
        );
    }

    #[test]
    fn test_display() {
        let err = Error::invalid_parameter("quality", 12, 0, 11);
        assert_eq!(err.to_string(), "Invalid quality: 12 (expected 0-11)");
        let err = Error::ChecksumMismatch { expected: 0xdeadbeef, found: 1 };
        assert_eq!(err.to_string(), "CRC32 mismatch: expected 0xdeadbeef, got 0x00000001");
    }
}
