//! Resumable decoder.

pub mod decode;
pub mod state;

pub use decode::Decoder;
pub use state::DecoderState;

/// Outcome of a decode call, with the numeric values of the C interface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DecoderResult {
    /// The stream is corrupt; see [`Decoder::last_error`]
    Error = 0,
    Success = 1,
    /// The input ended before the stream did
    NeedsMoreInput = 2,
    /// The output limit was reached before the stream ended
    NeedsMoreOutput = 3,
}

impl DecoderResult {
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Error),
            1 => Some(Self::Success),
            2 => Some(Self::NeedsMoreInput),
            3 => Some(Self::NeedsMoreOutput),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> i32 {
        *self as i32
    }

    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values() {
        for status in [
            DecoderResult::Error,
            DecoderResult::Success,
            DecoderResult::NeedsMoreInput,
            DecoderResult::NeedsMoreOutput,
        ] {
            assert_eq!(DecoderResult::from_raw(status.as_raw()), Some(status));
        }
        assert_eq!(DecoderResult::Success.as_raw(), 1);
        assert_eq!(DecoderResult::NeedsMoreOutput.as_raw(), 3);
        assert_eq!(DecoderResult::from_raw(4), None);
        assert!(DecoderResult::Success.is_success());
    }
}
