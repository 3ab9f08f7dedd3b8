//! Context functions: how the previous two output bytes select a literal
//! code, and how the copy length selects a distance code.

use crate::error::{Error, Result};

/// Literal contexts per meta-block
pub const NUM_LITERAL_CONTEXTS: usize = 64;

/// Distance contexts per meta-block
pub const NUM_DISTANCE_CONTEXTS: usize = 4;

/// Function mapping the previous two bytes to a literal context id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContextMode {
    /// Low six bits of the previous byte
    Lsb6 = 0,
    /// High six bits of the previous byte
    Msb6 = 1,
    /// Character classes of the previous two bytes, tuned for UTF-8 text
    Utf8 = 2,
    /// Magnitude buckets of the previous two bytes read as signed values
    Signed = 3,
}

impl ContextMode {
    pub const ALL: [ContextMode; 4] =
        [ContextMode::Lsb6, ContextMode::Msb6, ContextMode::Utf8, ContextMode::Signed];

    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            0 => Ok(ContextMode::Lsb6),
            1 => Ok(ContextMode::Msb6),
            2 => Ok(ContextMode::Utf8),
            3 => Ok(ContextMode::Signed),
            _ => Err(Error::Internal(format!("context mode out of range: {}", bits))),
        }
    }

    /// Context id for a literal preceded by `p1` (most recent) and `p2`
    #[inline]
    pub fn context_id(self, p1: u8, p2: u8) -> usize {
        match self {
            ContextMode::Lsb6 => (p1 & 0x3f) as usize,
            ContextMode::Msb6 => (p1 >> 2) as usize,
            ContextMode::Utf8 => ((UTF8_CLASS[p1 as usize] << 3) | UTF8_CLASS[p2 as usize]) as usize,
            ContextMode::Signed => {
                ((SIGNED_BUCKET[p1 as usize] << 3) | SIGNED_BUCKET[p2 as usize]) as usize
            }
        }
    }
}

/// Distance context for a copy of `copy_len` bytes
#[inline]
pub fn distance_context(copy_len: u32) -> usize {
    match copy_len {
        0..=2 => 0,
        3 => 1,
        4 => 2,
        _ => 3,
    }
}

static UTF8_CLASS: [u8; 256] = build_utf8_classes();
static SIGNED_BUCKET: [u8; 256] = build_signed_buckets();

const fn build_utf8_classes() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = match i as u8 {
            b' ' | b'\t' | b'\n' | b'\r' => 1,
            b'0'..=b'9' => 2,
            b'a'..=b'z' => 4,
            b'A'..=b'Z' => 5,
            b'!'..=b'~' => 3,
            0x80..=0xbf => 6,
            0xc0..=0xff => 7,
            _ => 0,
        };
        i += 1;
    }
    table
}

const fn build_signed_buckets() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = match i as u8 {
            0 => 0,
            1..=15 => 1,
            16..=63 => 2,
            64..=127 => 3,
            128..=191 => 4,
            192..=239 => 5,
            240..=254 => 6,
            255 => 7,
        };
        i += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_in_range() {
        for mode in ContextMode::ALL {
            for p1 in 0..=255u8 {
                for p2 in [0u8, 7, 65, 128, 200, 255] {
                    assert!(mode.context_id(p1, p2) < NUM_LITERAL_CONTEXTS);
                }
            }
        }
    }

    #[test]
    fn test_utf8_classes() {
        let id = |a: u8, b: u8| ContextMode::Utf8.context_id(a, b);
        assert_eq!(id(b'a', b' '), 4 * 8 + 1);
        assert_eq!(id(b'Q', b'7'), 5 * 8 + 2);
        assert_eq!(id(b'.', 0xe2), 3 * 8 + 7);
        assert_eq!(id(0x9c, 0x01), 6 * 8);
        assert_eq!(id(b'x', b'y'), id(b'q', b'z'));
    }

    #[test]
    fn test_signed_buckets() {
        let id = |a: u8, b: u8| ContextMode::Signed.context_id(a, b);
        assert_eq!(id(0, 0), 0);
        assert_eq!(id(0xff, 0x01), 7 * 8 + 1);
        assert_eq!(id(0x80, 0x40), 4 * 8 + 3);
    }

    #[test]
    fn test_lsb_msb() {
        assert_eq!(ContextMode::Lsb6.context_id(0xff, 0), 63);
        assert_eq!(ContextMode::Msb6.context_id(0xff, 0), 63);
        assert_eq!(ContextMode::Msb6.context_id(0x04, 0xff), 1);
    }

    #[test]
    fn test_distance_context() {
        assert_eq!(distance_context(2), 0);
        assert_eq!(distance_context(3), 1);
        assert_eq!(distance_context(4), 2);
        assert_eq!(distance_context(5), 3);
        assert_eq!(distance_context(100_000), 3);
    }

    #[test]
    fn test_mode_bits() {
        for mode in ContextMode::ALL {
            assert_eq!(ContextMode::from_bits(mode as u32).unwrap(), mode);
        }
    }
}
