use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};

/// Smallest window exponent
pub const MIN_WINDOW_BITS: u32 = 10;

/// Largest window exponent
pub const MAX_WINDOW_BITS: u32 = 24;

/// Largest number of bytes one meta-block can hold
pub const MAX_METABLOCK_LEN: usize = 1 << 24;

/// Write the stream header: 4 bits holding `window_bits - 10`
pub fn write_stream_header(writer: &mut BitWriter, window_bits: u32) {
    debug_assert!((MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&window_bits));
    writer.write_bits(window_bits - MIN_WINDOW_BITS, 4);
}

/// Read the stream header and return the window exponent
pub fn read_stream_header(reader: &mut BitReader) -> Result<u32> {
    let code = reader.read_bits(4)?;
    let window_bits = code + MIN_WINDOW_BITS;
    if window_bits > MAX_WINDOW_BITS {
        return Err(Error::InvalidWindowBits(code));
    }
    Ok(window_bits)
}

/// Meta-block header
///
/// ```text
/// ISLAST (1) [ISEMPTY (1) if last]
/// MNIBBLES (2): 0-2 for 4-6 nibbles, 3 reserved
/// MLEN - 1 (4 * nibbles), no leading zero nibble beyond the fourth
/// ISRAW (1)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetaBlockHeader {
    pub is_last: bool,
    /// Uncompressed length; 0 only for the empty last meta-block
    pub length: usize,
    pub is_raw: bool,
}

impl MetaBlockHeader {
    /// The empty meta-block that ends a stream
    pub fn empty_last() -> Self {
        Self { is_last: true, length: 0, is_raw: false }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn write(&self, writer: &mut BitWriter) {
        writer.write_bit(self.is_last);
        if self.is_last {
            writer.write_bit(self.is_empty());
        }
        if self.is_empty() {
            debug_assert!(self.is_last, "only the last meta-block may be empty");
            return;
        }

        debug_assert!(self.length <= MAX_METABLOCK_LEN);
        let value = (self.length - 1) as u32;
        let nibbles = nibbles_for(value);
        writer.write_bits(nibbles - 4, 2);
        writer.write_bits(value, (nibbles * 4) as u8);
        writer.write_bit(self.is_raw);
    }

    pub fn read(reader: &mut BitReader) -> Result<Self> {
        let is_last = reader.read_bit()?;
        if is_last && reader.read_bit()? {
            return Ok(Self::empty_last());
        }

        let code = reader.read_bits(2)?;
        if code == 3 {
            return Err(Error::InvalidMetaBlockLength);
        }
        let nibbles = code + 4;
        let value = reader.read_bits((nibbles * 4) as u8)?;
        if nibbles > 4 && value >> ((nibbles - 1) * 4) == 0 {
            return Err(Error::InvalidMetaBlockLength);
        }
        let is_raw = reader.read_bit()?;

        Ok(Self { is_last, length: value as usize + 1, is_raw })
    }

    /// Header size in bits
    pub fn bit_len(&self) -> usize {
        let mut bits = 1 + self.is_last as usize;
        if !self.is_empty() {
            bits += 2 + 4 * nibbles_for((self.length - 1) as u32) as usize + 1;
        }
        bits
    }
}

fn nibbles_for(value: u32) -> u32 {
    if value < 1 << 16 {
        4
    } else if value < 1 << 20 {
        5
    } else {
        6
    }
}

/// Write a value in 0..=255 with a short code for zero
///
/// `0` is a single 0 bit. Otherwise a 1 bit, 3 bits holding `n = floor(log2 v)`,
/// then `n` bits holding `v - 2^n`.
pub fn write_var_len_u8(writer: &mut BitWriter, value: u8) {
    if value == 0 {
        writer.write_bit(false);
        return;
    }
    let n = 7 - value.leading_zeros();
    writer.write_bit(true);
    writer.write_bits(n, 3);
    writer.write_bits(value as u32 - (1 << n), n as u8);
}

pub fn read_var_len_u8(reader: &mut BitReader) -> Result<u8> {
    if !reader.read_bit()? {
        return Ok(0);
    }
    let n = reader.read_bits(3)?;
    let rest = reader.read_bits(n as u8)?;
    Ok(((1 << n) + rest) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reread(header: MetaBlockHeader) -> MetaBlockHeader {
        let mut writer = BitWriter::new();
        header.write(&mut writer);
        assert_eq!(writer.bit_len(), header.bit_len());
        let data = writer.finish();
        MetaBlockHeader::read(&mut BitReader::new(&data)).unwrap()
    }

    #[test]
    fn test_stream_header() {
        for bits in MIN_WINDOW_BITS..=MAX_WINDOW_BITS {
            let mut writer = BitWriter::new();
            write_stream_header(&mut writer, bits);
            let data = writer.finish();
            assert_eq!(read_stream_header(&mut BitReader::new(&data)).unwrap(), bits);
        }
        assert_eq!(read_stream_header(&mut BitReader::new(&[0x0f])), Err(Error::InvalidWindowBits(15)));
    }

    #[test]
    fn test_meta_block_lengths() {
        for length in [1usize, 2, 65_536, 65_537, 1 << 20, (1 << 20) + 1, MAX_METABLOCK_LEN] {
            for (is_last, is_raw) in [(false, false), (true, false), (false, true), (true, true)] {
                let header = MetaBlockHeader { is_last, length, is_raw };
                assert_eq!(reread(header), header);
            }
        }
        assert_eq!(reread(MetaBlockHeader::empty_last()), MetaBlockHeader::empty_last());
    }

    #[test]
    fn test_rejects_reserved_and_padded_lengths() {
        let mut writer = BitWriter::new();
        writer.write_bit(false);
        writer.write_bits(3, 2);
        writer.write_bits(0, 16);
        let data = writer.finish();
        assert_eq!(MetaBlockHeader::read(&mut BitReader::new(&data)), Err(Error::InvalidMetaBlockLength));

        // Five nibbles with a zero top nibble could have used four
        let mut writer = BitWriter::new();
        writer.write_bit(false);
        writer.write_bits(1, 2);
        writer.write_bits(0x0_1234, 20);
        writer.write_bit(false);
        let data = writer.finish();
        assert_eq!(MetaBlockHeader::read(&mut BitReader::new(&data)), Err(Error::InvalidMetaBlockLength));
    }

    #[test]
    fn test_var_len_u8() {
        let mut writer = BitWriter::new();
        for v in 0..=255u8 {
            write_var_len_u8(&mut writer, v);
        }
        let data = writer.finish();
        let mut reader = BitReader::new(&data);
        for v in 0..=255u8 {
            assert_eq!(read_var_len_u8(&mut reader).unwrap(), v);
        }
    }
}
