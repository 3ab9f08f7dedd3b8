use crate::error::{Error, Result};

/// Bit-level reader over an in-memory encoded stream
///
/// Bits are read from LSB to MSB within each byte. The reader never looks
/// past the end of `data`; asking for more bits than remain fails with
/// `Error::InsufficientInput` and leaves the cursor where it was.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next byte of `data` to load into the buffer
    next_byte: usize,
    /// Buffer holding up to 64 bits
    buffer: u64,
    /// Number of valid bits in buffer (0-64)
    bits_available: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, next_byte: 0, buffer: 0, bits_available: 0 }
    }

    /// Start reading at an absolute bit position (a previously saved `position()`)
    pub fn with_position(data: &'a [u8], bit_position: usize) -> Self {
        let mut reader = Self::new(data);
        let byte = bit_position / 8;
        if byte >= data.len() {
            reader.next_byte = data.len();
            return reader;
        }
        reader.next_byte = byte;
        let skip = (bit_position % 8) as u8;
        if skip > 0 {
            reader.refill();
            reader.consume_bits(skip);
        }
        reader
    }

    /// Top up the buffer with whole bytes while there is room
    #[inline]
    fn refill(&mut self) {
        // Bulk path: load 8 bytes at once while far from the end
        if self.bits_available <= 56 && self.next_byte + 8 <= self.data.len() {
            let mut bulk = [0u8; 8];
            bulk.copy_from_slice(&self.data[self.next_byte..self.next_byte + 8]);
            let word = u64::from_le_bytes(bulk);
            let take = (64 - self.bits_available) / 8;
            let mask = if take == 8 { u64::MAX } else { (1u64 << (take * 8)) - 1 };
            self.buffer |= (word & mask) << self.bits_available;
            self.bits_available += take * 8;
            self.next_byte += take as usize;
            return;
        }

        while self.bits_available <= 56 && self.next_byte < self.data.len() {
            self.buffer |= (self.data[self.next_byte] as u64) << self.bits_available;
            self.bits_available += 8;
            self.next_byte += 1;
        }
    }

    /// Ensure at least `n` bits are available in buffer
    #[inline]
    fn fill_buffer(&mut self, n: u8) -> Result<()> {
        debug_assert!(n <= 57, "Cannot request more than 57 bits at once");

        if self.bits_available >= n {
            return Ok(());
        }
        self.refill();
        if self.bits_available >= n {
            Ok(())
        } else {
            Err(Error::InsufficientInput)
        }
    }

    /// Read `n` bits (0-32) in LSB-first order
    pub fn read_bits(&mut self, n: u8) -> Result<u32> {
        debug_assert!(n <= 32, "Cannot read more than 32 bits at once");

        if n == 0 {
            return Ok(0);
        }

        self.fill_buffer(n)?;

        let mask = (1u64 << n) - 1;
        let result = (self.buffer & mask) as u32;
        self.buffer >>= n;
        self.bits_available -= n;

        Ok(result)
    }

    /// Peek at up to `n` bits without consuming them (for table-based decoding)
    ///
    /// Near the end of the input fewer bits may exist; the missing high bits
    /// read as zero and the second value reports how many are real.
    #[inline]
    pub fn peek_bits(&mut self, n: u8) -> (u32, u8) {
        debug_assert!(n <= 32, "Cannot peek more than 32 bits at once");

        if self.bits_available < n {
            self.refill();
        }
        let real = self.bits_available.min(n);
        let mask = (1u64 << n) - 1;
        ((self.buffer & mask) as u32, real)
    }

    /// Consume `n` bits that were previously peeked
    #[inline]
    pub fn consume_bits(&mut self, n: u8) {
        debug_assert!(n <= self.bits_available, "Cannot consume more bits than available");
        self.buffer >>= n;
        self.bits_available -= n;
    }

    /// Read a single bit
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Discard remaining bits in current byte, returning their value
    pub fn align_to_byte(&mut self) -> u32 {
        let discard = self.bits_available % 8;
        if discard == 0 {
            return 0;
        }
        let padding = (self.buffer & ((1u64 << discard) - 1)) as u32;
        self.buffer >>= discard;
        self.bits_available -= discard;
        padding
    }

    /// Read a complete byte (aligns to byte boundary first)
    pub fn read_byte(&mut self) -> Result<u8> {
        self.align_to_byte();
        self.read_bits(8).map(|v| v as u8)
    }

    /// Read a 32-bit little-endian value (aligns to byte boundary first)
    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.align_to_byte();
        if self.bytes_remaining() < 4 {
            return Err(Error::InsufficientInput);
        }
        let lo = self.read_bits(16)?;
        let hi = self.read_bits(16)?;
        Ok(lo | (hi << 16))
    }

    /// Read exactly `buf.len()` bytes (aligns to byte boundary first)
    ///
    /// Fails without consuming anything if fewer bytes remain.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.align_to_byte();
        if self.bytes_remaining() < buf.len() {
            return Err(Error::InsufficientInput);
        }

        // Drain whole bytes still held in the bit buffer, then copy directly
        let mut filled = 0;
        while filled < buf.len() && self.bits_available >= 8 {
            buf[filled] = self.buffer as u8;
            self.buffer >>= 8;
            self.bits_available -= 8;
            filled += 1;
        }
        let rest = buf.len() - filled;
        buf[filled..].copy_from_slice(&self.data[self.next_byte..self.next_byte + rest]);
        self.next_byte += rest;
        Ok(())
    }

    /// Absolute position in bits from the start of the input
    pub fn position(&self) -> usize {
        self.next_byte * 8 - self.bits_available as usize
    }

    /// Whole bytes left once the current partial byte is discarded
    pub fn bytes_remaining(&self) -> usize {
        (self.data.len() - self.next_byte) + (self.bits_available / 8) as usize
    }

    /// Bits left in the input, including buffered ones
    pub fn bits_remaining(&self) -> usize {
        (self.data.len() - self.next_byte) * 8 + self.bits_available as usize
    }

    /// Check if all input bits have been consumed
    pub fn is_at_end(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Check if we have bits available without reading more
    pub fn bits_available(&self) -> u8 {
        self.bits_available
    }
}
