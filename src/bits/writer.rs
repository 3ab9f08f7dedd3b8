/// Bit-level writer for encoded output
///
/// Writes bits LSB-first within each byte.
pub struct BitWriter {
    /// Accumulated output bytes
    output: Vec<u8>,
    /// Pending bits not yet flushed to `output`
    acc: u64,
    /// Number of valid bits in `acc` (0-7 between calls)
    acc_bits: u32,
}

/// Saved writer position, see [`BitWriter::snapshot`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    len: usize,
    acc: u64,
    acc_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self { output: Vec::with_capacity(65536), acc: 0, acc_bits: 0 }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { output: Vec::with_capacity(capacity), acc: 0, acc_bits: 0 }
    }

    /// Write `n` bits (0-32) from value in LSB-first order
    #[inline]
    pub fn write_bits(&mut self, value: u32, n: u8) {
        debug_assert!(n <= 32);

        if n == 0 {
            return;
        }

        let mask = (1u64 << n) - 1;
        self.acc |= (value as u64 & mask) << self.acc_bits;
        self.acc_bits += n as u32;

        while self.acc_bits >= 8 {
            self.output.push(self.acc as u8);
            self.acc >>= 8;
            self.acc_bits -= 8;
        }
    }

    /// Write a single bit
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    /// Write bits in reversed order (for prefix codes stored MSB-first)
    /// The code is `length` bits, with MSB first
    pub fn write_bits_reversed(&mut self, code: u32, length: u8) {
        let reversed = reverse_bits(code, length);
        self.write_bits(reversed, length);
    }

    /// Pad to byte boundary with zero bits
    pub fn align_to_byte(&mut self) {
        if self.acc_bits > 0 {
            self.output.push(self.acc as u8);
            self.acc = 0;
            self.acc_bits = 0;
        }
    }

    /// Write a raw byte (must be byte-aligned)
    pub fn write_byte(&mut self, byte: u8) {
        if self.acc_bits == 0 {
            self.output.push(byte);
        } else {
            // Not aligned, write through bits
            self.write_bits(byte as u32, 8);
        }
    }

    /// Write a 32-bit value in little-endian
    pub fn write_u32_le(&mut self, value: u32) {
        for b in value.to_le_bytes() {
            self.write_byte(b);
        }
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.acc_bits == 0 {
            self.output.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_bits(b as u32, 8);
            }
        }
    }

    /// Finish and return the output bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.output
    }

    /// Get current output length in bytes (including partial byte)
    pub fn len(&self) -> usize {
        self.output.len() + if self.acc_bits > 0 { 1 } else { 0 }
    }

    /// Number of bits written so far
    pub fn bit_len(&self) -> usize {
        self.output.len() * 8 + self.acc_bits as usize
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.acc_bits == 0
    }

    /// Peek at completed output bytes without consuming
    pub fn as_bytes(&self) -> &[u8] {
        &self.output
    }

    /// Record the current position so later writes can be undone
    pub fn snapshot(&self) -> Snapshot {
        Snapshot { len: self.output.len(), acc: self.acc, acc_bits: self.acc_bits }
    }

    /// Drop everything written after `snapshot` was taken
    pub fn restore(&mut self, snapshot: Snapshot) {
        debug_assert!(snapshot.len <= self.output.len());
        self.output.truncate(snapshot.len);
        self.acc = snapshot.acc;
        self.acc_bits = snapshot.acc_bits;
    }

    /// Clear the writer for reuse
    pub fn clear(&mut self) {
        self.output.clear();
        self.acc = 0;
        self.acc_bits = 0;
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse the bottom `n` bits of `value`
pub(crate) fn reverse_bits(value: u32, n: u8) -> u32 {
    if n == 0 {
        return 0;
    }
    value.reverse_bits() >> (32 - n as u32)
}
