use crate::error::{Error, Result};

/// Circular history buffer of `2^window_bits` bytes for back-references
///
/// Storage grows with the data actually produced, so a stream that claims a
/// 16 MiB window but only decodes a few bytes never allocates the full ring.
pub struct Window {
    buffer: Vec<u8>,
    /// Ring size, a power of two
    capacity: usize,
    /// Next write position (0..capacity)
    write_pos: usize,
    /// Total bytes ever written
    total_written: u64,
}

impl Window {
    pub fn new(window_bits: u32) -> Self {
        Self { buffer: Vec::new(), capacity: 1 << window_bits, write_pos: 0, total_written: 0 }
    }

    /// Add a single byte to the window
    #[inline]
    pub fn push_byte(&mut self, byte: u8) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(byte);
        } else {
            self.buffer[self.write_pos] = byte;
        }
        self.write_pos = (self.write_pos + 1) & (self.capacity - 1);
        self.total_written += 1;
    }

    /// Add multiple bytes to the window
    pub fn append(&mut self, bytes: &[u8]) {
        // Only the last `capacity` bytes can ever be referenced
        let skip = bytes.len().saturating_sub(self.capacity);
        if skip > 0 && self.buffer.len() < self.capacity {
            self.buffer.resize(self.capacity, 0);
        }
        self.total_written += skip as u64;
        self.write_pos = (self.write_pos + skip) & (self.capacity - 1);

        let mut rest = &bytes[skip..];
        while !rest.is_empty() {
            if self.buffer.len() < self.capacity {
                let take = rest.len().min(self.capacity - self.buffer.len());
                self.buffer.extend_from_slice(&rest[..take]);
                self.advance(take);
                rest = &rest[take..];
            } else {
                let take = rest.len().min(self.capacity - self.write_pos);
                self.buffer[self.write_pos..self.write_pos + take].copy_from_slice(&rest[..take]);
                self.advance(take);
                rest = &rest[take..];
            }
        }
    }

    fn advance(&mut self, n: usize) {
        self.write_pos = (self.write_pos + n) & (self.capacity - 1);
        self.total_written += n as u64;
    }

    /// Copy `length` bytes starting `distance` bytes back, appending them to
    /// both the window and `out`
    ///
    /// `distance = 1` means the most recently written byte. Length may exceed
    /// distance, in which case the copied bytes repeat with period `distance`.
    pub fn copy_from(&mut self, distance: usize, length: usize, out: &mut Vec<u8>) -> Result<()> {
        if distance == 0 || distance > self.available() {
            return Err(Error::InvalidBackReference { distance, available: self.available() });
        }

        let out_start = out.len();
        let start = self.total_written - distance as u64;
        if length <= distance {
            if let Some(src) = self.slice(start, length) {
                out.extend_from_slice(src);
                self.append_from(out, out_start);
                return Ok(());
            }
        }

        let mut read_pos = self.ring_index(start);
        for i in 0..length {
            let byte = if i < distance {
                let b = self.buffer[read_pos];
                read_pos = (read_pos + 1) & (self.capacity - 1);
                b
            } else {
                out[out_start + i - distance]
            };
            out.push(byte);
        }
        self.append_from(out, out_start);
        Ok(())
    }

    fn append_from(&mut self, out: &[u8], from: usize) {
        self.append(&out[from..]);
    }

    /// Contiguous view of `length` bytes at absolute stream `position`
    ///
    /// Returns `None` if the range is no longer (or not yet) in the window,
    /// or if it wraps around the end of the ring.
    pub fn slice(&self, position: u64, length: usize) -> Option<&[u8]> {
        let end = position.checked_add(length as u64)?;
        if position < self.total_written - self.available() as u64 || end > self.total_written {
            return None;
        }
        let start = self.ring_index(position);
        self.buffer.get(start..start + length)
    }

    fn ring_index(&self, position: u64) -> usize {
        (position & (self.capacity as u64 - 1)) as usize
    }

    /// Bytes that can currently be referenced
    pub fn available(&self) -> usize {
        self.total_written.min(self.capacity as u64) as usize
    }

    /// The last two bytes written, most recent first (0 before the stream start)
    #[inline]
    pub fn last_two(&self) -> (u8, u8) {
        let mask = self.capacity - 1;
        let at = |back: usize| -> u8 {
            if (back as u64) > self.total_written {
                0
            } else {
                self.buffer[(self.write_pos + self.capacity - back) & mask]
            }
        };
        (at(1), at(2))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get total bytes written
    pub fn total_written(&self) -> u64 {
        self.total_written
    }
}
