use crate::bits::writer::reverse_bits;
use crate::bits::BitReader;
use crate::error::{Error, Result};

use super::tables::MAX_CODE_LENGTH;

/// Bits resolved by the direct lookup table
const ROOT_BITS: u8 = 8;

#[derive(Clone, Copy, Debug, Default)]
struct RootEntry {
    symbol: u16,
    /// Code length, 0 when the code is longer than `ROOT_BITS`
    length: u8,
}

/// Canonical prefix code decoder
///
/// Codes up to eight bits resolve through a 256-entry table indexed by the
/// next input bits. Longer codes fall back to a canonical walk over the
/// per-length counts and the symbols sorted by `(length, symbol)`.
#[derive(Clone, Debug)]
pub struct HuffmanDecoder {
    root: Vec<RootEntry>,
    /// Number of codes of each length
    counts: [u16; MAX_CODE_LENGTH as usize + 1],
    /// Symbols sorted by code length, then by symbol value
    symbols: Vec<u16>,
    max_bits: u8,
    /// Set for a one-symbol code, which consumes no bits
    single: Option<u16>,
}

impl HuffmanDecoder {
    /// Build from per-symbol code lengths
    ///
    /// The lengths must describe a complete prefix code: oversubscribed and
    /// incomplete length sets are both rejected.
    pub fn from_lengths(lengths: &[u8]) -> Result<Self> {
        let mut counts = [0u16; MAX_CODE_LENGTH as usize + 1];
        for &len in lengths {
            if len > MAX_CODE_LENGTH {
                return Err(Error::InvalidCodeLength(len));
            }
            if len > 0 {
                counts[len as usize] += 1;
            }
        }

        let max_bits = (1..=MAX_CODE_LENGTH).rev().find(|&l| counts[l as usize] > 0).unwrap_or(0);
        if max_bits == 0 {
            return Err(Error::HuffmanIncomplete);
        }

        let mut left: i32 = 1;
        for &count in &counts[1..] {
            left = (left << 1) - count as i32;
            if left < 0 {
                return Err(Error::HuffmanOversubscribed);
            }
        }
        if left > 0 {
            return Err(Error::HuffmanIncomplete);
        }

        let mut offsets = [0usize; MAX_CODE_LENGTH as usize + 2];
        for len in 1..=MAX_CODE_LENGTH as usize {
            offsets[len + 1] = offsets[len] + counts[len] as usize;
        }
        let mut symbols = vec![0u16; offsets[MAX_CODE_LENGTH as usize + 1]];
        for (sym, &len) in lengths.iter().enumerate() {
            if len > 0 {
                symbols[offsets[len as usize]] = sym as u16;
                offsets[len as usize] += 1;
            }
        }

        let mut root = vec![RootEntry::default(); 1 << ROOT_BITS];
        let mut code = 0u32;
        let mut index = 0usize;
        for len in 1..=ROOT_BITS.min(max_bits) {
            for _ in 0..counts[len as usize] {
                let entry = RootEntry { symbol: symbols[index], length: len };
                let mut slot = reverse_bits(code, len) as usize;
                while slot < root.len() {
                    root[slot] = entry;
                    slot += 1 << len;
                }
                code += 1;
                index += 1;
            }
            code <<= 1;
        }

        Ok(Self { root, counts, symbols, max_bits, single: None })
    }

    /// A code with exactly one symbol, decoded without reading any bits
    pub fn single(symbol: u16) -> Self {
        Self {
            root: Vec::new(),
            counts: [0; MAX_CODE_LENGTH as usize + 1],
            symbols: vec![symbol],
            max_bits: 0,
            single: Some(symbol),
        }
    }

    /// Decode the next symbol
    ///
    /// Fails with `InsufficientInput` when the input ends inside a code, and
    /// with `InvalidCode` if no code matches. Nothing is consumed on failure.
    #[inline]
    pub fn decode(&self, reader: &mut BitReader) -> Result<u16> {
        if let Some(symbol) = self.single {
            return Ok(symbol);
        }

        let (bits, real) = reader.peek_bits(ROOT_BITS);
        let entry = self.root[bits as usize];
        if entry.length != 0 {
            if entry.length > real {
                return Err(Error::InsufficientInput);
            }
            reader.consume_bits(entry.length);
            return Ok(entry.symbol);
        }
        self.decode_slow(reader)
    }

    /// Canonical walk for codes longer than the root table
    fn decode_slow(&self, reader: &mut BitReader) -> Result<u16> {
        let (bits, real) = reader.peek_bits(self.max_bits);

        let mut code: u32 = 0;
        let mut first: u32 = 0;
        let mut index: u32 = 0;
        for len in 1..=self.max_bits {
            code |= (bits >> (len - 1)) & 1;
            let count = self.counts[len as usize] as u32;
            if code.wrapping_sub(first) < count && code >= first {
                if len > real {
                    return Err(Error::InsufficientInput);
                }
                reader.consume_bits(len);
                return Ok(self.symbols[(index + code - first) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }

        if real < self.max_bits {
            Err(Error::InsufficientInput)
        } else {
            Err(Error::InvalidCode)
        }
    }

    /// Number of symbols with a code
    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }
}
