use crate::bits::writer::reverse_bits;
use crate::bits::BitWriter;

use super::lengths::build_code_lengths;
use super::tables::{simple_code_lengths, MAX_CODE_LENGTH, MAX_SIMPLE_SYMBOLS};

/// How a prefix code is transmitted in the stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeLayout {
    /// Up to four symbols listed explicitly, most frequent first
    Simple { symbols: Vec<u16>, tree_select: bool },
    /// Full run-length coded length table
    Complex,
}

/// Canonical prefix code for one alphabet, ready for writing symbols
#[derive(Clone, Debug)]
pub struct HuffmanEncoder {
    lengths: Vec<u8>,
    /// (bit-reversed code, length) per symbol
    codes: Vec<(u32, u8)>,
    layout: CodeLayout,
}

impl HuffmanEncoder {
    /// Build the code for a symbol histogram
    ///
    /// An empty histogram yields a one-symbol code for symbol 0, which costs
    /// nothing to write and is never used.
    pub fn from_frequencies(frequencies: &[u32]) -> Self {
        let mut used: Vec<(u32, u16)> = frequencies
            .iter()
            .enumerate()
            .filter(|(_, &f)| f > 0)
            .map(|(sym, &f)| (f, sym as u16))
            .collect();

        if used.len() > MAX_SIMPLE_SYMBOLS {
            let lengths = build_code_lengths(frequencies, MAX_CODE_LENGTH);
            return Self::with_layout(lengths, CodeLayout::Complex);
        }

        if used.is_empty() {
            used.push((0, 0));
        }
        used.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let tree_select = used.len() == 4 && {
            let f: Vec<u64> = used.iter().map(|&(f, _)| f as u64).collect();
            let skewed = f[0] + 2 * f[1] + 3 * (f[2] + f[3]);
            let flat = 2 * (f[0] + f[1] + f[2] + f[3]);
            skewed < flat
        };

        let symbols: Vec<u16> = used.iter().map(|&(_, sym)| sym).collect();
        let mut lengths = vec![0u8; frequencies.len().max(1)];
        for (&sym, &len) in symbols.iter().zip(simple_code_lengths(symbols.len(), tree_select)) {
            lengths[sym as usize] = len;
        }
        Self::with_layout(lengths, CodeLayout::Simple { symbols, tree_select })
    }

    /// Build a code from explicit lengths, transmitted as a full length table
    pub fn from_lengths(lengths: &[u8]) -> Self {
        Self::with_layout(lengths.to_vec(), CodeLayout::Complex)
    }

    fn with_layout(lengths: Vec<u8>, layout: CodeLayout) -> Self {
        let codes = build_canonical_codes(&lengths);
        Self { lengths, codes, layout }
    }

    /// Write the code for `symbol`
    #[inline]
    pub fn encode(&self, writer: &mut BitWriter, symbol: usize) {
        let (code, len) = self.codes[symbol];
        writer.write_bits(code, len);
    }

    pub fn code_length(&self, symbol: usize) -> u8 {
        self.lengths[symbol]
    }

    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    pub fn layout(&self) -> &CodeLayout {
        &self.layout
    }

    /// Bits spent coding `frequencies` with this code, excluding the table
    pub fn data_cost(&self, frequencies: &[u32]) -> u64 {
        frequencies.iter().zip(&self.lengths).map(|(&f, &l)| f as u64 * l as u64).sum()
    }
}

/// Assign canonical codes: shorter codes first, ties broken by symbol value.
/// Codes are returned bit-reversed so they can be written LSB-first.
pub fn build_canonical_codes(lengths: &[u8]) -> Vec<(u32, u8)> {
    let max_bits = lengths.iter().copied().max().unwrap_or(0) as usize;

    let mut bl_count = vec![0u32; max_bits + 1];
    for &len in lengths {
        if len > 0 {
            bl_count[len as usize] += 1;
        }
    }

    let mut next_code = vec![0u32; max_bits + 1];
    let mut code = 0u32;
    for bits in 1..=max_bits {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }

    let mut codes = vec![(0u32, 0u8); lengths.len()];
    for (sym, &len) in lengths.iter().enumerate() {
        if len > 0 {
            codes[sym] = (reverse_bits(next_code[len as usize], len), len);
            next_code[len as usize] += 1;
        }
    }
    codes
}
