use crate::format::tables::{NUM_COMMAND_SYMBOLS, NUM_DISTANCE_SYMBOLS, NUM_LITERAL_SYMBOLS};
use crate::huffman::tables::{symbol_bits, MAX_SIMPLE_SYMBOLS};

/// Fixed bits charged for a complex code's header
const COMPLEX_TABLE_BASE_BITS: f64 = 24.0;

/// Approximate table bits per used symbol of a complex code
const COMPLEX_TABLE_BITS_PER_SYMBOL: f64 = 3.5;

/// Symbol counts for one alphabet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u32>,
    total: u64,
}

impl Histogram {
    pub fn new(alphabet_size: usize) -> Self {
        Self { counts: vec![0; alphabet_size], total: 0 }
    }

    #[inline]
    pub fn add(&mut self, symbol: usize) {
        self.counts[symbol] += 1;
        self.total += 1;
    }

    pub fn add_histogram(&mut self, other: &Histogram) {
        for (a, &b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.total += other.total;
    }

    pub fn merged(&self, other: &Histogram) -> Histogram {
        let mut result = self.clone();
        result.add_histogram(other);
        result
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Estimated bits to code this histogram, table included
    ///
    /// Data bits are the Shannon entropy of the counts; the table estimate
    /// follows the transmitted layout (simple codes for up to four symbols).
    pub fn bit_cost(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        let mut used = 0usize;
        let mut sum_c_log_c = 0.0f64;
        for &c in &self.counts {
            if c > 0 {
                used += 1;
                sum_c_log_c += c as f64 * (c as f64).log2();
            }
        }

        let total = self.total as f64;
        let data_bits = if used <= 1 { 0.0 } else { total * total.log2() - sum_c_log_c };
        let table_bits = if used <= MAX_SIMPLE_SYMBOLS {
            4.0 + (used * symbol_bits(self.counts.len()) as usize) as f64
        } else {
            COMPLEX_TABLE_BASE_BITS + COMPLEX_TABLE_BITS_PER_SYMBOL * used as f64
        };
        data_bits + table_bits
    }
}

/// The three per-block histograms the splitter compares
#[derive(Clone, Debug)]
pub struct BlockHistograms {
    pub literals: Histogram,
    pub commands: Histogram,
    pub distances: Histogram,
}

/// Bits charged per meta-block for its header and context maps
pub const META_BLOCK_OVERHEAD_BITS: f64 = 48.0;

impl BlockHistograms {
    pub fn new() -> Self {
        Self {
            literals: Histogram::new(NUM_LITERAL_SYMBOLS),
            commands: Histogram::new(NUM_COMMAND_SYMBOLS),
            distances: Histogram::new(NUM_DISTANCE_SYMBOLS),
        }
    }

    pub fn add(&mut self, other: &BlockHistograms) {
        self.literals.add_histogram(&other.literals);
        self.commands.add_histogram(&other.commands);
        self.distances.add_histogram(&other.distances);
    }

    /// Estimated size of a meta-block holding exactly these symbols
    pub fn bit_cost(&self) -> f64 {
        META_BLOCK_OVERHEAD_BITS
            + self.literals.bit_cost()
            + self.commands.bit_cost()
            + self.distances.bit_cost()
    }
}

impl Default for BlockHistograms {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_merge() {
        let mut a = Histogram::new(4);
        a.add(0);
        a.add(0);
        let mut b = Histogram::new(4);
        b.add(3);
        let m = a.merged(&b);
        assert_eq!(m.counts(), &[2, 0, 0, 1]);
        assert_eq!(m.total(), 3);
        assert!(Histogram::new(4).is_empty());
    }

    #[test]
    fn test_cost_prefers_skewed() {
        let mut uniform = Histogram::new(256);
        let mut skewed = Histogram::new(256);
        for i in 0..1024 {
            uniform.add(i % 256);
            skewed.add(if i % 16 == 0 { i % 256 } else { 7 });
        }
        assert!(skewed.bit_cost() < uniform.bit_cost());
        // A uniform byte distribution costs about 8 bits per symbol
        let per_symbol = uniform.bit_cost() / 1024.0;
        assert!(per_symbol > 8.0 && per_symbol < 10.0);
    }

    #[test]
    fn test_merging_similar_is_cheaper() {
        let mut a = Histogram::new(256);
        let mut b = Histogram::new(256);
        for i in 0..200 {
            a.add(b'a' as usize + i % 5);
            b.add(b'a' as usize + (i + 1) % 5);
        }
        let merged = a.merged(&b);
        assert!(merged.bit_cost() < a.bit_cost() + b.bit_cost());
    }

    #[test]
    fn test_single_symbol_costs_only_table() {
        let mut h = Histogram::new(52);
        for _ in 0..100 {
            h.add(9);
        }
        assert_eq!(h.bit_cost(), 4.0 + 6.0);
    }
}
