use super::tables::{encode_direct_distance, NUM_DISTANCE_SHORT_CODES};

/// Recent distances at the start of a stream, before any copy has been made
pub const INITIAL_DISTANCES: [u32; 4] = [4, 11, 15, 16];

/// A distance as written to the stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistanceCode {
    /// Symbol in the distance alphabet
    pub symbol: u16,
    pub extra_value: u32,
    pub extra_bits: u8,
}

/// The four most recently used copy distances, most recent first
///
/// Kept in lockstep by encoder and decoder: after every copy the distance is
/// pushed unless it was coded as symbol 0 (a repeat of the last distance).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistanceRing {
    recent: [u32; 4],
}

impl DistanceRing {
    pub fn new() -> Self {
        Self { recent: INITIAL_DISTANCES }
    }

    /// The `k`-th most recent distance (k < 4)
    #[inline]
    pub fn get(&self, k: usize) -> u32 {
        self.recent[k]
    }

    /// Record the distance of a copy coded with `symbol`
    #[inline]
    pub fn update(&mut self, symbol: u16, distance: u32) {
        if symbol != 0 {
            self.recent = [distance, self.recent[0], self.recent[1], self.recent[2]];
        }
    }

    /// Pick the cheapest symbol for `distance`: a short code when it matches a
    /// recent distance, a direct code otherwise
    pub fn encode(&self, distance: u32) -> DistanceCode {
        if let Some(k) = self.recent.iter().position(|&d| d == distance) {
            return DistanceCode { symbol: k as u16, extra_value: 0, extra_bits: 0 };
        }
        let (code, extra_value, extra_bits) = encode_direct_distance(distance);
        DistanceCode { symbol: code + NUM_DISTANCE_SHORT_CODES as u16, extra_value, extra_bits }
    }

    /// Encode `distance` and record it, as the decoder will
    pub fn encode_and_update(&mut self, distance: u32) -> DistanceCode {
        let code = self.encode(distance);
        self.update(code.symbol, distance);
        code
    }

    pub fn recent(&self) -> &[u32; 4] {
        &self.recent
    }
}

impl Default for DistanceRing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_codes() {
        let mut ring = DistanceRing::new();
        assert_eq!(ring.encode(11).symbol, 1);

        let code = ring.encode_and_update(100);
        assert!(code.symbol >= NUM_DISTANCE_SHORT_CODES as u16);
        assert_eq!(ring.recent(), &[100, 4, 11, 15]);

        // Repeating the last distance does not push
        assert_eq!(ring.encode_and_update(100).symbol, 0);
        assert_eq!(ring.recent(), &[100, 4, 11, 15]);

        // Reusing an older distance moves it to the front
        assert_eq!(ring.encode_and_update(15).symbol, 3);
        assert_eq!(ring.recent(), &[15, 100, 4, 11]);
    }

    #[test]
    fn test_direct_code_offset() {
        let ring = DistanceRing::new();
        assert_eq!(ring.encode(1), DistanceCode { symbol: 4, extra_value: 0, extra_bits: 0 });
        assert_eq!(ring.encode(5).symbol, 8);
    }
}
