/// Literal alphabet size
pub const NUM_LITERAL_SYMBOLS: usize = 256;

/// Number of insert length codes and of copy length codes
pub const NUM_LENGTH_CODES: usize = 24;

/// Command alphabet: one symbol per (insert code, copy code) pair
pub const NUM_COMMAND_SYMBOLS: usize = NUM_LENGTH_CODES * NUM_LENGTH_CODES;

/// Distance symbols 0-3 reuse recent distances
pub const NUM_DISTANCE_SHORT_CODES: usize = 4;

/// Distance alphabet: short codes plus 48 direct codes
pub const NUM_DISTANCE_SYMBOLS: usize = NUM_DISTANCE_SHORT_CODES + 48;

/// Shortest copy a command can express
pub const MIN_COPY_LENGTH: u32 = 2;

/// Insert length codes 0-23: base length and extra bits
pub const INSERT_LENGTH_TABLE: [(u32, u8); NUM_LENGTH_CODES] = [
    // (base_length, extra_bits)
    (0, 0),
    (1, 0),
    (2, 0),
    (3, 0),
    (4, 0),
    (5, 0),
    (6, 1),
    (8, 1),
    (10, 2),
    (14, 2),
    (18, 3),
    (26, 3),
    (34, 4),
    (50, 4),
    (66, 5),
    (98, 5),
    (130, 6),
    (194, 7),
    (322, 8),
    (578, 9),
    (1090, 10),
    (2114, 12),
    (6210, 14),
    (22594, 24),
];

/// Copy length codes 0-23: base length and extra bits
pub const COPY_LENGTH_TABLE: [(u32, u8); NUM_LENGTH_CODES] = [
    (2, 0),
    (3, 0),
    (4, 0),
    (5, 0),
    (6, 0),
    (7, 0),
    (8, 0),
    (9, 0),
    (10, 1),
    (12, 1),
    (14, 2),
    (18, 2),
    (22, 3),
    (30, 3),
    (38, 4),
    (54, 4),
    (70, 5),
    (102, 5),
    (134, 6),
    (198, 7),
    (326, 8),
    (582, 9),
    (1094, 10),
    (2118, 24),
];

/// A length split into its code and extra bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthCode {
    pub code: u16,
    pub extra_value: u32,
    pub extra_bits: u8,
}

fn encode_with(table: &[(u32, u8); NUM_LENGTH_CODES], length: u32) -> LengthCode {
    let idx = table.partition_point(|&(base, _)| base <= length) - 1;
    let (base, extra_bits) = table[idx];
    LengthCode { code: idx as u16, extra_value: length - base, extra_bits }
}

/// Find the insert length code for `length` (any value below 2^24 + 22594)
pub fn encode_insert_length(length: u32) -> LengthCode {
    encode_with(&INSERT_LENGTH_TABLE, length)
}

/// Find the copy length code for `length` (at least `MIN_COPY_LENGTH`)
pub fn encode_copy_length(length: u32) -> LengthCode {
    debug_assert!(length >= MIN_COPY_LENGTH);
    encode_with(&COPY_LENGTH_TABLE, length)
}

/// Combine insert and copy codes into a command symbol
#[inline]
pub fn command_symbol(insert_code: u16, copy_code: u16) -> usize {
    insert_code as usize * NUM_LENGTH_CODES + copy_code as usize
}

/// Split a command symbol into (insert code, copy code)
#[inline]
pub fn split_command_symbol(symbol: u16) -> (usize, usize) {
    (symbol as usize / NUM_LENGTH_CODES, symbol as usize % NUM_LENGTH_CODES)
}

/// Direct distance code for `distance` (1..=2^24), before the short-code offset
///
/// Returns (code 0-47, extra value, extra bits).
pub fn encode_direct_distance(distance: u32) -> (u16, u32, u8) {
    let v = distance - 1;
    if v < 4 {
        return (v as u16, 0, 0);
    }
    let nbits = 31 - v.leading_zeros();
    let half = (v >> (nbits - 1)) & 1;
    let code = 2 * nbits + half;
    let base = (2 + half) << (nbits - 1);
    (code as u16, v - base, (nbits - 1) as u8)
}

/// Extra bits carried by direct distance code `code`
#[inline]
pub fn direct_distance_extra_bits(code: u16) -> u8 {
    if code < 4 {
        0
    } else {
        (code / 2 - 1) as u8
    }
}

/// Distance for direct code `code` with extra bits value `extra`
#[inline]
pub fn decode_direct_distance(code: u16, extra: u32) -> u32 {
    if code < 4 {
        return code as u32 + 1;
    }
    let nbits = (code / 2) as u32;
    let half = (code & 1) as u32;
    ((2 + half) << (nbits - 1)) + extra + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_contiguous() {
        for table in [&INSERT_LENGTH_TABLE, &COPY_LENGTH_TABLE] {
            for pair in table.windows(2) {
                let (base, extra) = pair[0];
                assert_eq!(base + (1 << extra), pair[1].0);
            }
        }
    }

    #[test]
    fn test_encode_insert_length() {
        assert_eq!(encode_insert_length(0), LengthCode { code: 0, extra_value: 0, extra_bits: 0 });
        assert_eq!(encode_insert_length(7), LengthCode { code: 6, extra_value: 1, extra_bits: 1 });
        assert_eq!(encode_insert_length(22594), LengthCode { code: 23, extra_value: 0, extra_bits: 24 });
        assert_eq!(encode_insert_length(1 << 24).code, 23);
    }

    #[test]
    fn test_encode_copy_length() {
        assert_eq!(encode_copy_length(2), LengthCode { code: 0, extra_value: 0, extra_bits: 0 });
        assert_eq!(encode_copy_length(11), LengthCode { code: 8, extra_value: 1, extra_bits: 1 });
        assert_eq!(encode_copy_length(2117).code, 22);
        assert_eq!(encode_copy_length(2118).code, 23);
    }

    #[test]
    fn test_command_symbol() {
        assert_eq!(command_symbol(0, 0), 0);
        assert_eq!(command_symbol(23, 23), NUM_COMMAND_SYMBOLS - 1);
        assert_eq!(split_command_symbol(command_symbol(5, 17) as u16), (5, 17));
    }

    #[test]
    fn test_direct_distance_codes() {
        assert_eq!(encode_direct_distance(1), (0, 0, 0));
        assert_eq!(encode_direct_distance(4), (3, 0, 0));
        assert_eq!(encode_direct_distance(5), (4, 0, 1));
        assert_eq!(encode_direct_distance(7), (5, 0, 1));
        assert_eq!(encode_direct_distance(1 << 24), (47, (1 << 22) - 1, 22));

        for distance in (1..70_000u32).chain([(1 << 24) - 5, 1 << 24]) {
            let (code, extra, bits) = encode_direct_distance(distance);
            assert!((code as usize) < NUM_DISTANCE_SYMBOLS - NUM_DISTANCE_SHORT_CODES);
            assert_eq!(bits, direct_distance_extra_bits(code));
            assert!(extra < (1 << bits));
            assert_eq!(decode_direct_distance(code, extra), distance);
        }
    }
}
