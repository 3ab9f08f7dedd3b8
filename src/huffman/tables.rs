/// Maximum code length for literal, command and distance alphabets
pub const MAX_CODE_LENGTH: u8 = 15;

/// Maximum code length for the code length alphabet
pub const MAX_CL_CODE_LENGTH: u8 = 7;

/// Size of the code length alphabet (0-15 literal lengths, 16-18 run codes)
pub const NUM_CL_SYMBOLS: usize = 19;

/// Order in which code length code lengths are transmitted
pub const CODE_LENGTH_ORDER: [usize; NUM_CL_SYMBOLS] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// Largest number of symbols a simple code can list
pub const MAX_SIMPLE_SYMBOLS: usize = 4;

/// Code lengths of a simple code, in the order its symbols are listed
pub fn simple_code_lengths(num_symbols: usize, tree_select: bool) -> &'static [u8] {
    match (num_symbols, tree_select) {
        (1, _) => &[0],
        (2, _) => &[1, 1],
        (3, _) => &[1, 2, 2],
        (_, false) => &[2, 2, 2, 2],
        (_, true) => &[1, 2, 3, 3],
    }
}

/// Bits needed to write any symbol of an alphabet with `alphabet_size` entries
pub fn symbol_bits(alphabet_size: usize) -> u8 {
    let max_symbol = alphabet_size.saturating_sub(1);
    (usize::BITS - max_symbol.leading_zeros()).max(1) as u8
}

/// Bits needed to write a count in `0..=alphabet_size`
pub fn count_bits(alphabet_size: usize) -> u8 {
    (usize::BITS - alphabet_size.leading_zeros()).max(1) as u8
}
