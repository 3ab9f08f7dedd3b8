//! Context map serialization.
//!
//! A context map assigns a tree index to every context id. It is written as
//! `NTREES - 1` (var-len u8) and, when more than one tree is used:
//!
//! ```text
//! USE_RLE (1) [RLEMAX - 1 (4) if set]
//! prefix code over NTREES + RLEMAX symbols
//! symbols: 0 = value 0, 1..=RLEMAX = run of 2^r + extra zeros, above = value - RLEMAX
//! IMTF (1): values went through a move-to-front transform
//! ```

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::huffman::{read_prefix_code, write_prefix_code, HuffmanEncoder};

use super::header::{read_var_len_u8, write_var_len_u8};

/// Longest zero-run prefix (runs up to 2^17 - 1 zeros)
const MAX_RLE_PREFIX: u32 = 16;

/// Largest number of trees a map can reference
pub const MAX_TREES: usize = 256;

/// Write `map`, which references trees `0..num_trees`
pub fn write_context_map(writer: &mut BitWriter, map: &[u8], num_trees: usize) {
    debug_assert!((1..=MAX_TREES).contains(&num_trees));
    debug_assert!(map.iter().all(|&t| (t as usize) < num_trees));

    write_var_len_u8(writer, (num_trees - 1) as u8);
    if num_trees == 1 {
        return;
    }

    let values = move_to_front(map);
    let rle_max = longest_zero_run_prefix(&values);
    let symbols = rle_symbols(&values, rle_max);

    let alphabet_size = num_trees + rle_max as usize;
    let mut freqs = vec![0u32; alphabet_size];
    for &(sym, _) in &symbols {
        freqs[sym as usize] += 1;
    }
    let code = HuffmanEncoder::from_frequencies(&freqs);

    writer.write_bit(rle_max > 0);
    if rle_max > 0 {
        writer.write_bits(rle_max - 1, 4);
    }
    write_prefix_code(writer, &code, alphabet_size);
    for &(sym, extra) in &symbols {
        code.encode(writer, sym as usize);
        if sym > 0 && sym <= rle_max {
            writer.write_bits(extra, sym as u8);
        }
    }
    writer.write_bit(true);
}

/// Read a map of `size` entries, returning it with its tree count
pub fn read_context_map(reader: &mut BitReader, size: usize) -> Result<(Vec<u8>, usize)> {
    let num_trees = read_var_len_u8(reader)? as usize + 1;
    let mut map = vec![0u8; size];
    if num_trees == 1 {
        return Ok((map, 1));
    }

    let rle_max = if reader.read_bit()? { reader.read_bits(4)? + 1 } else { 0 };
    let alphabet_size = num_trees + rle_max as usize;
    let code = read_prefix_code(reader, alphabet_size)?;

    let mut i = 0;
    while i < size {
        let sym = code.decode(reader)? as u32;
        if sym == 0 {
            map[i] = 0;
            i += 1;
        } else if sym <= rle_max {
            let run = (1usize << sym) + reader.read_bits(sym as u8)? as usize;
            if i + run > size {
                return Err(Error::InvalidContextMap("zero run past end of map"));
            }
            map[i..i + run].fill(0);
            i += run;
        } else {
            let value = sym - rle_max;
            if value as usize >= num_trees {
                return Err(Error::InvalidContextMap("tree index out of range"));
            }
            map[i] = value as u8;
            i += 1;
        }
    }

    if reader.read_bit()? {
        inverse_move_to_front(&mut map);
    }
    if map.iter().any(|&t| t as usize >= num_trees) {
        return Err(Error::InvalidContextMap("tree index out of range"));
    }
    Ok((map, num_trees))
}

fn move_to_front(map: &[u8]) -> Vec<u8> {
    let mut order: Vec<u8> = (0..=255).collect();
    map.iter()
        .map(|&value| {
            let index = order.iter().position(|&v| v == value).unwrap_or(0);
            order[..=index].rotate_right(1);
            index as u8
        })
        .collect()
}

fn inverse_move_to_front(values: &mut [u8]) {
    let mut order: Vec<u8> = (0..=255).collect();
    for value in values.iter_mut() {
        let index = *value as usize;
        let tree = order[index];
        order[..=index].rotate_right(1);
        *value = tree;
    }
}

/// Largest `r` such that some zero run is at least `2^r` long, capped
fn longest_zero_run_prefix(values: &[u8]) -> u32 {
    let mut longest = 0usize;
    let mut run = 0usize;
    for &v in values {
        if v == 0 {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    if longest < 2 {
        0
    } else {
        (usize::BITS - 1 - longest.leading_zeros()).min(MAX_RLE_PREFIX)
    }
}

/// Turn MTF values into (symbol, extra) pairs with zero runs collapsed
fn rle_symbols(values: &[u8], rle_max: u32) -> Vec<(u32, u32)> {
    let mut symbols = Vec::new();
    let mut i = 0;
    while i < values.len() {
        if values[i] != 0 {
            symbols.push((values[i] as u32 + rle_max, 0));
            i += 1;
            continue;
        }
        let mut run = values[i..].iter().take_while(|&&v| v == 0).count();
        i += run;
        while run > 0 {
            if run == 1 || rle_max == 0 {
                symbols.push((0, 0));
                run -= 1;
                continue;
            }
            let prefix = (usize::BITS - 1 - run.leading_zeros()).min(rle_max);
            let take = run.min((1usize << (prefix + 1)) - 1);
            symbols.push((prefix, (take - (1 << prefix)) as u32));
            run -= take;
        }
    }
    symbols
}
