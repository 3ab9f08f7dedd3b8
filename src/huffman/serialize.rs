//! Transmitting prefix codes inside the stream.
//!
//! A code starts with one bit selecting its layout. Simple codes list up to
//! four symbols directly. Complex codes send a length table, run-length coded
//! with symbols 16 (repeat previous 3-6 times), 17 (3-10 zeros) and 18
//! (11-138 zeros), itself prefix coded with a code length code whose lengths
//! are sent 3 bits each in `CODE_LENGTH_ORDER`.

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};

use super::decoder::HuffmanDecoder;
use super::encoder::{CodeLayout, HuffmanEncoder};
use super::lengths::build_code_lengths;
use super::tables::{
    count_bits, simple_code_lengths, symbol_bits, CODE_LENGTH_ORDER, MAX_CL_CODE_LENGTH,
    NUM_CL_SYMBOLS,
};

/// Write `encoder`'s code for an alphabet of `alphabet_size` symbols
pub fn write_prefix_code(writer: &mut BitWriter, encoder: &HuffmanEncoder, alphabet_size: usize) {
    match encoder.layout() {
        CodeLayout::Simple { symbols, tree_select } => {
            writer.write_bit(true);
            writer.write_bits(symbols.len() as u32 - 1, 2);
            let bits = symbol_bits(alphabet_size);
            for &sym in symbols {
                writer.write_bits(sym as u32, bits);
            }
            if symbols.len() == 4 {
                writer.write_bit(*tree_select);
            }
        }
        CodeLayout::Complex => {
            writer.write_bit(false);
            write_length_table(writer, encoder.lengths(), alphabet_size);
        }
    }
}

fn write_length_table(writer: &mut BitWriter, lengths: &[u8], alphabet_size: usize) {
    let num_used = lengths.iter().rposition(|&l| l > 0).map_or(0, |i| i + 1);
    writer.write_bits(num_used as u32, count_bits(alphabet_size));

    let rle = rle_encode_lengths(&lengths[..num_used]);

    let mut cl_freq = [0u32; NUM_CL_SYMBOLS];
    for &(sym, _) in &rle {
        cl_freq[sym as usize] += 1;
    }
    let mut cl_lengths = build_code_lengths(&cl_freq, MAX_CL_CODE_LENGTH);

    // A lone code length symbol still needs a complete code: pair it with a dummy
    let used: Vec<usize> = (0..NUM_CL_SYMBOLS).filter(|&s| cl_freq[s] > 0).collect();
    if used.len() == 1 {
        let only = used[0];
        cl_lengths[only] = 1;
        cl_lengths[if only == 0 { 1 } else { 0 }] = 1;
    }

    let num_cl = CODE_LENGTH_ORDER.iter().rposition(|&s| cl_lengths[s] > 0).map_or(0, |i| i + 1).max(4);
    writer.write_bits(num_cl as u32 - 4, 4);
    for &sym in CODE_LENGTH_ORDER.iter().take(num_cl) {
        writer.write_bits(cl_lengths[sym] as u32, 3);
    }

    let cl_code = HuffmanEncoder::from_lengths(&cl_lengths);
    for &(sym, extra) in &rle {
        cl_code.encode(writer, sym as usize);
        match sym {
            16 => writer.write_bits(extra as u32, 2),
            17 => writer.write_bits(extra as u32, 3),
            18 => writer.write_bits(extra as u32, 7),
            _ => {}
        }
    }
}

/// Read a code for an alphabet of `alphabet_size` symbols
pub fn read_prefix_code(reader: &mut BitReader, alphabet_size: usize) -> Result<HuffmanDecoder> {
    if reader.read_bit()? {
        read_simple_code(reader, alphabet_size)
    } else {
        read_length_table(reader, alphabet_size)
    }
}

fn read_simple_code(reader: &mut BitReader, alphabet_size: usize) -> Result<HuffmanDecoder> {
    let num_symbols = reader.read_bits(2)? as usize + 1;
    let bits = symbol_bits(alphabet_size);

    let mut symbols = [0u16; 4];
    for i in 0..num_symbols {
        let sym = reader.read_bits(bits)?;
        if sym as usize >= alphabet_size {
            return Err(Error::InvalidSymbol { symbol: sym, alphabet_size });
        }
        if symbols[..i].contains(&(sym as u16)) {
            return Err(Error::HuffmanOversubscribed);
        }
        symbols[i] = sym as u16;
    }
    let tree_select = num_symbols == 4 && reader.read_bit()?;

    if num_symbols == 1 {
        return Ok(HuffmanDecoder::single(symbols[0]));
    }

    let mut lengths = vec![0u8; alphabet_size];
    for (&sym, &len) in symbols.iter().zip(simple_code_lengths(num_symbols, tree_select)) {
        lengths[sym as usize] = len;
    }
    HuffmanDecoder::from_lengths(&lengths)
}

fn read_length_table(reader: &mut BitReader, alphabet_size: usize) -> Result<HuffmanDecoder> {
    let num_used = reader.read_bits(count_bits(alphabet_size))? as usize;
    if num_used > alphabet_size {
        return Err(Error::InvalidSymbol { symbol: num_used as u32, alphabet_size });
    }

    let num_cl = reader.read_bits(4)? as usize + 4;
    let mut cl_lengths = [0u8; NUM_CL_SYMBOLS];
    for &sym in CODE_LENGTH_ORDER.iter().take(num_cl) {
        cl_lengths[sym] = reader.read_bits(3)? as u8;
    }
    let cl_decoder = HuffmanDecoder::from_lengths(&cl_lengths)?;

    let mut lengths = Vec::with_capacity(alphabet_size);
    while lengths.len() < num_used {
        let sym = cl_decoder.decode(reader)?;
        let (value, repeat) = match sym {
            0..=15 => (sym as u8, 1),
            16 => {
                let prev = *lengths.last().ok_or(Error::HuffmanIncomplete)?;
                (prev, 3 + reader.read_bits(2)? as usize)
            }
            17 => (0, 3 + reader.read_bits(3)? as usize),
            _ => (0, 11 + reader.read_bits(7)? as usize),
        };
        if lengths.len() + repeat > num_used {
            return Err(Error::InvalidSymbol { symbol: (lengths.len() + repeat) as u32, alphabet_size });
        }
        lengths.resize(lengths.len() + repeat, value);
    }

    lengths.resize(alphabet_size, 0);
    HuffmanDecoder::from_lengths(&lengths)
}

/// RLE encode code lengths using symbols 16, 17, 18
fn rle_encode_lengths(lengths: &[u8]) -> Vec<(u8, u8)> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let len = lengths[i];
        let mut run = lengths[i..].iter().take_while(|&&l| l == len).count();
        i += run;

        if len == 0 {
            while run > 0 {
                if run >= 11 {
                    let count = run.min(138);
                    result.push((18, (count - 11) as u8));
                    run -= count;
                } else if run >= 3 {
                    let count = run.min(10);
                    result.push((17, (count - 3) as u8));
                    run -= count;
                } else {
                    result.push((0, 0));
                    run -= 1;
                }
            }
        } else {
            result.push((len, 0));
            run -= 1;
            while run > 0 {
                if run >= 3 {
                    let count = run.min(6);
                    result.push((16, (count - 3) as u8));
                    run -= count;
                } else {
                    result.push((len, 0));
                    run -= 1;
                }
            }
        }
    }

    result
}
