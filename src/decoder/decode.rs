use crate::bits::BitReader;
use crate::error::{Error, Result};
use crate::format::header::read_stream_header;
use crate::format::tables::{
    decode_direct_distance, direct_distance_extra_bits, split_command_symbol, COPY_LENGTH_TABLE,
    INSERT_LENGTH_TABLE, NUM_COMMAND_SYMBOLS, NUM_DISTANCE_SHORT_CODES, NUM_DISTANCE_SYMBOLS,
    NUM_LITERAL_SYMBOLS,
};
use crate::format::{
    distance_context, read_context_map, ContextMode, DistanceRing, MetaBlockHeader, MIN_WINDOW_BITS,
    NUM_DISTANCE_CONTEXTS, NUM_LITERAL_CONTEXTS,
};
use crate::huffman::read_prefix_code;
use crate::window::Window;

use super::state::{BlockTables, ContextMaps, DecoderState, MetaBlockProgress};
use super::DecoderResult;

/// Resumable stream decoder
///
/// `decode` may be called repeatedly with a growing prefix of the same
/// stream and the same output vector. Each call picks up at the last
/// complete unit of input, so `NeedsMoreInput` and `NeedsMoreOutput` are
/// never fatal.
pub struct Decoder {
    state: DecoderState,
    /// Bit position in the input where the next unit starts
    bit_pos: usize,
    window: Window,
    meta: MetaBlockProgress,
    maps: Option<ContextMaps>,
    tables: Option<BlockTables>,
    ring: DistanceRing,
    crc: crc32fast::Hasher,
    total_out: u64,
    error: Option<Error>,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::StreamHeader,
            bit_pos: 0,
            // Replaced once the stream header is read; allocates nothing
            window: Window::new(MIN_WINDOW_BITS),
            meta: MetaBlockProgress::default(),
            maps: None,
            tables: None,
            ring: DistanceRing::new(),
            crc: crc32fast::Hasher::new(),
            total_out: 0,
            error: None,
        }
    }

    /// Decode as much of `input` as possible, appending to `output` while
    /// `output.len()` stays within `limit`
    pub fn decode(&mut self, input: &[u8], output: &mut Vec<u8>, limit: usize) -> DecoderResult {
        match self.state {
            DecoderState::Done => return DecoderResult::Success,
            DecoderState::Failed => return DecoderResult::Error,
            _ => {}
        }

        let mut reader = BitReader::with_position(input, self.bit_pos);
        let mut hashed = output.len();
        let result = loop {
            if self.state == DecoderState::Trailer {
                self.crc.update(&output[hashed..]);
                hashed = output.len();
            }
            match self.step(&mut reader, output, limit) {
                Ok(()) => {
                    self.bit_pos = reader.position();
                    if self.state == DecoderState::Done {
                        break DecoderResult::Success;
                    }
                }
                Err(err) => {
                    let status = err.decoder_result();
                    if status == DecoderResult::Error {
                        tracing::debug!("Decoding failed at bit {}: {}", self.bit_pos, err);
                        self.state = DecoderState::Failed;
                        self.error = Some(err);
                    }
                    break status;
                }
            }
        };

        if self.state != DecoderState::Done {
            self.crc.update(&output[hashed..]);
        }
        result
    }

    /// The error behind an `Error` result
    pub fn last_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == DecoderState::Done
    }

    /// Bytes produced so far
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Read one unit of input and advance the state
    fn step(&mut self, reader: &mut BitReader, output: &mut Vec<u8>, limit: usize) -> Result<()> {
        match self.state {
            DecoderState::StreamHeader => {
                let window_bits = read_stream_header(reader)?;
                self.window = Window::new(window_bits);
                tracing::debug!("Stream header: window_bits={}", window_bits);
                self.state = DecoderState::MetaBlockHeader;
            }
            DecoderState::MetaBlockHeader => self.read_meta_block_header(reader)?,
            DecoderState::RawBytes { remaining } => {
                let room = limit.saturating_sub(output.len());
                let n = remaining.min(room).min(reader.bytes_remaining());
                if n == 0 {
                    return Err(if room == 0 { too_small(output, limit) } else { Error::InsufficientInput });
                }
                let start = output.len();
                output.resize(start + n, 0);
                if let Err(err) = reader.read_bytes(&mut output[start..]) {
                    output.truncate(start);
                    return Err(err);
                }
                self.window.append(&output[start..]);
                self.produced(n);
                self.state = if remaining == n {
                    self.end_of_meta_block()
                } else {
                    DecoderState::RawBytes { remaining: remaining - n }
                };
            }
            DecoderState::ContextMaps => {
                let mode = ContextMode::from_bits(reader.read_bits(2)?)?;
                let (literal_map, num_literal_trees) = read_context_map(reader, NUM_LITERAL_CONTEXTS)?;
                let (distance_map, num_distance_trees) = read_context_map(reader, NUM_DISTANCE_CONTEXTS)?;
                tracing::trace!(
                    "Context maps: mode={:?}, literal_trees={}, distance_trees={}",
                    mode,
                    num_literal_trees,
                    num_distance_trees
                );
                self.maps = Some(ContextMaps { mode, literal_map, num_literal_trees, distance_map, num_distance_trees });
                self.state = DecoderState::CodeTables;
            }
            DecoderState::CodeTables => {
                let maps = self.maps.as_ref().ok_or_else(|| Error::Internal("code tables before context maps".into()))?;
                let literal_trees = (0..maps.num_literal_trees)
                    .map(|_| read_prefix_code(reader, NUM_LITERAL_SYMBOLS))
                    .collect::<Result<Vec<_>>>()?;
                let command_tree = read_prefix_code(reader, NUM_COMMAND_SYMBOLS)?;
                let distance_trees = (0..maps.num_distance_trees)
                    .map(|_| read_prefix_code(reader, NUM_DISTANCE_SYMBOLS))
                    .collect::<Result<Vec<_>>>()?;
                if let Some(maps) = self.maps.take() {
                    self.tables = Some(BlockTables { maps, literal_trees, command_tree, distance_trees });
                }
                self.state = DecoderState::Command;
            }
            DecoderState::Command => {
                let tables = self.tables()?;
                let symbol = tables.command_tree.decode(reader)?;
                let (insert_code, copy_code) = split_command_symbol(symbol);
                let (insert_base, insert_bits) = INSERT_LENGTH_TABLE[insert_code];
                let (copy_base, copy_bits) = COPY_LENGTH_TABLE[copy_code];
                let insert_len = insert_base as usize + reader.read_bits(insert_bits)? as usize;
                let copy_len = copy_base + reader.read_bits(copy_bits)?;
                if insert_len > self.meta.remaining {
                    return Err(Error::MetaBlockOverrun { needed: self.meta.remaining, wanted: insert_len });
                }
                self.state = DecoderState::InsertLiterals { remaining: insert_len, copy_len };
            }
            DecoderState::InsertLiterals { remaining: 0, copy_len } => {
                self.state = if self.meta.remaining == 0 {
                    self.end_of_meta_block()
                } else {
                    DecoderState::Distance { copy_len }
                };
            }
            DecoderState::InsertLiterals { remaining, copy_len } => {
                if output.len() >= limit {
                    return Err(too_small(output, limit));
                }
                let (p1, p2) = self.window.last_two();
                let byte = self.tables()?.literal_tree(p1, p2).decode(reader)? as u8;
                output.push(byte);
                self.window.push_byte(byte);
                self.produced(1);
                self.state = DecoderState::InsertLiterals { remaining: remaining - 1, copy_len };
            }
            DecoderState::Distance { copy_len } => {
                let tables = self.tables()?;
                let symbol = tables.distance_tree(distance_context(copy_len)).decode(reader)?;
                let distance = if (symbol as usize) < NUM_DISTANCE_SHORT_CODES {
                    self.ring.get(symbol as usize)
                } else {
                    let code = symbol - NUM_DISTANCE_SHORT_CODES as u16;
                    let extra = reader.read_bits(direct_distance_extra_bits(code))?;
                    decode_direct_distance(code, extra)
                };
                let distance = distance as usize;

                let copy_len = copy_len as usize;
                if copy_len > self.meta.remaining {
                    return Err(Error::MetaBlockOverrun { needed: self.meta.remaining, wanted: copy_len });
                }
                if distance > self.window.available() {
                    return Err(Error::InvalidBackReference { distance, available: self.window.available() });
                }
                self.ring.update(symbol, distance as u32);
                self.state = DecoderState::CopyBytes { distance, remaining: copy_len };
            }
            DecoderState::CopyBytes { distance, remaining } => {
                let room = limit.saturating_sub(output.len());
                if room == 0 {
                    return Err(too_small(output, limit));
                }
                let n = remaining.min(room);
                self.window.copy_from(distance, n, output)?;
                self.produced(n);
                self.state = if n < remaining {
                    DecoderState::CopyBytes { distance, remaining: remaining - n }
                } else if self.meta.remaining == 0 {
                    self.end_of_meta_block()
                } else {
                    DecoderState::Command
                };
            }
            DecoderState::Trailer => {
                if reader.align_to_byte() != 0 {
                    return Err(Error::NonZeroPadding);
                }
                let expected = reader.read_u32_le()?;
                let found = self.crc.clone().finalize();
                if expected != found {
                    return Err(Error::ChecksumMismatch { expected, found });
                }
                let trailing = reader.bytes_remaining();
                if trailing > 0 {
                    return Err(Error::TrailingData(trailing));
                }
                tracing::debug!("Stream complete: {} bytes", self.total_out);
                self.state = DecoderState::Done;
            }
            DecoderState::Done | DecoderState::Failed => {}
        }
        Ok(())
    }

    fn read_meta_block_header(&mut self, reader: &mut BitReader) -> Result<()> {
        let header = MetaBlockHeader::read(reader)?;
        if header.is_empty() {
            self.state = DecoderState::Trailer;
            return Ok(());
        }
        if header.is_raw && reader.align_to_byte() != 0 {
            return Err(Error::NonZeroPadding);
        }
        tracing::trace!("Meta-block header: {:?}", header);

        self.meta = MetaBlockProgress { remaining: header.length, is_last: header.is_last };
        self.tables = None;
        self.state = if header.is_raw {
            DecoderState::RawBytes { remaining: header.length }
        } else {
            DecoderState::ContextMaps
        };
        Ok(())
    }

    fn tables(&self) -> Result<&BlockTables> {
        self.tables.as_ref().ok_or_else(|| Error::Internal("commands before code tables".into()))
    }

    fn produced(&mut self, n: usize) {
        self.meta.remaining -= n;
        self.total_out += n as u64;
    }

    fn end_of_meta_block(&self) -> DecoderState {
        if self.meta.is_last {
            DecoderState::Trailer
        } else {
            DecoderState::MetaBlockHeader
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

fn too_small(output: &[u8], limit: usize) -> Error {
    Error::OutputBufferTooSmall { needed: output.len() + 1, available: limit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitWriter;
    use crate::format::header::write_stream_header;
    use crate::{compress, EncoderMode};

    fn sample() -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..300 {
            data.extend_from_slice(format!("{} bottles of milk on the wall, take one down\n", 300 - i).as_bytes());
        }
        data
    }

    #[test]
    fn test_resume_after_truncation() {
        let data = sample();
        let stream = compress(9, 16, EncoderMode::Text, &data).unwrap();

        let mut decoder = Decoder::new();
        let mut output = Vec::new();
        let mut status = DecoderResult::NeedsMoreInput;
        for cut in (1..stream.len()).step_by(7) {
            status = decoder.decode(&stream[..cut], &mut output, data.len());
            assert_eq!(status, DecoderResult::NeedsMoreInput);
            assert!(data.starts_with(&output));
        }
        if status != DecoderResult::Success {
            status = decoder.decode(&stream, &mut output, data.len());
        }
        assert_eq!(status, DecoderResult::Success);
        assert_eq!(output, data);
        assert!(decoder.is_finished());
    }

    #[test]
    fn test_resume_after_output_limit() {
        let data = sample();
        let stream = compress(5, 18, EncoderMode::Generic, &data).unwrap();

        let mut decoder = Decoder::new();
        let mut output = Vec::new();
        let mut limit = 0;
        loop {
            match decoder.decode(&stream, &mut output, limit) {
                DecoderResult::NeedsMoreOutput => {
                    assert_eq!(output.len(), limit);
                    limit += 1000;
                }
                DecoderResult::Success => break,
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(output, data);
        assert_eq!(decoder.total_out(), data.len() as u64);
    }

    #[test]
    fn test_empty_stream() {
        let mut writer = BitWriter::new();
        write_stream_header(&mut writer, 16);
        MetaBlockHeader::empty_last().write(&mut writer);
        writer.align_to_byte();
        writer.write_u32_le(0);
        let stream = writer.finish();

        let mut decoder = Decoder::new();
        let mut output = Vec::new();
        assert_eq!(decoder.decode(&stream, &mut output, 0), DecoderResult::Success);
        assert!(output.is_empty());
        // Finished decoders keep reporting success
        assert_eq!(decoder.decode(&stream, &mut output, 0), DecoderResult::Success);
    }

    #[test]
    fn test_raw_block_with_bad_padding() {
        let mut writer = BitWriter::new();
        write_stream_header(&mut writer, 10);
        MetaBlockHeader { is_last: true, length: 3, is_raw: true }.write(&mut writer);
        writer.write_bits(1, 1);
        writer.align_to_byte();
        writer.write_bytes(b"abc");
        let stream = writer.finish();

        let mut decoder = Decoder::new();
        let mut output = Vec::new();
        assert_eq!(decoder.decode(&stream, &mut output, 10), DecoderResult::Error);
        assert_eq!(decoder.last_error(), Some(&Error::NonZeroPadding));
        assert_eq!(decoder.state(), DecoderState::Failed);
        // Failure is sticky
        assert_eq!(decoder.decode(&stream, &mut output, 10), DecoderResult::Error);
    }

    #[test]
    fn test_checksum_and_trailing_data() {
        let data = sample();
        let mut stream = compress(3, 16, EncoderMode::Generic, &data).unwrap();

        let mut padded = stream.clone();
        padded.push(0);
        let mut decoder = Decoder::new();
        assert_eq!(decoder.decode(&padded, &mut Vec::new(), data.len()), DecoderResult::Error);
        assert_eq!(decoder.last_error(), Some(&Error::TrailingData(1)));

        let last = stream.len() - 1;
        stream[last] ^= 0x80;
        let mut decoder = Decoder::new();
        assert_eq!(decoder.decode(&stream, &mut Vec::new(), data.len()), DecoderResult::Error);
        assert!(matches!(decoder.last_error(), Some(Error::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_back_reference_before_start() {
        // One compressed block: a copy at distance 4 with nothing decoded yet
        use crate::format::tables::command_symbol;
        use crate::format::write_context_map;
        use crate::huffman::{write_prefix_code, HuffmanEncoder};

        let mut writer = BitWriter::new();
        write_stream_header(&mut writer, 10);
        MetaBlockHeader { is_last: true, length: 2, is_raw: false }.write(&mut writer);
        writer.write_bits(0, 2);
        write_context_map(&mut writer, &[0; NUM_LITERAL_CONTEXTS], 1);
        write_context_map(&mut writer, &[0; NUM_DISTANCE_CONTEXTS], 1);
        let mut literal_freqs = vec![0u32; NUM_LITERAL_SYMBOLS];
        literal_freqs[0] = 1;
        write_prefix_code(&mut writer, &HuffmanEncoder::from_frequencies(&literal_freqs), NUM_LITERAL_SYMBOLS);
        let mut command_freqs = vec![0u32; NUM_COMMAND_SYMBOLS];
        command_freqs[command_symbol(0, 0)] = 1;
        write_prefix_code(&mut writer, &HuffmanEncoder::from_frequencies(&command_freqs), NUM_COMMAND_SYMBOLS);
        let mut distance_freqs = vec![0u32; NUM_DISTANCE_SYMBOLS];
        distance_freqs[0] = 1;
        write_prefix_code(&mut writer, &HuffmanEncoder::from_frequencies(&distance_freqs), NUM_DISTANCE_SYMBOLS);
        let stream = writer.finish();

        let mut decoder = Decoder::new();
        let mut output = Vec::new();
        assert_eq!(decoder.decode(&stream, &mut output, 100), DecoderResult::Error);
        assert_eq!(decoder.last_error(), Some(&Error::InvalidBackReference { distance: 4, available: 0 }));
        assert!(output.is_empty());
    }
}
