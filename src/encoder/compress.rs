use crate::bits::BitWriter;
use crate::format::header::write_stream_header;
use crate::format::tables::{NUM_COMMAND_SYMBOLS, NUM_DISTANCE_SYMBOLS, NUM_LITERAL_SYMBOLS};
use crate::format::{write_context_map, DistanceCode, DistanceRing, MetaBlockHeader};
use crate::huffman::{write_prefix_code, HuffmanEncoder};
use crate::{max_compressed_size, EncoderMode, EncoderParams, QualitySettings};

use super::context_model::{build_context_model, ContextModel};
use super::histogram::Histogram;
use super::match_finder::find_commands;
use super::splitter::{plan_meta_blocks, MetaBlockPlan};

/// Meta-block size used when the whole stream is stored raw
pub const RAW_BLOCK_LEN: usize = 1 << 16;

/// Encode `input` as a complete stream; parameters must already be validated
pub fn compress_stream(params: &EncoderParams, input: &[u8]) -> Vec<u8> {
    let settings = params.settings();
    let bound = max_compressed_size(input.len());
    let mut writer = BitWriter::with_capacity(bound);
    write_stream_header(&mut writer, params.window_bits);

    let mut num_blocks = 0usize;
    let mut raw_blocks = 0usize;
    if input.is_empty() {
        MetaBlockHeader::empty_last().write(&mut writer);
    } else {
        let commands = find_commands(input, &settings, params.window_bits);
        let plans = plan_meta_blocks(settings.split, input, &commands);
        let mut ring = DistanceRing::new();
        num_blocks = plans.len();
        for (i, plan) in plans.iter().enumerate() {
            let is_last = i + 1 == plans.len();
            if !write_meta_block(&mut writer, &mut ring, input, plan, is_last, params.mode, &settings) {
                raw_blocks += 1;
            }
        }
    }

    writer.align_to_byte();
    writer.write_u32_le(crc32fast::hash(input));
    let output = writer.finish();

    if output.len() > bound {
        tracing::debug!(
            "Encoded stream of {} bytes exceeds bound {}, storing {} input bytes raw",
            output.len(),
            bound,
            input.len()
        );
        return raw_stream(params.window_bits, input);
    }

    tracing::debug!(
        "Compressed {} -> {} bytes (quality={}, window_bits={}, mode={:?}, blocks={}, raw={})",
        input.len(),
        output.len(),
        params.quality,
        params.window_bits,
        params.mode,
        num_blocks,
        raw_blocks
    );
    output
}

/// The input as a sequence of raw meta-blocks
pub fn raw_stream(window_bits: u32, input: &[u8]) -> Vec<u8> {
    let mut writer = BitWriter::with_capacity(max_compressed_size(input.len()));
    write_stream_header(&mut writer, window_bits);
    if input.is_empty() {
        MetaBlockHeader::empty_last().write(&mut writer);
    }
    let count = input.len().div_ceil(RAW_BLOCK_LEN);
    for (i, chunk) in input.chunks(RAW_BLOCK_LEN).enumerate() {
        let header = MetaBlockHeader { is_last: i + 1 == count, length: chunk.len(), is_raw: true };
        write_raw_block(&mut writer, &header, chunk);
    }
    writer.align_to_byte();
    writer.write_u32_le(crc32fast::hash(input));
    writer.finish()
}

fn write_raw_block(writer: &mut BitWriter, header: &MetaBlockHeader, bytes: &[u8]) {
    header.write(writer);
    writer.align_to_byte();
    writer.write_bytes(bytes);
}

/// Write one meta-block, falling back to raw storage when coding does not pay
///
/// Returns whether the block was written compressed.
fn write_meta_block(
    writer: &mut BitWriter,
    ring: &mut DistanceRing,
    data: &[u8],
    plan: &MetaBlockPlan,
    is_last: bool,
    mode: EncoderMode,
    settings: &QualitySettings,
) -> bool {
    let snapshot = writer.snapshot();
    let saved_ring = *ring;
    let start_bits = writer.bit_len();

    let header = MetaBlockHeader { is_last, length: plan.len, is_raw: false };
    header.write(writer);
    let model = write_compressed_body(writer, ring, data, plan, mode, settings);
    let compressed_bits = writer.bit_len() - start_bits;

    let raw_header = MetaBlockHeader { is_raw: true, ..header };
    let raw_header_end = start_bits + raw_header.bit_len();
    let raw_bits = raw_header.bit_len() + (8 - raw_header_end % 8) % 8 + 8 * plan.len;

    if compressed_bits < raw_bits {
        tracing::debug!(
            "Meta-block at {}: {} bytes, mode={:?}, literal_trees={}, distance_trees={}, {} bits",
            plan.start,
            plan.len,
            model.mode,
            model.num_literal_trees(),
            model.num_distance_trees(),
            compressed_bits
        );
        return true;
    }

    writer.restore(snapshot);
    *ring = saved_ring;
    write_raw_block(writer, &raw_header, &data[plan.start..plan.start + plan.len]);
    tracing::debug!("Meta-block at {}: {} bytes stored raw", plan.start, plan.len);
    false
}

/// Context maps, prefix codes and commands of a compressed meta-block
fn write_compressed_body(
    writer: &mut BitWriter,
    ring: &mut DistanceRing,
    data: &[u8],
    plan: &MetaBlockPlan,
    mode: EncoderMode,
    settings: &QualitySettings,
) -> ContextModel {
    let distance_codes: Vec<DistanceCode> = plan
        .commands
        .iter()
        .filter(|c| !c.is_insert_only())
        .map(|c| ring.encode_and_update(c.distance))
        .collect();
    let symbols: Vec<u16> = distance_codes.iter().map(|c| c.symbol).collect();
    let model = build_context_model(data, plan, &symbols, mode, settings);

    let mut command_hist = Histogram::new(NUM_COMMAND_SYMBOLS);
    for cmd in &plan.commands {
        command_hist.add(cmd.symbol());
    }
    let literal_codes: Vec<HuffmanEncoder> =
        model.literal_histograms.iter().map(|h| HuffmanEncoder::from_frequencies(h.counts())).collect();
    let command_code = HuffmanEncoder::from_frequencies(command_hist.counts());
    let distance_trees: Vec<HuffmanEncoder> =
        model.distance_histograms.iter().map(|h| HuffmanEncoder::from_frequencies(h.counts())).collect();

    writer.write_bits(model.mode as u32, 2);
    write_context_map(writer, &model.literal_map, model.num_literal_trees());
    write_context_map(writer, &model.distance_map, model.num_distance_trees());
    for code in &literal_codes {
        write_prefix_code(writer, code, NUM_LITERAL_SYMBOLS);
    }
    write_prefix_code(writer, &command_code, NUM_COMMAND_SYMBOLS);
    for code in &distance_trees {
        write_prefix_code(writer, code, NUM_DISTANCE_SYMBOLS);
    }
    tracing::trace!("Tables for block at {} end at bit {}", plan.start, writer.bit_len());

    let mut pos = plan.start;
    let mut distances = distance_codes.iter();
    for cmd in &plan.commands {
        let (insert, copy) = cmd.length_codes();
        command_code.encode(writer, cmd.symbol());
        writer.write_bits(insert.extra_value, insert.extra_bits);
        writer.write_bits(copy.extra_value, copy.extra_bits);

        for at in pos..pos + cmd.insert_len as usize {
            let p1 = if at >= 1 { data[at - 1] } else { 0 };
            let p2 = if at >= 2 { data[at - 2] } else { 0 };
            literal_codes[model.literal_tree(p1, p2)].encode(writer, data[at] as usize);
        }
        pos += cmd.insert_len as usize;

        if cmd.is_insert_only() {
            continue;
        }
        if let Some(code) = distances.next() {
            distance_trees[model.distance_tree(cmd.copy_len)].encode(writer, code.symbol as usize);
            writer.write_bits(code.extra_value, code.extra_bits);
        }
        pos += cmd.copy_len as usize;
    }
    debug_assert_eq!(pos, plan.start + plan.len);
    model
}
