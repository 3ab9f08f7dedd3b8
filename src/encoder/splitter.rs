use crate::format::tables::{encode_direct_distance, NUM_DISTANCE_SHORT_CODES};
use crate::format::{Command, MAX_METABLOCK_LEN};
use crate::SplitStrategy;

use super::histogram::BlockHistograms;
use super::match_finder::MAX_COPY_LEN;

/// Pieces shorter than this are never split further by candidate search
const MIN_CANDIDATE_LEN: usize = 1024;

/// Input covered by one starting block before greedy merging
const MERGE_UNIT_LEN: usize = 4096;

/// Decides where meta-blocks end.
///
/// Splitters only propose targets; [`CommandLayout`] moves each cut to a
/// position that does not fall inside a copy.
pub trait BlockSplitter {
    /// Strictly increasing block end offsets, the last one equal to `data.len()`
    fn split(&self, data: &[u8], layout: &CommandLayout) -> Vec<usize>;
}

/// One meta-block as it will be written
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaBlockPlan {
    /// Offset of the first byte in the input
    pub start: usize,
    pub len: usize,
    /// Commands covering exactly `start..start + len`
    pub commands: Vec<Command>,
}

/// Command boundaries in input offsets
pub struct CommandLayout<'a> {
    commands: &'a [Command],
    /// Start offset of every command, plus the total length at the end
    starts: Vec<usize>,
}

impl<'a> CommandLayout<'a> {
    pub fn new(commands: &'a [Command]) -> Self {
        let mut starts = Vec::with_capacity(commands.len() + 1);
        let mut pos = 0usize;
        for cmd in commands {
            starts.push(pos);
            pos += cmd.uncompressed_size();
        }
        starts.push(pos);
        Self { commands, starts }
    }

    pub fn total_len(&self) -> usize {
        self.starts.last().copied().unwrap_or(0)
    }

    /// Index of the command covering `pos` (`pos < total_len`)
    fn command_at(&self, pos: usize) -> usize {
        self.starts.partition_point(|&s| s <= pos) - 1
    }

    /// Nearest cut to `target` that is not inside a copy
    ///
    /// A cut inside a copy moves forward to the copy's end when that stays
    /// within `limit`, otherwise back to the copy's start.
    pub fn snap(&self, target: usize, limit: usize) -> usize {
        if target == 0 || target >= self.total_len() {
            return target.min(self.total_len());
        }
        let i = self.command_at(target);
        let copy_start = self.starts[i] + self.commands[i].insert_len as usize;
        let cmd_end = self.starts[i + 1];
        if target <= copy_start {
            target
        } else if cmd_end <= limit {
            cmd_end
        } else {
            copy_start
        }
    }

    /// Commands covering `start..end`, both of which must be valid cuts
    ///
    /// A command cut at `end` becomes an insert-only command; its remainder
    /// starts the next range with the leftover literals and the copy.
    pub fn cut(&self, start: usize, end: usize) -> Vec<Command> {
        let mut out = Vec::new();
        if start >= end {
            return out;
        }
        let mut i = self.command_at(start);
        while i < self.commands.len() && self.starts[i] < end {
            let cmd = &self.commands[i];
            let from = start.max(self.starts[i]);
            let skipped = (from - self.starts[i]) as u32;
            debug_assert!(skipped <= cmd.insert_len, "range starts inside a copy");
            if self.starts[i + 1] <= end {
                if cmd.is_insert_only() {
                    out.push(Command::insert_only(cmd.insert_len - skipped));
                } else {
                    out.push(Command::new(cmd.insert_len - skipped, cmd.copy_len, cmd.distance));
                }
            } else {
                out.push(Command::insert_only((end - from) as u32));
            }
            i += 1;
        }
        out
    }

    /// Estimated symbol statistics of the range `start..end`
    pub fn histograms(&self, data: &[u8], start: usize, end: usize) -> BlockHistograms {
        let mut hist = BlockHistograms::new();
        let mut pos = start;
        for cmd in self.cut(start, end) {
            hist.commands.add(cmd.symbol());
            for &byte in &data[pos..pos + cmd.insert_len as usize] {
                hist.literals.add(byte as usize);
            }
            if !cmd.is_insert_only() {
                // Recent-distance reuse is not known here; assume a direct code
                let (code, _, _) = encode_direct_distance(cmd.distance);
                hist.distances.add(NUM_DISTANCE_SHORT_CODES + code as usize);
            }
            pos += cmd.uncompressed_size();
        }
        hist
    }
}

/// Maximum-size pieces only
pub struct FixedSplitter {
    pub max_len: usize,
}

impl Default for FixedSplitter {
    fn default() -> Self {
        Self { max_len: MAX_METABLOCK_LEN }
    }
}

impl BlockSplitter for FixedSplitter {
    fn split(&self, _data: &[u8], layout: &CommandLayout) -> Vec<usize> {
        debug_assert!(self.max_len > MAX_COPY_LEN);
        let total = layout.total_len();
        let mut ends = Vec::new();
        let mut start = 0;
        while start < total {
            let limit = start + self.max_len;
            let end = if limit >= total { total } else { layout.snap(limit, limit) };
            ends.push(end);
            start = end;
        }
        ends
    }
}

/// Best of one, two or four equal parts within each fixed piece
#[derive(Default)]
pub struct CandidateSplitter {
    pub fixed: FixedSplitter,
}

impl BlockSplitter for CandidateSplitter {
    fn split(&self, data: &[u8], layout: &CommandLayout) -> Vec<usize> {
        let mut ends = Vec::new();
        let mut start = 0;
        for piece_end in self.fixed.split(data, layout) {
            let mut best_cost = f64::INFINITY;
            let mut best_ends = vec![piece_end];
            for parts in [1usize, 2, 4] {
                let len = piece_end - start;
                if parts > 1 && len / parts < MIN_CANDIDATE_LEN {
                    break;
                }
                let mut cuts = Vec::with_capacity(parts);
                for j in 1..parts {
                    let cut = layout.snap(start + len * j / parts, piece_end);
                    if cut > cuts.last().copied().unwrap_or(start) && cut < piece_end {
                        cuts.push(cut);
                    }
                }
                cuts.push(piece_end);

                let mut cost = 0.0;
                let mut from = start;
                for &cut in &cuts {
                    cost += layout.histograms(data, from, cut).bit_cost();
                    from = cut;
                }
                if cost < best_cost {
                    best_cost = cost;
                    best_ends = cuts;
                }
            }
            ends.extend(best_ends);
            start = piece_end;
        }
        ends
    }
}

/// Small units merged greedily while merging saves bits
#[derive(Default)]
pub struct MergingSplitter {
    pub fixed: FixedSplitter,
}

impl MergingSplitter {
    fn split_piece(&self, data: &[u8], layout: &CommandLayout, start: usize, end: usize) -> Vec<usize> {
        let mut bounds = vec![start];
        let mut pos = start;
        while pos < end {
            let next = layout.snap((pos + MERGE_UNIT_LEN).min(end), end);
            let next = if next <= pos { end } else { next };
            bounds.push(next);
            pos = next;
        }

        let mut blocks: Vec<(usize, BlockHistograms, f64)> = bounds
            .windows(2)
            .map(|w| {
                let hist = layout.histograms(data, w[0], w[1]);
                let cost = hist.bit_cost();
                (w[1], hist, cost)
            })
            .collect();

        let pair_delta = |blocks: &[(usize, BlockHistograms, f64)], i: usize, first_start: usize| -> f64 {
            let block_start = if i == 0 { first_start } else { blocks[i - 1].0 };
            if blocks[i + 1].0 - block_start > self.fixed.max_len {
                return f64::INFINITY;
            }
            let mut merged = blocks[i].1.clone();
            merged.add(&blocks[i + 1].1);
            merged.bit_cost() - blocks[i].2 - blocks[i + 1].2
        };

        let mut deltas: Vec<f64> = (0..blocks.len().saturating_sub(1)).map(|i| pair_delta(&blocks, i, start)).collect();
        loop {
            let Some((i, &delta)) =
                deltas.iter().enumerate().min_by(|a, b| a.1.total_cmp(b.1))
            else {
                break;
            };
            if delta >= 0.0 {
                break;
            }

            let (end_b, hist_b, _) = blocks.remove(i + 1);
            blocks[i].0 = end_b;
            blocks[i].1.add(&hist_b);
            blocks[i].2 = blocks[i].1.bit_cost();
            deltas.remove(i);
            if i < deltas.len() {
                deltas[i] = pair_delta(&blocks, i, start);
            }
            if i > 0 {
                deltas[i - 1] = pair_delta(&blocks, i - 1, start);
            }
        }

        blocks.into_iter().map(|(end, _, _)| end).collect()
    }
}

impl BlockSplitter for MergingSplitter {
    fn split(&self, data: &[u8], layout: &CommandLayout) -> Vec<usize> {
        let mut ends = Vec::new();
        let mut start = 0;
        for piece_end in self.fixed.split(data, layout) {
            ends.extend(self.split_piece(data, layout, start, piece_end));
            start = piece_end;
        }
        ends
    }
}

/// Partition `commands` into meta-blocks using `strategy`
pub fn plan_meta_blocks(strategy: SplitStrategy, data: &[u8], commands: &[Command]) -> Vec<MetaBlockPlan> {
    let layout = CommandLayout::new(commands);
    debug_assert_eq!(layout.total_len(), data.len());
    let ends = match strategy {
        SplitStrategy::Fixed => FixedSplitter::default().split(data, &layout),
        SplitStrategy::Candidates => CandidateSplitter::default().split(data, &layout),
        SplitStrategy::GreedyMerge => MergingSplitter::default().split(data, &layout),
    };

    let mut start = 0;
    ends.into_iter()
        .map(|end| {
            let plan = MetaBlockPlan { start, len: end - start, commands: layout.cut(start, end) };
            start = end;
            plan
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::match_finder::find_commands;
    use crate::QualitySettings;

    fn check_plans(data: &[u8], plans: &[MetaBlockPlan], max_len: usize) {
        let mut pos = 0;
        for plan in plans {
            assert_eq!(plan.start, pos);
            assert!(plan.len > 0 && plan.len <= max_len);
            let covered: usize = plan.commands.iter().map(|c| c.uncompressed_size()).sum();
            assert_eq!(covered, plan.len);
            let (last, body) = plan.commands.split_last().unwrap();
            assert!(body.iter().all(|c| !c.is_insert_only()));
            assert!(last.insert_len > 0 || !last.is_insert_only());
            pos += plan.len;
        }
        assert_eq!(pos, data.len());
    }

    fn mixed_input() -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..3000 {
            data.extend_from_slice(format!("record {:05} alpha beta gamma\n", i).as_bytes());
        }
        let mut state = 7u32;
        for _ in 0..40_000 {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            data.push((state >> 24) as u8);
        }
        data
    }

    #[test]
    fn test_snap_and_cut() {
        // insert 3, copy 5 | insert 2 (end)
        let commands = vec![Command::new(3, 5, 2), Command::insert_only(2)];
        let layout = CommandLayout::new(&commands);
        assert_eq!(layout.total_len(), 10);
        assert_eq!(layout.snap(2, 10), 2);
        assert_eq!(layout.snap(3, 10), 3);
        assert_eq!(layout.snap(5, 10), 8);
        assert_eq!(layout.snap(5, 6), 3);
        assert_eq!(layout.snap(9, 10), 9);

        assert_eq!(layout.cut(0, 2), vec![Command::insert_only(2)]);
        assert_eq!(layout.cut(2, 9), vec![Command::new(1, 5, 2), Command::insert_only(1)]);
        assert_eq!(layout.cut(3, 10), vec![Command::new(0, 5, 2), Command::insert_only(2)]);
        assert_eq!(layout.cut(0, 10), commands);
    }

    #[test]
    fn test_fixed_pieces() {
        let data = mixed_input();
        let commands = find_commands(&data, &QualitySettings::for_quality(2), 16);
        let layout = CommandLayout::new(&commands);
        let max_len = MAX_COPY_LEN + 1;
        let ends = FixedSplitter { max_len }.split(&data, &layout);
        assert_eq!(ends, vec![data.len()]);

        let plans = plan_meta_blocks(SplitStrategy::Fixed, &data, &commands);
        assert_eq!(plans.len(), 1);
        check_plans(&data, &plans, MAX_METABLOCK_LEN);
    }

    #[test]
    fn test_candidates_separate_text_from_noise() {
        let data = mixed_input();
        let commands = find_commands(&data, &QualitySettings::for_quality(6), 18);
        let plans = plan_meta_blocks(SplitStrategy::Candidates, &data, &commands);
        check_plans(&data, &plans, MAX_METABLOCK_LEN);
        assert!(plans.len() > 1);
    }

    #[test]
    fn test_greedy_merge_plans() {
        let data = mixed_input();
        let commands = find_commands(&data, &QualitySettings::for_quality(10), 18);
        let plans = plan_meta_blocks(SplitStrategy::GreedyMerge, &data, &commands);
        check_plans(&data, &plans, MAX_METABLOCK_LEN);
        assert!(plans.len() > 1);
        assert!(plans.len() < data.len() / MERGE_UNIT_LEN);
    }

    #[test]
    fn test_single_block_for_small_input() {
        let data = b"tiny".to_vec();
        let commands = vec![Command::insert_only(4)];
        for strategy in [SplitStrategy::Fixed, SplitStrategy::Candidates, SplitStrategy::GreedyMerge] {
            let plans = plan_meta_blocks(strategy, &data, &commands);
            assert_eq!(plans, vec![MetaBlockPlan { start: 0, len: 4, commands: commands.clone() }]);
        }
    }
}
