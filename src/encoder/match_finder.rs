//! Hash-chain backward-reference search.
//!
//! Positions are indexed by a hash of their next four bytes. `head` holds the
//! most recent position per bucket and `prev` links each position to the one
//! inserted before it in the same bucket. Every position ends up as either a
//! literal or part of exactly one copy.

use crate::format::{Command, DistanceRing};
use crate::QualitySettings;

/// Bytes hashed per position, and the shortest copy found through the chain
const HASH_LEN: usize = 4;

/// Shortest copy taken at one of the recent distances
const MIN_RECENT_LEN: usize = 3;

/// Longest single copy
pub const MAX_COPY_LEN: usize = (1 << 20) - 1;

const NIL: u32 = u32::MAX;

const SCORE_BASE: usize = 1920;
const SCORE_PER_BYTE: usize = 135;
const SCORE_PER_DISTANCE_BIT: usize = 30;

/// Extra score for reusing the k-th most recent distance
const RECENT_BONUS: [usize; 4] = [15, 10, 5, 5];

/// A deferred match must beat the current one by this much
const LAZY_MIN_GAIN: usize = 175;

/// Matches longer than this only index their ends when not indexing everything
const PARTIAL_INDEX_SPAN: usize = 32;
const PARTIAL_INDEX_EDGE: usize = 16;

/// Misses before the skip step grows at low quality
const SKIP_SHIFT: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate {
    len: usize,
    distance: usize,
    score: usize,
}

/// Search state for one input buffer
pub struct MatchFinder<'a> {
    data: &'a [u8],
    settings: &'a QualitySettings,
    head: Vec<u32>,
    prev: Vec<u32>,
    prev_mask: usize,
    hash_shift: u32,
    max_distance: usize,
    ring: DistanceRing,
}

impl<'a> MatchFinder<'a> {
    pub fn new(data: &'a [u8], settings: &'a QualitySettings, window_bits: u32) -> Self {
        let window = 1usize << window_bits;
        let prev_len = window.min(data.len().max(1).next_power_of_two());
        Self {
            data,
            settings,
            head: vec![NIL; 1 << settings.hash_bits],
            prev: vec![NIL; prev_len],
            prev_mask: prev_len - 1,
            hash_shift: 32 - settings.hash_bits,
            max_distance: window,
            ring: DistanceRing::new(),
        }
    }

    /// Turn the whole input into commands
    ///
    /// The result covers every byte exactly once; a trailing insert-only
    /// command carries any literals after the last copy.
    pub fn find_commands(mut self) -> Vec<Command> {
        let end = self.data.len();
        let mut commands = Vec::new();
        let mut pos = 0usize;
        let mut insert_start = 0usize;
        let mut misses = 0usize;

        while pos + HASH_LEN <= end {
            let Some(mut best) = self.find_best(pos) else {
                self.insert(pos);
                let step = if self.settings.skip_incompressible { 1 + (misses >> SKIP_SHIFT) } else { 1 };
                pos = (pos + step).min(end);
                misses += 1;
                continue;
            };

            let mut steps = 0;
            let mut indexed = false;
            while steps < self.settings.lazy_steps
                && best.len < self.settings.nice_length
                && pos + 1 + HASH_LEN <= end
            {
                self.insert(pos);
                indexed = true;
                match self.find_best(pos + 1) {
                    Some(next) if next.score > best.score + LAZY_MIN_GAIN => {
                        pos += 1;
                        best = next;
                        steps += 1;
                        indexed = false;
                    }
                    _ => break,
                }
            }

            commands.push(Command::new(
                (pos - insert_start) as u32,
                best.len as u32,
                best.distance as u32,
            ));
            self.ring.encode_and_update(best.distance as u32);
            let first = if indexed { pos + 1 } else { pos };
            self.index_match(first, pos, best.len);
            pos += best.len;
            insert_start = pos;
            misses = 0;
        }

        if insert_start < end {
            commands.push(Command::insert_only((end - insert_start) as u32));
        }
        tracing::trace!("Match search: {} bytes -> {} commands", end, commands.len());
        commands
    }

    /// Best copy starting at `pos`, if any is worth taking
    fn find_best(&self, pos: usize) -> Option<Candidate> {
        let max_len = (self.data.len() - pos).min(MAX_COPY_LEN);
        let mut best: Option<Candidate> = None;

        if self.settings.check_recent_distances {
            for (k, bonus) in RECENT_BONUS.iter().enumerate() {
                let distance = self.ring.get(k) as usize;
                if distance > pos || distance > self.max_distance {
                    continue;
                }
                let len = self.match_length(pos - distance, pos, max_len);
                if len < MIN_RECENT_LEN {
                    continue;
                }
                let score = SCORE_BASE + SCORE_PER_BYTE * len + bonus;
                if best.map_or(true, |b| score > b.score) {
                    best = Some(Candidate { len, distance, score });
                }
            }
        }

        let mut cand = self.head[self.hash(pos)];
        let mut probes = 0;
        while cand != NIL && probes < self.settings.chain_depth {
            let c = cand as usize;
            let distance = pos - c;
            if distance > self.max_distance {
                break;
            }

            let best_len = best.map_or(0, |b| b.len);
            if best_len >= max_len || best_len >= self.settings.nice_length {
                break;
            }
            if self.data[c + best_len] == self.data[pos + best_len] {
                let len = self.match_length(c, pos, max_len);
                if len >= HASH_LEN {
                    let score = (SCORE_BASE + SCORE_PER_BYTE * len)
                        .saturating_sub(SCORE_PER_DISTANCE_BIT * floor_log2(distance));
                    if best.map_or(true, |b| score > b.score) {
                        best = Some(Candidate { len, distance, score });
                    }
                }
            }

            let next = self.prev[c & self.prev_mask];
            if next == NIL || next >= cand {
                break;
            }
            cand = next;
            probes += 1;
        }

        best
    }

    /// Index the positions covered by a copy at `pos`, starting from `first`
    fn index_match(&mut self, first: usize, pos: usize, len: usize) {
        let end = pos + len;
        if self.settings.index_whole_matches || len <= PARTIAL_INDEX_SPAN {
            for p in first..end {
                self.insert(p);
            }
        } else {
            for p in first..pos + PARTIAL_INDEX_EDGE {
                self.insert(p);
            }
            for p in end - PARTIAL_INDEX_EDGE..end {
                self.insert(p);
            }
        }
    }

    #[inline]
    fn insert(&mut self, pos: usize) {
        if pos + HASH_LEN > self.data.len() {
            return;
        }
        let h = self.hash(pos);
        self.prev[pos & self.prev_mask] = self.head[h];
        self.head[h] = pos as u32;
    }

    #[inline]
    fn hash(&self, pos: usize) -> usize {
        let word = u32::from_le_bytes([
            self.data[pos],
            self.data[pos + 1],
            self.data[pos + 2],
            self.data[pos + 3],
        ]);
        (word.wrapping_mul(0x1E35_A7BD) >> self.hash_shift) as usize
    }

    /// Length of the common prefix of `data[a..]` and `data[b..]`, capped at `max_len`
    #[inline]
    fn match_length(&self, a: usize, b: usize, max_len: usize) -> usize {
        let mut len = 0;
        while len + 8 <= max_len {
            let x = load_u64(self.data, a + len) ^ load_u64(self.data, b + len);
            if x != 0 {
                return len + (x.trailing_zeros() / 8) as usize;
            }
            len += 8;
        }
        while len < max_len && self.data[a + len] == self.data[b + len] {
            len += 1;
        }
        len
    }
}

#[inline]
fn load_u64(data: &[u8], at: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&data[at..at + 8]);
    u64::from_le_bytes(word)
}

#[inline]
fn floor_log2(value: usize) -> usize {
    (usize::BITS - 1 - value.leading_zeros()) as usize
}

/// Commands for `data` at the given effort and window
pub fn find_commands(data: &[u8], settings: &QualitySettings, window_bits: u32) -> Vec<Command> {
    MatchFinder::new(data, settings, window_bits).find_commands()
}
