//! Length-limited optimal code lengths.
//!
//! Lengths come from a two-queue Huffman construction over an index arena:
//! leaves sorted by `(frequency, symbol)` in one queue, merged nodes in a
//! second queue that is filled in non-decreasing weight order. When the
//! deepest leaf exceeds the limit, every frequency is raised to a floor that
//! doubles on each retry, which flattens the tree until it fits. The result
//! is always a complete code when two or more symbols are used.

/// Compute code lengths for `frequencies` with no length above `max_bits`.
///
/// Returns 0 for unused symbols. A single used symbol gets length 0 as well:
/// it is coded with zero bits and has to be transmitted explicitly.
pub fn build_code_lengths(frequencies: &[u32], max_bits: u8) -> Vec<u8> {
    let n = frequencies.len();
    let mut lengths = vec![0u8; n];

    let leaves: Vec<(u64, usize)> = frequencies
        .iter()
        .enumerate()
        .filter(|(_, &f)| f > 0)
        .map(|(sym, &f)| (f as u64, sym))
        .collect();

    if leaves.len() <= 1 {
        return lengths;
    }
    debug_assert!(leaves.len() <= 1usize << max_bits, "alphabet too large for max_bits");

    let mut floor = 1u64;
    loop {
        let mut weighted: Vec<(u64, usize)> =
            leaves.iter().map(|&(f, sym)| (f.max(floor), sym)).collect();
        weighted.sort_unstable();

        let depths = huffman_depths(&weighted);
        let deepest = depths.iter().copied().max().unwrap_or(0);
        if deepest <= max_bits as u32 {
            for (&(_, sym), &depth) in weighted.iter().zip(depths.iter()) {
                lengths[sym] = depth as u8;
            }
            return lengths;
        }

        floor *= 2;
    }
}

/// Leaf depths of a Huffman tree over `leaves`, which must be sorted by weight
///
/// Nodes live in a flat arena: indices `0..m` are leaves, merged nodes follow
/// in creation order, so a parent always has a larger index than its children.
fn huffman_depths(leaves: &[(u64, usize)]) -> Vec<u32> {
    let m = leaves.len();
    let total = 2 * m - 1;
    let mut weight = Vec::with_capacity(total);
    weight.extend(leaves.iter().map(|&(w, _)| w));
    let mut parent = vec![0usize; total];

    let mut next_leaf = 0usize;
    let mut next_merged = m;

    // Pick the lighter front of the two queues; leaves win ties
    let take = |weight: &Vec<u64>, next_leaf: &mut usize, next_merged: &mut usize| -> usize {
        let merged_end = weight.len();
        let use_leaf = *next_leaf < m
            && (*next_merged >= merged_end || weight[*next_leaf] <= weight[*next_merged]);
        if use_leaf {
            *next_leaf += 1;
            *next_leaf - 1
        } else {
            *next_merged += 1;
            *next_merged - 1
        }
    };

    while weight.len() < total {
        let a = take(&weight, &mut next_leaf, &mut next_merged);
        let b = take(&weight, &mut next_leaf, &mut next_merged);
        let node = weight.len();
        weight.push(weight[a] + weight[b]);
        parent[a] = node;
        parent[b] = node;
    }

    let mut depth = vec![0u32; total];
    for idx in (0..total - 1).rev() {
        depth[idx] = depth[parent[idx]] + 1;
    }
    depth.truncate(m);
    depth
}

/// Kraft sum of `lengths` scaled by `2^max_bits` (equals `1 << max_bits` for a complete code)
pub fn kraft_sum(lengths: &[u8], max_bits: u8) -> u64 {
    lengths.iter().filter(|&&l| l > 0).map(|&l| 1u64 << (max_bits - l)).sum()
}
