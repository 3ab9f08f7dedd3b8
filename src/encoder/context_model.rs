//! Per-meta-block context maps.
//!
//! Literals are bucketed by the context id of their two preceding bytes and
//! distances by the length of their copy. Buckets with similar statistics are
//! clustered so they share one prefix code.

use crate::format::tables::{NUM_DISTANCE_SYMBOLS, NUM_LITERAL_SYMBOLS};
use crate::format::{distance_context, ContextMode, NUM_DISTANCE_CONTEXTS, NUM_LITERAL_CONTEXTS};
use crate::{EncoderMode, QualitySettings};

use super::histogram::Histogram;
use super::splitter::MetaBlockPlan;

/// Context maps and the statistics of every tree they reference
#[derive(Clone, Debug)]
pub struct ContextModel {
    pub mode: ContextMode,
    /// Literal context id -> literal tree
    pub literal_map: Vec<u8>,
    /// Symbol counts per literal tree
    pub literal_histograms: Vec<Histogram>,
    /// Distance context id -> distance tree
    pub distance_map: Vec<u8>,
    pub distance_histograms: Vec<Histogram>,
}

impl ContextModel {
    pub fn num_literal_trees(&self) -> usize {
        self.literal_histograms.len()
    }

    pub fn num_distance_trees(&self) -> usize {
        self.distance_histograms.len()
    }

    /// Literal tree for a byte preceded by `p1` and `p2`
    #[inline]
    pub fn literal_tree(&self, p1: u8, p2: u8) -> usize {
        self.literal_map[self.mode.context_id(p1, p2)] as usize
    }

    /// Distance tree for a copy of `copy_len` bytes
    #[inline]
    pub fn distance_tree(&self, copy_len: u32) -> usize {
        self.distance_map[distance_context(copy_len)] as usize
    }
}

/// Histograms assigned to clusters
struct Clustering {
    map: Vec<u8>,
    histograms: Vec<Histogram>,
    cost: f64,
}

/// Build the context model for `plan`
///
/// `distance_symbols` holds the distance symbol of every command that
/// performs a copy, in order. `data` is the whole input so the first
/// literals of a block see the bytes before it.
pub fn build_context_model(
    data: &[u8],
    plan: &MetaBlockPlan,
    distance_symbols: &[u16],
    encoder_mode: EncoderMode,
    settings: &QualitySettings,
) -> ContextModel {
    let modes: &[ContextMode] = if settings.max_literal_trees == 1 {
        &[ContextMode::Lsb6]
    } else {
        encoder_mode.context_modes(settings)
    };

    let mut best: Option<(ContextMode, Clustering)> = None;
    for &mode in modes {
        let histograms = literal_histograms(data, plan, mode);
        let clustering = cluster_histograms(&histograms, settings.max_literal_trees, NUM_LITERAL_SYMBOLS);
        if best.as_ref().map_or(true, |(_, b)| clustering.cost < b.cost) {
            best = Some((mode, clustering));
        }
    }
    let (mode, literals) = match best {
        Some(found) => found,
        None => {
            let histograms = literal_histograms(data, plan, ContextMode::Lsb6);
            (ContextMode::Lsb6, cluster_histograms(&histograms, 1, NUM_LITERAL_SYMBOLS))
        }
    };

    let mut distance_hists = vec![Histogram::new(NUM_DISTANCE_SYMBOLS); NUM_DISTANCE_CONTEXTS];
    let copies = plan.commands.iter().filter(|c| !c.is_insert_only());
    for (cmd, &symbol) in copies.zip(distance_symbols) {
        distance_hists[distance_context(cmd.copy_len)].add(symbol as usize);
    }
    let distances = cluster_histograms(&distance_hists, settings.max_distance_trees, NUM_DISTANCE_SYMBOLS);

    ContextModel {
        mode,
        literal_map: literals.map,
        literal_histograms: literals.histograms,
        distance_map: distances.map,
        distance_histograms: distances.histograms,
    }
}

fn literal_histograms(data: &[u8], plan: &MetaBlockPlan, mode: ContextMode) -> Vec<Histogram> {
    let mut histograms = vec![Histogram::new(NUM_LITERAL_SYMBOLS); NUM_LITERAL_CONTEXTS];
    let mut pos = plan.start;
    for cmd in &plan.commands {
        for at in pos..pos + cmd.insert_len as usize {
            let p1 = if at >= 1 { data[at - 1] } else { 0 };
            let p2 = if at >= 2 { data[at - 2] } else { 0 };
            histograms[mode.context_id(p1, p2)].add(data[at] as usize);
        }
        pos += cmd.uncompressed_size();
    }
    histograms
}

/// Greedily merge histograms until at most `max_clusters` remain and no
/// merge lowers the estimated cost
fn cluster_histograms(histograms: &[Histogram], max_clusters: usize, alphabet_size: usize) -> Clustering {
    let mut members: Vec<Vec<usize>> = Vec::new();
    let mut clusters: Vec<Histogram> = Vec::new();
    for (ctx, hist) in histograms.iter().enumerate() {
        if !hist.is_empty() {
            members.push(vec![ctx]);
            clusters.push(hist.clone());
        }
    }
    if clusters.is_empty() {
        return Clustering {
            map: vec![0; histograms.len()],
            histograms: vec![Histogram::new(alphabet_size)],
            cost: 0.0,
        };
    }

    let mut costs: Vec<f64> = clusters.iter().map(Histogram::bit_cost).collect();
    let pair_delta =
        |clusters: &[Histogram], costs: &[f64], i: usize, j: usize| clusters[i].merged(&clusters[j]).bit_cost() - costs[i] - costs[j];

    let n = clusters.len();
    let mut deltas = vec![vec![f64::INFINITY; n]; n];
    for i in 0..n {
        for j in i + 1..n {
            deltas[i][j] = pair_delta(&clusters, &costs, i, j);
        }
    }

    while clusters.len() > 1 {
        let mut best = (0, 1, f64::INFINITY);
        for (i, row) in deltas.iter().enumerate() {
            for (j, &delta) in row.iter().enumerate().skip(i + 1) {
                if delta < best.2 {
                    best = (i, j, delta);
                }
            }
        }
        let (i, j, delta) = best;
        if clusters.len() <= max_clusters && delta >= 0.0 {
            break;
        }

        let absorbed = clusters.remove(j);
        clusters[i].add_histogram(&absorbed);
        costs.remove(j);
        costs[i] = clusters[i].bit_cost();
        let moved = members.remove(j);
        members[i].extend(moved);
        deltas.remove(j);
        for row in deltas.iter_mut() {
            row.remove(j);
        }
        for k in 0..clusters.len() {
            if k != i {
                let (lo, hi) = if k < i { (k, i) } else { (i, k) };
                deltas[lo][hi] = pair_delta(&clusters, &costs, lo, hi);
            }
        }
    }

    let mut assignment: Vec<Option<usize>> = vec![None; histograms.len()];
    for (cluster, ctxs) in members.iter().enumerate() {
        for &ctx in ctxs {
            assignment[ctx] = Some(cluster);
        }
    }
    // Unused contexts copy a neighbour so the map has long runs
    let first = assignment.iter().flatten().next().copied().unwrap_or(0);
    let mut previous = first;
    let filled: Vec<usize> = assignment
        .iter()
        .map(|slot| {
            if let Some(cluster) = *slot {
                previous = cluster;
            }
            previous
        })
        .collect();

    // Renumber trees by first appearance
    let mut renumber = vec![usize::MAX; clusters.len()];
    let mut order = Vec::with_capacity(clusters.len());
    for &cluster in &filled {
        if renumber[cluster] == usize::MAX {
            renumber[cluster] = order.len();
            order.push(cluster);
        }
    }
    let map = filled.iter().map(|&cluster| renumber[cluster] as u8).collect();
    let cost = costs.iter().sum();
    let histograms = order.into_iter().map(|cluster| clusters[cluster].clone()).collect();

    Clustering { map, histograms, cost }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Command;

    fn literal_plan(data: &[u8]) -> MetaBlockPlan {
        MetaBlockPlan { start: 0, len: data.len(), commands: vec![Command::insert_only(data.len() as u32)] }
    }

    fn histogram_of(symbols: &[usize], alphabet: usize) -> Histogram {
        let mut h = Histogram::new(alphabet);
        for &s in symbols {
            h.add(s);
        }
        h
    }

    #[test]
    fn test_clustering_respects_budget() {
        let histograms: Vec<Histogram> =
            (0..64).map(|i| histogram_of(&vec![i * 4; 50 + i], 256)).collect();
        for budget in [1, 2, 8, 64] {
            let clustering = cluster_histograms(&histograms, budget, 256);
            assert!(clustering.histograms.len() <= budget);
            assert_eq!(clustering.map.len(), 64);
            assert!(clustering.map.iter().all(|&t| (t as usize) < clustering.histograms.len()));
            let total: u64 = clustering.histograms.iter().map(Histogram::total).sum();
            assert_eq!(total, histograms.iter().map(Histogram::total).sum::<u64>());
        }
    }

    #[test]
    fn test_identical_contexts_merge() {
        let same = histogram_of(&[1, 2, 3, 1, 2, 3, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9], 256);
        let histograms = vec![same.clone(), same.clone(), same];
        let clustering = cluster_histograms(&histograms, 64, 256);
        assert_eq!(clustering.histograms.len(), 1);
        assert_eq!(clustering.map, vec![0, 0, 0]);
    }

    #[test]
    fn test_empty_contexts_inherit() {
        let mut histograms = vec![Histogram::new(52); 4];
        histograms[1] = histogram_of(&[5; 40], 52);
        histograms[3] = histogram_of(&[30; 40], 52);
        let clustering = cluster_histograms(&histograms, 4, 52);
        assert_eq!(clustering.map, vec![0, 0, 0, 1]);

        let empty = cluster_histograms(&vec![Histogram::new(52); 4], 4, 52);
        assert_eq!(empty.map, vec![0; 4]);
        assert_eq!(empty.histograms.len(), 1);
    }

    #[test]
    fn test_text_gets_several_trees() {
        let text = "The quick brown fox jumps over the lazy dog. 0123456789 PACK MY BOX\n".repeat(40);
        let data = text.as_bytes();
        let plan = literal_plan(data);
        let settings = QualitySettings::for_quality(9);
        let model = build_context_model(data, &plan, &[], EncoderMode::Text, &settings);
        assert_eq!(model.mode, ContextMode::Utf8);
        assert!(model.num_literal_trees() > 1);
        assert_eq!(model.literal_map.len(), NUM_LITERAL_CONTEXTS);
        assert_eq!(model.distance_map, vec![0; NUM_DISTANCE_CONTEXTS]);
        let counted: u64 = model.literal_histograms.iter().map(Histogram::total).sum();
        assert_eq!(counted, data.len() as u64);
    }

    #[test]
    fn test_low_quality_single_tree() {
        let data = b"abcabcabcabcxyz".to_vec();
        let plan = literal_plan(&data);
        let settings = QualitySettings::for_quality(0);
        let model = build_context_model(&data, &plan, &[], EncoderMode::Font, &settings);
        assert_eq!(model.mode, ContextMode::Lsb6);
        assert_eq!(model.num_literal_trees(), 1);
        assert_eq!(model.num_distance_trees(), 1);
    }

    #[test]
    fn test_distance_contexts() {
        let data = vec![0u8; 64];
        let plan = MetaBlockPlan {
            start: 0,
            len: 64,
            commands: vec![Command::new(1, 2, 1), Command::new(0, 30, 1), Command::new(0, 31, 3)],
        };
        let settings = QualitySettings::for_quality(8);
        let model = build_context_model(&data, &plan, &[4, 0, 6], EncoderMode::Generic, &settings);
        let total: u64 = model.distance_histograms.iter().map(Histogram::total).sum();
        assert_eq!(total, 3);
        assert_eq!(model.distance_tree(2), model.distance_map[0] as usize);
        assert_eq!(model.literal_tree(0, 0), 0);
    }
}
