//! Histogram-based gradient boosting regression
//!
//! - Features are pre-binned into at most `max_bins` quantile bins (u8 codes)
//! - Trees grow leaf-wise (best-first) up to `max_leaf_nodes` leaves
//! - Split gain and leaf values come from per-bin gradient histograms; the
//!   larger child's histogram is derived by subtraction from its parent
//! - Squared-error loss, mean baseline, no early stopping

use crate::pipeline::Regressor;
use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HgbrConfig {
    pub learning_rate: f64,
    /// Boosting rounds
    pub max_iter: usize,
    pub max_leaf_nodes: usize,
    pub min_samples_leaf: usize,
    pub l2_regularization: f64,
    /// Upper bound on bins per feature (at most 255)
    pub max_bins: usize,
}

impl Default for HgbrConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iter: 100,
            max_leaf_nodes: 31,
            min_samples_leaf: 20,
            l2_regularization: 0.0,
            max_bins: 255,
        }
    }
}

impl HgbrConfig {
    fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: String, reason: &str| PredictorError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.to_string(),
        };
        if !(self.learning_rate > 0.0) {
            return Err(invalid("learning_rate", self.learning_rate.to_string(), "must be positive"));
        }
        if self.max_iter == 0 {
            return Err(invalid("max_iter", "0".into(), "must be at least 1"));
        }
        if self.max_leaf_nodes < 2 {
            return Err(invalid("max_leaf_nodes", self.max_leaf_nodes.to_string(), "must be at least 2"));
        }
        if self.min_samples_leaf == 0 {
            return Err(invalid("min_samples_leaf", "0".into(), "must be at least 1"));
        }
        if self.l2_regularization < 0.0 {
            return Err(invalid(
                "l2_regularization",
                self.l2_regularization.to_string(),
                "must be non-negative",
            ));
        }
        if !(2..=255).contains(&self.max_bins) {
            return Err(invalid("max_bins", self.max_bins.to_string(), "must be in 2..=255"));
        }
        Ok(())
    }
}

/// Per-feature ascending cut points. Bin `b` holds values in `(t[b-1], t[b]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinMapper {
    thresholds: Vec<Vec<f64>>,
}

impl BinMapper {
    fn fit(x: &Array2<f64>, max_bins: usize) -> Self {
        let thresholds = (0..x.ncols())
            .into_par_iter()
            .map(|f| {
                let mut values: Vec<f64> = x.column(f).iter().copied().filter(|v| !v.is_nan()).collect();
                values.sort_by(f64::total_cmp);
                let mut distinct = values.clone();
                distinct.dedup();

                if distinct.len() <= max_bins {
                    distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
                } else {
                    let n = values.len();
                    let mut cuts: Vec<f64> = (1..max_bins)
                        .map(|q| values[(q * n / max_bins).min(n - 1)])
                        .collect();
                    cuts.dedup();
                    // the maximum must fall into the last bin
                    if cuts.last() == values.last() {
                        cuts.pop();
                    }
                    cuts
                }
            })
            .collect();
        Self { thresholds }
    }

    fn bin(&self, feature: usize, value: f64) -> u8 {
        self.thresholds[feature].partition_point(|t| *t < value) as u8
    }

    fn n_bins(&self, feature: usize) -> usize {
        self.thresholds[feature].len() + 1
    }

    /// Column-major bin codes
    fn transform(&self, x: &Array2<f64>) -> Vec<Vec<u8>> {
        (0..x.ncols())
            .into_par_iter()
            .map(|f| x.column(f).iter().map(|&v| self.bin(f, v)).collect())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct BinStat {
    sum_gradients: f64,
    count: u32,
}

type Histograms = Vec<Vec<BinStat>>;

fn build_histograms(binned: &[Vec<u8>], mapper: &BinMapper, gradients: &[f64], indices: &[usize]) -> Histograms {
    binned
        .par_iter()
        .enumerate()
        .map(|(f, codes)| {
            let mut hist = vec![BinStat::default(); mapper.n_bins(f)];
            for &i in indices {
                let stat = &mut hist[codes[i] as usize];
                stat.sum_gradients += gradients[i];
                stat.count += 1;
            }
            hist
        })
        .collect()
}

fn subtract_histograms(parent: &Histograms, child: &Histograms) -> Histograms {
    parent
        .iter()
        .zip(child)
        .map(|(p, c)| {
            p.iter()
                .zip(c)
                .map(|(a, b)| BinStat {
                    sum_gradients: a.sum_gradients - b.sum_gradients,
                    count: a.count - b.count,
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct SplitInfo {
    gain: f64,
    feature: usize,
    /// Last bin routed left
    bin: u8,
}

fn gain_term(g: f64, n: f64, l2: f64) -> f64 {
    g * g / (n + l2)
}

fn find_best_split(hists: &Histograms, config: &HgbrConfig) -> Option<SplitInfo> {
    let min_leaf = config.min_samples_leaf as u32;
    let l2 = config.l2_regularization;

    let candidates: Vec<Option<SplitInfo>> = hists
        .par_iter()
        .enumerate()
        .map(|(feature, hist)| {
            let total_g: f64 = hist.iter().map(|s| s.sum_gradients).sum();
            let total_n: u32 = hist.iter().map(|s| s.count).sum();
            let parent = gain_term(total_g, total_n as f64, l2);

            let mut left_g = 0.0;
            let mut left_n = 0u32;
            let mut best: Option<SplitInfo> = None;
            for (b, stat) in hist.iter().enumerate().take(hist.len().saturating_sub(1)) {
                left_g += stat.sum_gradients;
                left_n += stat.count;
                let right_n = total_n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }
                let gain = gain_term(left_g, left_n as f64, l2)
                    + gain_term(total_g - left_g, right_n as f64, l2)
                    - parent;
                if gain > 0.0 && best.map_or(true, |s| gain > s.gain) {
                    best = Some(SplitInfo { gain, feature, bin: b as u8 });
                }
            }
            best
        })
        .collect();

    // sequential reduce keeps the lowest feature index on ties
    candidates.into_iter().flatten().fold(None, |acc: Option<SplitInfo>, s| match acc {
        Some(a) if a.gain >= s.gain => Some(a),
        _ => Some(s),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf { value: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Regression tree stored as an arena; node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature, threshold, left, right } => {
                    idx = if sample[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, TreeNode::Leaf { .. })).count()
    }
}

struct PendingSplit {
    split: SplitInfo,
    node_id: usize,
    indices: Vec<usize>,
    hists: Histograms,
}

impl PartialEq for PendingSplit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for PendingSplit {}
impl PartialOrd for PendingSplit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for PendingSplit {
    // highest gain first, then the earliest node
    fn cmp(&self, other: &Self) -> Ordering {
        self.split
            .gain
            .total_cmp(&other.split.gain)
            .then_with(|| other.node_id.cmp(&self.node_id))
    }
}

enum NodeSlot {
    Leaf(Vec<usize>),
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

/// Grow one tree on the current gradients and add its shrunken leaf values
/// to `raw_predictions`.
fn grow_tree(
    binned: &[Vec<u8>],
    mapper: &BinMapper,
    gradients: &[f64],
    raw_predictions: &mut Array1<f64>,
    config: &HgbrConfig,
) -> Tree {
    let n = gradients.len();
    let all: Vec<usize> = (0..n).collect();
    let mut slots: Vec<NodeSlot> = Vec::new();
    let mut heap: BinaryHeap<PendingSplit> = BinaryHeap::new();

    let root_hists = build_histograms(binned, mapper, gradients, &all);
    let consider = |node_id: usize, indices: Vec<usize>, hists: Histograms, heap: &mut BinaryHeap<PendingSplit>| {
        if indices.len() >= 2 * config.min_samples_leaf {
            if let Some(split) = find_best_split(&hists, config) {
                heap.push(PendingSplit { split, node_id, indices, hists });
                return None;
            }
        }
        Some(indices)
    };

    slots.push(NodeSlot::Leaf(Vec::new()));
    if let Some(indices) = consider(0, all, root_hists, &mut heap) {
        slots[0] = NodeSlot::Leaf(indices);
    }

    let mut n_leaves = 1usize;
    while n_leaves < config.max_leaf_nodes {
        let Some(pending) = heap.pop() else { break };
        let SplitInfo { feature, bin, .. } = pending.split;
        let codes = &binned[feature];

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            pending.indices.iter().copied().partition(|&i| codes[i] <= bin);

        let (small, small_is_left) = if left_idx.len() <= right_idx.len() {
            (&left_idx, true)
        } else {
            (&right_idx, false)
        };
        let small_hists = build_histograms(binned, mapper, gradients, small);
        let large_hists = subtract_histograms(&pending.hists, &small_hists);
        let (left_hists, right_hists) = if small_is_left {
            (small_hists, large_hists)
        } else {
            (large_hists, small_hists)
        };

        let left_id = slots.len();
        let right_id = left_id + 1;
        slots.push(NodeSlot::Leaf(Vec::new()));
        slots.push(NodeSlot::Leaf(Vec::new()));
        slots[pending.node_id] = NodeSlot::Split {
            feature,
            threshold: mapper.thresholds[feature][bin as usize],
            left: left_id,
            right: right_id,
        };
        n_leaves += 1;

        if let Some(indices) = consider(left_id, left_idx, left_hists, &mut heap) {
            slots[left_id] = NodeSlot::Leaf(indices);
        }
        if let Some(indices) = consider(right_id, right_idx, right_hists, &mut heap) {
            slots[right_id] = NodeSlot::Leaf(indices);
        }
    }

    // splits never taken become leaves
    for pending in heap.into_vec() {
        slots[pending.node_id] = NodeSlot::Leaf(pending.indices);
    }

    let l2 = config.l2_regularization;
    let nodes = slots
        .into_iter()
        .map(|slot| match slot {
            NodeSlot::Leaf(indices) => {
                let g: f64 = indices.iter().map(|&i| gradients[i]).sum();
                let value = -config.learning_rate * g / (indices.len() as f64 + l2).max(f64::MIN_POSITIVE);
                for &i in &indices {
                    raw_predictions[i] += value;
                }
                TreeNode::Leaf { value }
            }
            NodeSlot::Split { feature, threshold, left, right } => TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            },
        })
        .collect();

    Tree { nodes }
}

/// Gradient-boosted regression trees on binned features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistGradientBoostingRegressor {
    pub config: HgbrConfig,
    baseline: f64,
    trees: Vec<Tree>,
    n_features: Option<usize>,
}

impl HistGradientBoostingRegressor {
    pub fn new(config: HgbrConfig) -> Self {
        Self {
            config,
            baseline: 0.0,
            trees: Vec::new(),
            n_features: None,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn max_leaves(&self) -> usize {
        self.trees.iter().map(Tree::n_leaves).max().unwrap_or(0)
    }

    pub fn is_fitted(&self) -> bool {
        self.n_features.is_some()
    }
}

impl Default for HistGradientBoostingRegressor {
    fn default() -> Self {
        Self::new(HgbrConfig::default())
    }
}

impl Regressor for HistGradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.config.validate()?;
        let n = x.nrows();
        if n == 0 {
            return Err(PredictorError::TrainingError("Empty dataset".into()));
        }
        if y.len() != n {
            return Err(PredictorError::ShapeError {
                expected: format!("{n} targets"),
                actual: format!("{} targets", y.len()),
            });
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(PredictorError::TrainingError("target contains non-finite values".into()));
        }

        let mapper = BinMapper::fit(x, self.config.max_bins);
        let binned = mapper.transform(x);

        self.baseline = y.mean().unwrap_or(0.0);
        self.trees = Vec::with_capacity(self.config.max_iter);
        let mut raw = Array1::from_elem(n, self.baseline);

        for _ in 0..self.config.max_iter {
            let gradients: Vec<f64> = raw.iter().zip(y.iter()).map(|(&p, &t)| p - t).collect();
            let tree = grow_tree(&binned, &mapper, &gradients, &mut raw, &self.config);
            self.trees.push(tree);
        }

        self.n_features = Some(x.ncols());
        tracing::debug!(
            n_samples = n,
            n_features = x.ncols(),
            n_trees = self.trees.len(),
            "Fitted histogram gradient boosting"
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let n_features = self.n_features.ok_or(PredictorError::ModelNotFitted)?;
        if x.ncols() != n_features {
            return Err(PredictorError::ShapeError {
                expected: format!("{n_features} features"),
                actual: format!("{} features", x.ncols()),
            });
        }
        let preds: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row = x.row(i);
                self.baseline + self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
            })
            .collect();
        Ok(Array1::from_vec(preds))
    }
}
