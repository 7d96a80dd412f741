//! Bagged regression trees, the nonlinear benchmark
//!
//! Trained on the same feature set as the augmented linear model so the
//! comparison isolates functional form, not information. Each tree is
//! grown on a bootstrap resample of the window with greedy
//! variance-reduction splits over all features.
//!
//! Determinism: tree `i` draws from its own `StdRng` seeded with
//! `seed + i`, and trees are collected in index order, so a fixed seed
//! yields bit-identical forests regardless of how rayon schedules the
//! per-tree work.

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::{EstimationError, EstimationResult, FittedModel, Forecaster};
use crate::config::ForestConfig;
use crate::domain_types::TableSlice;

/// Forest forecaster; hyperparameters come from `ForestConfig`
#[derive(Debug, Clone)]
pub struct ForestForecaster {
    config: ForestConfig,
}

impl ForestForecaster {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }
}

/// One node of a fitted regression tree
#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single fitted regression tree, nodes stored in a flat arena
#[derive(Debug, Clone)]
struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn predict(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// A fitted forest; the forecast is the mean over trees
#[derive(Debug, Clone)]
pub struct ForestModel {
    trees: Vec<RegressionTree>,
}

impl FittedModel for ForestModel {
    fn predict(&self, features: ArrayView1<'_, f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        sum / self.trees.len() as f64
    }
}

impl Forecaster for ForestForecaster {
    type Fitted = ForestModel;

    fn fit(&self, train: &TableSlice<'_>, feature_ids: &[usize]) -> EstimationResult<ForestModel> {
        let n = train.len();
        let required = 2 * self.config.min_samples_leaf;
        if n < required {
            return Err(EstimationError::DegenerateWindow { rows: n, required });
        }

        let x = train.feature_matrix(feature_ids);
        let y = train.targets().to_owned();
        let config = &self.config;

        let trees: Vec<RegressionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
                build_tree(&x, &y, config, &mut rng)
            })
            .collect();

        Ok(ForestModel { trees })
    }
}

/// Grow one tree on a bootstrap resample
fn build_tree(x: &Array2<f64>, y: &Array1<f64>, config: &ForestConfig, rng: &mut StdRng) -> RegressionTree {
    let n = y.len();
    let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();

    let mut nodes = Vec::new();
    grow(&mut nodes, x, y, sample, 0, config);
    RegressionTree { nodes }
}

/// Recursively grow the subtree for `indices`, returning its node id
fn grow(
    nodes: &mut Vec<Node>,
    x: &Array2<f64>,
    y: &Array1<f64>,
    indices: Vec<usize>,
    depth: usize,
    config: &ForestConfig,
) -> usize {
    let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64;

    // placeholder leaf; replaced below when a split is found
    let node_id = nodes.len();
    nodes.push(Node::Leaf { value: mean });

    if depth >= config.max_depth || indices.len() < 2 * config.min_samples_leaf {
        return node_id;
    }

    if let Some(split) = best_split(x, y, &indices, config.min_samples_leaf) {
        let left = grow(nodes, x, y, split.left, depth + 1, config);
        let right = grow(nodes, x, y, split.right, depth + 1, config);
        nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
    }

    node_id
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Greedy variance-reduction split over all features.
///
/// Maximizing `S_l^2/n_l + S_r^2/n_r` is equivalent to minimizing the
/// summed within-child SSE. Ties keep the first candidate found
/// (lowest feature index, then lowest threshold), so the search order
/// is deterministic.
fn best_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<BestSplit> {
    let n = indices.len();
    let total: f64 = indices.iter().map(|&i| y[i]).sum();
    let parent_score = total * total / n as f64;

    let mut best: Option<(f64, usize, f64)> = None;

    for feature in 0..x.ncols() {
        let mut order = indices.to_vec();
        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut left_sum = 0.0;
        for pos in 0..n - 1 {
            left_sum += y[order[pos]];
            let left_n = pos + 1;
            let right_n = n - left_n;

            let value = x[[order[pos], feature]];
            let next = x[[order[pos + 1], feature]];
            // no threshold separates equal values
            if next <= value {
                continue;
            }
            if left_n < min_samples_leaf || right_n < min_samples_leaf {
                continue;
            }

            let right_sum = total - left_sum;
            let score =
                left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;

            if best.map_or(true, |(s, _, _)| score > s) {
                best = Some((score, feature, 0.5 * (value + next)));
            }
        }
    }

    let (score, feature, threshold) = best?;
    // a split that does not reduce SSE (constant target) stays a leaf
    if score <= parent_score + 1e-12 {
        return None;
    }

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x[[i, feature]] <= threshold);

    Some(BestSplit {
        feature,
        threshold,
        left,
        right,
    })
}
