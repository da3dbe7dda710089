//! Random forest over variance-reduction trees.
//!
//! Every tree is grown on a bootstrap resample of the training rows and
//! considers a random subset of features at each split. Regression averages
//! leaf means; classification averages leaf class-1 frequencies (0/1 targets)
//! and thresholds at one half. A feature's importance is the total
//! squared-error reduction of its splits, normalized over all features.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Predictor;

/// How many features each split may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    All,
    Sqrt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Total squared-error reduction of the split
        impurity_decrease: f64,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Split candidate: (feature, threshold, impurity decrease).
type SplitChoice = (usize, f64, f64);

struct Grower<'a, R: Rng + ?Sized> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    params: &'a ForestParams,
    n_candidates: usize,
    rng: &'a mut R,
    nodes: Vec<Node>,
}

impl<R: Rng + ?Sized> Grower<'_, R> {
    fn grow(&mut self, indices: &[usize], depth: usize) -> usize {
        let leaf = mean(self.targets, indices);

        let pure = indices
            .iter()
            .all(|&i| (self.targets[i] - self.targets[indices[0]]).abs() < 1e-12);
        if depth >= self.params.max_depth
            || indices.len() < 2 * self.params.min_samples_leaf.max(1)
            || pure
        {
            return self.push(Node::Leaf { value: leaf });
        }

        let n_features = self.rows[0].len();
        let candidates = index::sample(&mut *self.rng, n_features, self.n_candidates).into_vec();
        let Some((feature, threshold, decrease)) = self.best_split(indices, &candidates) else {
            return self.push(Node::Leaf { value: leaf });
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.rows[i][feature] <= threshold);

        let node = self.push(Node::Leaf { value: leaf });
        let left = self.grow(&left_idx, depth + 1);
        let right = self.grow(&right_idx, depth + 1);
        self.nodes[node] = Node::Split {
            feature,
            threshold,
            left,
            right,
            impurity_decrease: decrease,
        };
        node
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Best threshold by total squared-error reduction.
    fn best_split(&self, indices: &[usize], candidates: &[usize]) -> Option<SplitChoice> {
        let n = indices.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<SplitChoice> = None;

        for &feature in candidates {
            let mut pairs: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (self.rows[i][feature], self.targets[i]))
                .collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let total: f64 = pairs.iter().map(|p| p.1).sum();
            let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();
            let parent_sse = total_sq - total * total / n as f64;

            let (mut left_sum, mut left_sq) = (0.0, 0.0);
            for i in 0..n - 1 {
                left_sum += pairs[i].1;
                left_sq += pairs[i].1 * pairs[i].1;

                if pairs[i].0 == pairs[i + 1].0 {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let right_sq = total_sq - left_sq;
                let sse = (left_sq - left_sum * left_sum / n_left as f64)
                    + (right_sq - right_sum * right_sum / n_right as f64);
                let decrease = parent_sse - sse;

                if decrease > 1e-12 && best.map_or(true, |b| decrease > b.2) {
                    best = Some((feature, (pairs[i].0 + pairs[i + 1].0) / 2.0, decrease));
                }
            }
        }
        best
    }
}

fn mean(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64
}

/// Bagged ensemble of variance-reduction trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<Tree>,
    importances: Vec<f64>,
    classify: bool,
}

impl RandomForest {
    /// Fit on scaled rows. `classify` expects 0/1 targets.
    pub fn fit<R: Rng + ?Sized>(
        rows: &[Vec<f64>],
        targets: &[f64],
        params: &ForestParams,
        classify: bool,
        rng: &mut R,
    ) -> Self {
        let n = rows.len();
        let n_features = rows.first().map_or(0, Vec::len);
        let n_candidates = match params.max_features {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor().max(1.0) as usize,
        }
        .min(n_features);

        let mut trees = Vec::with_capacity(params.n_estimators);
        for _ in 0..params.n_estimators {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut grower = Grower {
                rows,
                targets,
                params,
                n_candidates,
                rng: &mut *rng,
                nodes: Vec::new(),
            };
            grower.grow(&bootstrap, 0);
            trees.push(Tree {
                nodes: grower.nodes,
            });
        }

        let importances = compute_importances(&trees, n_features);
        Self {
            trees,
            importances,
            classify,
        }
    }

    /// Average of tree outputs (class-1 frequency when classifying).
    pub fn mean_output(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for RandomForest {
    fn predict(&self, row: &[f64]) -> f64 {
        let out = self.mean_output(row);
        if self.classify {
            if out > 0.5 {
                1.0
            } else {
                0.0
            }
        } else {
            out
        }
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(self.importances.clone())
    }
}

/// Impurity decrease per feature, normalized to sum to 1. Each decrease is
/// already summed over the node's rows, so it carries the node-size weight.
fn compute_importances(trees: &[Tree], n_features: usize) -> Vec<f64> {
    let mut importance = vec![0.0; n_features];
    for tree in trees {
        for node in &tree.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                importance[*feature] += impurity_decrease;
            }
        }
    }

    let total: f64 = importance.iter().sum();
    if total > 0.0 {
        importance.iter_mut().for_each(|v| *v /= total);
    }
    importance
}
