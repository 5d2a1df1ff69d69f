//! Random-forest inference and fitting.
//!
//! Trees are stored as flat node arrays with the root at index 0, which keeps
//! the serialized bundle compact and makes traversal a simple index walk.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::PredictionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Samples with `features[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class probabilities for classifiers, a single mean for regressors.
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn from_nodes(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn leaf(&self, features: &[f64]) -> Result<&[f64], PredictionError> {
        let mut idx = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx) {
                None => {
                    return Err(PredictionError::MalformedTree(format!(
                        "node {} out of range",
                        idx
                    )))
                }
                Some(TreeNode::Leaf { value }) => return Ok(value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or(PredictionError::FeatureMismatch {
                        expected: feature + 1,
                        actual: features.len(),
                    })?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
            }
        }
        Err(PredictionError::MalformedTree("cycle detected".to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 12,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    pub fn new(n_classes: usize, trees: Vec<DecisionTree>) -> Self {
        Self { n_classes, trees }
    }

    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Self {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let max_features = ((width as f64).sqrt() as usize).max(1);
        let target = Target::Classes { labels, n_classes };
        let trees = (0..params.n_estimators.max(1))
            .map(|_| grow_tree(rows, &target, params, max_features, rng))
            .collect();
        Self { n_classes, trees }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the per-tree class distributions.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if self.trees.is_empty() {
            return Err(PredictionError::MalformedTree("forest has no trees".to_string()));
        }

        let mut totals = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.leaf(row)?;
            if leaf.len() != self.n_classes {
                return Err(PredictionError::MalformedTree(format!(
                    "leaf has {} classes, expected {}",
                    leaf.len(),
                    self.n_classes
                )));
            }
            for (total, value) in totals.iter_mut().zip(leaf) {
                *total += value;
            }
        }

        let count = self.trees.len() as f64;
        Ok(totals.into_iter().map(|total| total / count).collect())
    }

    /// Winning class index (first on ties) and the full distribution.
    pub fn predict(&self, row: &[f64]) -> Result<(usize, Vec<f64>), PredictionError> {
        let probabilities = self.predict_proba(row)?;
        let mut best = 0usize;
        for (idx, value) in probabilities.iter().enumerate() {
            if *value > probabilities[best] {
                best = idx;
            }
        }
        Ok((best, probabilities))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTree>,
}

impl RandomForestRegressor {
    pub fn new(trees: Vec<DecisionTree>) -> Self {
        Self { trees }
    }

    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Self {
        let width = rows.first().map(Vec::len).unwrap_or(0).max(1);
        let target = Target::Values(targets);
        let trees = (0..params.n_estimators.max(1))
            .map(|_| grow_tree(rows, &target, params, width, rng))
            .collect();
        Self { trees }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn predict(&self, row: &[f64]) -> Result<f64, PredictionError> {
        if self.trees.is_empty() {
            return Err(PredictionError::MalformedTree("forest has no trees".to_string()));
        }

        let mut total = 0.0;
        for tree in &self.trees {
            let leaf = tree.leaf(row)?;
            total += leaf.first().ok_or_else(|| {
                PredictionError::MalformedTree("empty regression leaf".to_string())
            })?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

enum Target<'a> {
    Classes { labels: &'a [usize], n_classes: usize },
    Values(&'a [f64]),
}

impl Target<'_> {
    fn leaf_value(&self, samples: &[usize]) -> Vec<f64> {
        match self {
            Target::Classes { labels, n_classes } => {
                let counts = class_counts(labels, *n_classes, samples);
                let total = samples.len().max(1) as f64;
                counts.into_iter().map(|count| count as f64 / total).collect()
            }
            Target::Values(values) => {
                let total: f64 = samples.iter().map(|&idx| values[idx]).sum();
                vec![total / samples.len().max(1) as f64]
            }
        }
    }

    fn is_pure(&self, samples: &[usize]) -> bool {
        match self {
            Target::Classes { labels, .. } => samples
                .windows(2)
                .all(|pair| labels[pair[0]] == labels[pair[1]]),
            Target::Values(values) => samples
                .windows(2)
                .all(|pair| values[pair[0]] == values[pair[1]]),
        }
    }

    /// Impurity of the node scaled by its sample count.
    fn impurity_mass(&self, samples: &[usize]) -> f64 {
        match self {
            Target::Classes { labels, n_classes } => {
                gini_mass(&class_counts(labels, *n_classes, samples), samples.len())
            }
            Target::Values(values) => {
                let (sum, sum_sq) = samples.iter().fold((0.0, 0.0), |(sum, sum_sq), &idx| {
                    (sum + values[idx], sum_sq + values[idx] * values[idx])
                });
                squared_error_mass(sum, sum_sq, samples.len())
            }
        }
    }

    /// Best threshold on `feature`; `order` must be sorted by that feature.
    fn best_threshold(&self, rows: &[Vec<f64>], order: &[usize], feature: usize) -> Option<Split> {
        let n = order.len();
        if n < 2 {
            return None;
        }
        let mut best: Option<Split> = None;
        let mut consider = |impurity: f64, pos: usize| {
            let current = rows[order[pos]][feature];
            let next = rows[order[pos + 1]][feature];
            if next <= current {
                return;
            }
            if best.as_ref().map_or(true, |split| impurity < split.impurity) {
                best = Some(Split {
                    feature,
                    threshold: midpoint(current, next),
                    impurity,
                });
            }
        };

        match self {
            Target::Classes { labels, n_classes } => {
                let mut left = vec![0usize; *n_classes];
                let mut right = class_counts(labels, *n_classes, order);
                for pos in 0..n - 1 {
                    let label = labels[order[pos]];
                    left[label] += 1;
                    right[label] -= 1;
                    let n_left = pos + 1;
                    let impurity = gini_mass(&left, n_left) + gini_mass(&right, n - n_left);
                    consider(impurity, pos);
                }
            }
            Target::Values(values) => {
                let (total, total_sq) = order.iter().fold((0.0, 0.0), |(sum, sum_sq), &idx| {
                    (sum + values[idx], sum_sq + values[idx] * values[idx])
                });
                let (mut left_sum, mut left_sq) = (0.0, 0.0);
                for pos in 0..n - 1 {
                    let value = values[order[pos]];
                    left_sum += value;
                    left_sq += value * value;
                    let n_left = pos + 1;
                    let impurity = squared_error_mass(left_sum, left_sq, n_left)
                        + squared_error_mass(total - left_sum, total_sq - left_sq, n - n_left);
                    consider(impurity, pos);
                }
            }
        }

        best
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    target: &'a Target<'a>,
    params: &'a ForestParams,
    max_features: usize,
    rng: &'a mut StdRng,
    nodes: Vec<TreeNode>,
}

fn grow_tree(
    rows: &[Vec<f64>],
    target: &Target<'_>,
    params: &ForestParams,
    max_features: usize,
    rng: &mut StdRng,
) -> DecisionTree {
    let n = rows.len();
    if n == 0 {
        return DecisionTree::from_nodes(vec![TreeNode::Leaf {
            value: target.leaf_value(&[]),
        }]);
    }

    let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
    let mut builder = TreeBuilder {
        rows,
        target,
        params,
        max_features,
        rng,
        nodes: Vec::new(),
    };
    builder.grow(bootstrap, 0);
    DecisionTree::from_nodes(builder.nodes)
}

impl TreeBuilder<'_> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            value: self.target.leaf_value(&samples),
        });

        if samples.len() < self.params.min_samples_split.max(2)
            || depth >= self.params.max_depth
            || self.target.is_pure(&samples)
        {
            return id;
        }

        let Some(split) = self.best_split(&samples) else {
            return id;
        };

        let rows = self.rows;
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&idx| rows[idx][split.feature] <= split.threshold);
        if left.is_empty() || right.is_empty() {
            return id;
        }

        let left_id = self.grow(left, depth + 1);
        let right_id = self.grow(right, depth + 1);
        self.nodes[id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_id,
            right: right_id,
        };
        id
    }

    fn best_split(&mut self, samples: &[usize]) -> Option<Split> {
        let width = self.rows.first().map(Vec::len).unwrap_or(0);
        let mut features: Vec<usize> = (0..width).collect();
        features.shuffle(&mut *self.rng);

        let parent = self.target.impurity_mass(samples);
        let mut best: Option<Split> = None;

        for &feature in features.iter().take(self.max_features) {
            let mut order = samples.to_vec();
            order.sort_by(|&a, &b| {
                self.rows[a][feature]
                    .partial_cmp(&self.rows[b][feature])
                    .unwrap_or(Ordering::Equal)
            });

            let Some(candidate) = self.target.best_threshold(self.rows, &order, feature) else {
                continue;
            };
            let bar = best.as_ref().map_or(parent - 1e-12, |split| split.impurity);
            if candidate.impurity < bar {
                best = Some(candidate);
            }
        }

        best
    }
}

fn class_counts(labels: &[usize], n_classes: usize, samples: &[usize]) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &idx in samples {
        if let Some(count) = counts.get_mut(labels[idx]) {
            *count += 1;
        }
    }
    counts
}

fn gini_mass(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let sum_sq: f64 = counts.iter().map(|&count| (count as f64) * (count as f64)).sum();
    total - sum_sq / total
}

fn squared_error_mass(sum: f64, sum_sq: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (sum_sq - sum * sum / count as f64).max(0.0)
}

fn midpoint(low: f64, high: f64) -> f64 {
    let mid = low + (high - low) / 2.0;
    if mid >= high {
        low
    } else {
        mid
    }
}
