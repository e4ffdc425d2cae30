//! Binary decision trees
//!
//! One grower serves both tree families. The random forest grows
//! classification trees that minimize Gini impurity and store the fraud rate
//! in each leaf. Gradient boosting grows regression trees on first and
//! second order gradients and stores Newton-step leaf weights.

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum improvement required to accept a split
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
    },
    /// Rows with `row[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Why a persisted node arena cannot be walked safely
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeDefect {
    #[error("has no nodes")]
    Empty,

    #[error("node {node} splits on feature {feature} of {n_features}")]
    FeatureOutOfRange {
        node: usize,
        feature: usize,
        n_features: usize,
    },

    /// Children must come after their parent and inside the arena
    #[error("node {node} links to child {child} in an arena of {len}")]
    BadChild { node: usize, child: usize, len: usize },

    #[error("node {node} holds a non-finite value")]
    NonFinite { node: usize },
}

/// A fitted tree stored as a flat node arena, root at index 0
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Checks the arena over `n_features` inputs.
    ///
    /// Every split must point strictly forward, so a walk from the root
    /// reaches a leaf in at most `node_count` steps.
    pub fn verify(&self, n_features: usize) -> Result<(), TreeDefect> {
        if self.nodes.is_empty() {
            return Err(TreeDefect::Empty);
        }
        let len = self.nodes.len();
        for (node, entry) in self.nodes.iter().enumerate() {
            match *entry {
                Node::Leaf { value } if !value.is_finite() => return Err(TreeDefect::NonFinite { node }),
                Node::Leaf { .. } => {}
                Node::Split { feature, threshold, left, right } => {
                    if feature >= n_features {
                        return Err(TreeDefect::FeatureOutOfRange { node, feature, n_features });
                    }
                    if threshold.is_nan() {
                        return Err(TreeDefect::NonFinite { node });
                    }
                    if let Some(child) = [left, right].into_iter().find(|&c| c <= node || c >= len) {
                        return Err(TreeDefect::BadChild { node, child, len });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split { feature, threshold, left, right }) => {
                    let x = row.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if x <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Multiplies every leaf value, used for boosting shrinkage
    pub(crate) fn scale_leaves(&mut self, factor: f64) {
        for node in &mut self.nodes {
            if let Node::Leaf { value } = node {
                *value *= factor;
            }
        }
    }
}

/// How node quality and leaf values are computed
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Criterion {
    /// Targets are `(1.0, label)`; leaves hold the positive fraction
    Gini,
    /// Targets are `(hessian, gradient)`; leaves hold `-G / (H + lambda)`
    Newton { lambda: f64, min_child_weight: f64 },
}

impl Criterion {
    /// Node quality to maximize. Split gain is `left + right - parent`.
    fn score(&self, (a, b): (f64, f64)) -> f64 {
        match self {
            Criterion::Gini if a > 0.0 => -2.0 * b * (a - b) / a,
            Criterion::Gini => 0.0,
            Criterion::Newton { lambda, .. } => b * b / (a + lambda),
        }
    }

    fn leaf_value(&self, (a, b): (f64, f64)) -> f64 {
        match self {
            Criterion::Gini if a > 0.0 => b / a,
            Criterion::Gini => 0.0,
            Criterion::Newton { lambda, .. } => -b / (a + lambda),
        }
    }

    fn child_allowed(&self, (a, _): (f64, f64)) -> bool {
        match self {
            Criterion::Gini => a > 0.0,
            Criterion::Newton { min_child_weight, .. } => a >= *min_child_weight,
        }
    }

    fn is_pure(&self, (a, b): (f64, f64)) -> bool {
        matches!(self, Criterion::Gini) && (b <= 0.0 || b >= a)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowthLimits {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features drawn per split
    pub max_features: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Grows one tree over a fixed set of rows and per-row targets
pub(crate) struct TreeGrower<'a, R> {
    rows: &'a [Vec<f64>],
    targets: &'a [(f64, f64)],
    criterion: Criterion,
    limits: GrowthLimits,
    rng: R,
    nodes: Vec<Node>,
}

impl<'a, R: Rng> TreeGrower<'a, R> {
    pub(crate) fn new(
        rows: &'a [Vec<f64>],
        targets: &'a [(f64, f64)],
        criterion: Criterion,
        limits: GrowthLimits,
        rng: R,
    ) -> Self {
        Self {
            rows,
            targets,
            criterion,
            limits,
            rng,
            nodes: Vec::new(),
        }
    }

    /// Grows from the given sample indices. Indices may repeat (bootstrap).
    pub(crate) fn grow(mut self, indices: Vec<usize>) -> DecisionTree {
        self.grow_node(indices, 0);
        DecisionTree { nodes: self.nodes }
    }

    fn totals(&self, indices: &[usize]) -> (f64, f64) {
        indices.iter().fold((0.0, 0.0), |(a, b), &i| {
            let (ta, tb) = self.targets[i];
            (a + ta, b + tb)
        })
    }

    fn grow_node(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let totals = self.totals(&indices);
        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: self.criterion.leaf_value(totals),
        });

        let depth_reached = self.limits.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || indices.len() < self.limits.min_samples_split
            || self.criterion.is_pure(totals)
        {
            return node_idx;
        }

        let Some(split) = self.best_split(&indices, totals) else {
            return node_idx;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.rows[i][split.feature] <= split.threshold);
        if left.is_empty() || right.is_empty() {
            return node_idx;
        }

        let left_idx = self.grow_node(left, depth + 1);
        let right_idx = self.grow_node(right, depth + 1);
        self.nodes[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_idx,
            right: right_idx,
        };
        node_idx
    }

    fn best_split(&mut self, indices: &[usize], totals: (f64, f64)) -> Option<BestSplit> {
        let width = self.rows[indices[0]].len();
        let k = self.limits.max_features.clamp(1, width);
        let candidates = index::sample(&mut self.rng, width, k);
        let parent_score = self.criterion.score(totals);

        let mut best: Option<BestSplit> = None;
        let mut sorted = indices.to_vec();

        for feature in candidates.iter() {
            sorted.sort_by(|&i, &j| self.rows[i][feature].total_cmp(&self.rows[j][feature]));

            let mut left = (0.0, 0.0);
            for pos in 0..sorted.len() - 1 {
                let (ta, tb) = self.targets[sorted[pos]];
                left = (left.0 + ta, left.1 + tb);

                let x = self.rows[sorted[pos]][feature];
                let next = self.rows[sorted[pos + 1]][feature];
                if next <= x {
                    continue;
                }

                let right = (totals.0 - left.0, totals.1 - left.1);
                if !self.criterion.child_allowed(left) || !self.criterion.child_allowed(right) {
                    continue;
                }

                let gain = self.criterion.score(left) + self.criterion.score(right) - parent_score;
                if gain <= MIN_SPLIT_GAIN || best.as_ref().is_some_and(|b| gain <= b.gain) {
                    continue;
                }

                let mid = x + (next - x) / 2.0;
                let threshold = if mid < next { mid } else { x };
                best = Some(BestSplit { feature, threshold, gain });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gini_targets(labels: &[bool]) -> Vec<(f64, f64)> {
        labels.iter().map(|&y| (1.0, if y { 1.0 } else { 0.0 })).collect()
    }

    fn limits(max_depth: Option<usize>, width: usize) -> GrowthLimits {
        GrowthLimits {
            max_depth,
            min_samples_split: 2,
            max_features: width,
        }
    }

    #[test]
    fn test_gini_tree_separates_threshold() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let labels: Vec<bool> = (0..10).map(|i| i >= 6).collect();
        let targets = gini_targets(&labels);

        let tree = TreeGrower::new(&rows, &targets, Criterion::Gini, limits(None, 1), StdRng::seed_from_u64(1))
            .grow((0..10).collect());

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.predict(&[2.0]), 0.0);
        assert_eq!(tree.predict(&[5.6]), 1.0);
        assert_eq!(tree.predict(&[9.0]), 1.0);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let rows = vec![vec![1.0], vec![2.0]];
        let targets = gini_targets(&[true, true]);
        let tree = TreeGrower::new(&rows, &targets, Criterion::Gini, limits(None, 1), StdRng::seed_from_u64(1))
            .grow(vec![0, 1]);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&[0.0]), 1.0);
    }

    #[test]
    fn test_depth_limit_respected() {
        let rows: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let labels: Vec<bool> = (0..32).map(|i| i % 2 == 0).collect();
        let targets = gini_targets(&labels);
        let tree = TreeGrower::new(&rows, &targets, Criterion::Gini, limits(Some(3), 1), StdRng::seed_from_u64(1))
            .grow((0..32).collect());
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn test_newton_leaf_weights() {
        // gradient p - y at p = 0.5, hessian 0.25
        let rows = vec![vec![0.0], vec![0.0], vec![1.0], vec![1.0]];
        let targets = vec![(0.25, 0.5), (0.25, 0.5), (0.25, -0.5), (0.25, -0.5)];
        let criterion = Criterion::Newton { lambda: 1.0, min_child_weight: 0.0 };
        let tree = TreeGrower::new(&rows, &targets, criterion, limits(Some(1), 1), StdRng::seed_from_u64(1))
            .grow(vec![0, 1, 2, 3]);

        // -G / (H + lambda) = -1.0 / 1.5 on the left, +1.0 / 1.5 on the right
        assert!((tree.predict(&[0.0]) + 1.0 / 1.5).abs() < 1e-12);
        assert!((tree.predict(&[1.0]) - 1.0 / 1.5).abs() < 1e-12);
    }

    fn arena(nodes: Vec<Node>) -> DecisionTree {
        DecisionTree { nodes }
    }

    fn split(feature: usize, left: usize, right: usize) -> Node {
        Node::Split { feature, threshold: 0.0, left, right }
    }

    #[test]
    fn test_grown_tree_verifies() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let labels: Vec<bool> = (0..20).map(|i| i % 4 == 0).collect();
        let targets = gini_targets(&labels);
        let tree = TreeGrower::new(&rows, &targets, Criterion::Gini, limits(None, 2), StdRng::seed_from_u64(3))
            .grow((0..20).collect());
        assert_eq!(tree.verify(2), Ok(()));
    }

    #[test]
    fn test_self_loop_rejected() {
        let tree = arena(vec![split(0, 0, 0)]);
        assert_eq!(tree.verify(9), Err(TreeDefect::BadChild { node: 0, child: 0, len: 1 }));
    }

    #[test]
    fn test_back_edge_rejected() {
        let leaf = Node::Leaf { value: 0.5 };
        let tree = arena(vec![split(0, 1, 2), split(0, 0, 2), leaf]);
        assert_eq!(tree.verify(9), Err(TreeDefect::BadChild { node: 1, child: 0, len: 3 }));
    }

    #[test]
    fn test_child_past_arena_rejected() {
        let leaf = Node::Leaf { value: 0.5 };
        let tree = arena(vec![split(0, 1, 7), leaf]);
        assert!(matches!(tree.verify(9), Err(TreeDefect::BadChild { child: 7, .. })));
    }

    #[test]
    fn test_feature_out_of_range_rejected() {
        let leaf = Node::Leaf { value: 0.5 };
        let tree = arena(vec![split(9, 1, 2), leaf.clone(), leaf]);
        assert_eq!(
            tree.verify(9),
            Err(TreeDefect::FeatureOutOfRange { node: 0, feature: 9, n_features: 9 })
        );
    }

    #[test]
    fn test_empty_and_non_finite_rejected() {
        assert_eq!(arena(Vec::new()).verify(9), Err(TreeDefect::Empty));
        let tree = arena(vec![Node::Leaf { value: f64::NAN }]);
        assert_eq!(tree.verify(9), Err(TreeDefect::NonFinite { node: 0 }));
    }

    #[test]
    fn test_min_child_weight_blocks_split() {
        let rows = vec![vec![0.0], vec![1.0]];
        let targets = vec![(0.25, 0.5), (0.25, -0.5)];
        let criterion = Criterion::Newton { lambda: 1.0, min_child_weight: 1.0 };
        let tree = TreeGrower::new(&rows, &targets, criterion, limits(Some(6), 1), StdRng::seed_from_u64(1))
            .grow(vec![0, 1]);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_serde_round_trip_preserves_predictions() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 * 0.37, (i % 3) as f64]).collect();
        let labels: Vec<bool> = (0..20).map(|i| i % 3 == 0 || i > 15).collect();
        let targets = gini_targets(&labels);
        let tree = TreeGrower::new(&rows, &targets, Criterion::Gini, limits(None, 2), StdRng::seed_from_u64(3))
            .grow((0..20).collect());

        let json = serde_json::to_string(&tree).unwrap();
        let restored: DecisionTree = serde_json::from_str(&json).unwrap();
        for row in &rows {
            assert_eq!(tree.predict(row).to_bits(), restored.predict(row).to_bits());
        }
    }
}
