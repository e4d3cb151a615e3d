//! Gradient-boosted regression trees for squared error.
//!
//! Depth-limited exact-split trees fit to residuals, with shrinkage and
//! optional seeded row subsampling. Kept deliberately compact: the pipeline
//! treats this as one interchangeable implementation of `TabularRegressor`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::models::matrix::FeatureMatrix;
use crate::models::traits::{
    FittedRegressor, ModelError, Result, TabularRegressor,
};
use crate::models::tuning::{grid_search, ParamGrid};

/// Boosting hyperparameters, the axes of the search grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbtParams {
    pub n_trees: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Fraction of rows drawn (without replacement) per tree.
    pub subsample: f64,
}

impl Default for GbtParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 1.0,
        }
    }
}

impl GbtParams {
    fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(ModelError::InvalidParameter("n_trees must be positive".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ModelError::InvalidParameter(
                "learning_rate must be in (0, 1]".into(),
            ));
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidParameter("max_depth must be positive".into()));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ModelError::InvalidParameter(
                "subsample must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// The gradient-boosted-tree fitter.
#[derive(Debug, Clone)]
pub struct Gbt {
    seed: u64,
}

impl Default for Gbt {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl Gbt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl TabularRegressor for Gbt {
    fn name(&self) -> &str {
        "gbt"
    }

    fn search_best(
        &self,
        x: &FeatureMatrix,
        y: &[f64],
        grid: &ParamGrid,
        cv_folds: usize,
    ) -> Result<GbtParams> {
        grid_search(self, x, y, grid, cv_folds)
    }

    fn fit(
        &self,
        x: &FeatureMatrix,
        y: &[f64],
        params: &GbtParams,
    ) -> Result<Box<dyn FittedRegressor>> {
        Ok(Box::new(fit_gbt(x, y, params, self.seed)?))
    }
}

/// A fitted boosted ensemble.
#[derive(Debug, Clone)]
pub struct GbtModel {
    base: f64,
    learning_rate: f64,
    trees: Vec<Tree>,
}

impl FittedRegressor for GbtModel {
    fn predict(&self, x: &FeatureMatrix) -> Vec<f64> {
        (0..x.n_rows())
            .map(|i| {
                let row = x.row(i);
                let mut value = self.base;
                for tree in &self.trees {
                    value += self.learning_rate * tree.predict(row);
                }
                value
            })
            .collect()
    }
}

fn fit_gbt(x: &FeatureMatrix, y: &[f64], params: &GbtParams, seed: u64) -> Result<GbtModel> {
    params.validate()?;
    let n = x.n_rows();
    if y.len() != n {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            got: y.len(),
        });
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::Computation(
            "targets contain non-finite values".into(),
        ));
    }

    let base = y.iter().sum::<f64>() / n as f64;
    let mut preds = vec![base; n];
    let mut trees = Vec::with_capacity(params.n_trees);
    let mut rng = StdRng::seed_from_u64(seed);

    for _ in 0..params.n_trees {
        let residuals: Vec<f64> = y.iter().zip(&preds).map(|(yi, pi)| yi - pi).collect();
        let rows = sample_rows(n, params.subsample, &mut rng);
        let tree = Tree::fit(x, &residuals, rows, params.max_depth);
        for (i, pred) in preds.iter_mut().enumerate() {
            *pred += params.learning_rate * tree.predict(x.row(i));
        }
        trees.push(tree);
    }

    Ok(GbtModel {
        base,
        learning_rate: params.learning_rate,
        trees,
    })
}

/// Row indices for one tree; sorted so tree construction is deterministic.
fn sample_rows(n: usize, subsample: f64, rng: &mut StdRng) -> Vec<usize> {
    if subsample >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64 * subsample).ceil() as usize).clamp(1, n);
    let mut rows = rand::seq::index::sample(rng, n, k).into_vec();
    rows.sort_unstable();
    rows
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Branch {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn fit(x: &FeatureMatrix, targets: &[f64], rows: Vec<usize>, max_depth: usize) -> Self {
        let mut tree = Tree { nodes: Vec::new() };
        tree.grow(x, targets, rows, max_depth);
        tree
    }

    fn grow(
        &mut self,
        x: &FeatureMatrix,
        targets: &[f64],
        rows: Vec<usize>,
        depth_left: usize,
    ) -> usize {
        let mean = rows.iter().map(|&i| targets[i]).sum::<f64>() / rows.len() as f64;
        if depth_left == 0 || rows.len() < 2 {
            return self.push(Node::Leaf { value: mean });
        }

        let split = match best_split(x, targets, &rows) {
            Some(s) => s,
            None => return self.push(Node::Leaf { value: mean }),
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| x.row(i)[split.feature] <= split.threshold);

        let left = self.grow(x, targets, left_rows, depth_left - 1);
        let right = self.grow(x, targets, right_rows, depth_left - 1);
        self.push(Node::Branch {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        })
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn predict(&self, row: &[f64]) -> f64 {
        // Root is the last node pushed.
        let mut idx = self.nodes.len() - 1;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Branch {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
}

/// Exact best split over all features, minimizing child SSE.
fn best_split(x: &FeatureMatrix, targets: &[f64], rows: &[usize]) -> Option<SplitChoice> {
    let total: f64 = rows.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = rows.iter().map(|&i| targets[i] * targets[i]).sum();
    let n = rows.len() as f64;
    let parent_sse = total_sq - total * total / n;

    let mut best: Option<(f64, SplitChoice)> = None;
    for feature in 0..x.n_cols() {
        let mut pairs: Vec<(f64, f64)> = rows
            .iter()
            .map(|&i| (x.row(i)[feature], targets[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for i in 1..pairs.len() {
            left_sum += pairs[i - 1].1;
            left_sq += pairs[i - 1].1 * pairs[i - 1].1;
            if pairs[i - 1].0 == pairs[i].0 {
                continue; // cannot separate equal values
            }
            let nl = i as f64;
            let nr = n - nl;
            let right_sum = total - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / nl)
                + (right_sq - right_sum * right_sum / nr);
            let gain = parent_sse - sse;
            if gain > 1e-12 && best.as_ref().map_or(true, |(g, _)| gain > *g) {
                best = Some((
                    gain,
                    SplitChoice {
                        feature,
                        threshold: (pairs[i - 1].0 + pairs[i].0) / 2.0,
                    },
                ));
            }
        }
    }
    best.map(|(_, choice)| choice)
}
