//! Регрессионное дерево решений — слабая модель для бустинга

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::TrainingError;

/// Узлы с меньшим разбросом целевой переменной не делятся
const MIN_IMPURITY: f64 = 1e-12;

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Дерево с перебором всех порогов (середины между соседними значениями)
/// и критерием суммы квадратов отклонений
#[derive(Debug, Clone)]
pub struct RegressionTree {
    max_depth: usize,
    min_samples_split: usize,
    root: Option<TreeNode>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    pub fn new(max_depth: usize, min_samples_split: usize) -> Self {
        Self {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            root: None,
        }
    }

    /// Обучение с листьями, равными среднему значению
    pub fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<(), TrainingError> {
        self.fit_with_leaf(X, y, |indices| mean_of(y, indices))
    }

    /// Обучение с произвольным расчётом значения в листе
    pub fn fit_with_leaf<F>(
        &mut self,
        X: &Array2<f64>,
        y: &Array1<f64>,
        leaf_value: F,
    ) -> Result<(), TrainingError>
    where
        F: Fn(&[usize]) -> f64,
    {
        if X.nrows() == 0 {
            return Err(TrainingError::EmptyDataset);
        }
        if X.nrows() != y.len() {
            return Err(TrainingError::ShapeMismatch {
                samples: X.nrows(),
                targets: y.len(),
            });
        }

        self.root = Some(self.build_tree(X, y, 0, (0..X.nrows()).collect(), &leaf_value));
        Ok(())
    }

    fn build_tree<F>(
        &self,
        X: &Array2<f64>,
        y: &Array1<f64>,
        depth: usize,
        indices: Vec<usize>,
        leaf_value: &F,
    ) -> TreeNode
    where
        F: Fn(&[usize]) -> f64,
    {
        if depth >= self.max_depth
            || indices.len() < self.min_samples_split
            || sum_squared_error(y, &indices) < MIN_IMPURITY
        {
            return TreeNode::Leaf {
                value: leaf_value(&indices),
            };
        }

        let Some(best) = self.best_split(X, y, &indices) else {
            return TreeNode::Leaf {
                value: leaf_value(&indices),
            };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| X[[i, best.feature]] <= best.threshold);

        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.build_tree(X, y, depth + 1, left_indices, leaf_value)),
            right: Box::new(self.build_tree(X, y, depth + 1, right_indices, leaf_value)),
        }
    }

    fn best_split(&self, X: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Option<BestSplit> {
        let n = indices.len();
        let mut best: Option<BestSplit> = None;

        for feature in 0..X.ncols() {
            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| {
                X[[a, feature]]
                    .partial_cmp(&X[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let total_sum: f64 = sorted.iter().map(|&i| y[i]).sum();
            let total_sq: f64 = sorted.iter().map(|&i| y[i] * y[i]).sum();

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for p in 1..n {
                let prev = sorted[p - 1];
                left_sum += y[prev];
                left_sq += y[prev] * y[prev];

                let lo = X[[prev, feature]];
                let hi = X[[sorted[p], feature]];
                if hi - lo <= f64::EPSILON * lo.abs().max(1.0) {
                    continue;
                }

                let n_left = p as f64;
                let n_right = (n - p) as f64;
                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let score = (left_sq - left_sum * left_sum / n_left)
                    + (right_sq - right_sum * right_sum / n_right);

                if best.as_ref().map_or(true, |b| score < b.score) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (lo + hi) / 2.0,
                        score,
                    });
                }
            }
        }

        best
    }

    pub fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>, TrainingError> {
        let root = self.root.as_ref().ok_or(TrainingError::EmptyDataset)?;
        Ok(X.rows()
            .into_iter()
            .map(|row| Self::predict_single(root, row))
            .collect())
    }

    fn predict_single(node: &TreeNode, sample: ArrayView1<f64>) -> f64 {
        match node {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    Self::predict_single(left, sample)
                } else {
                    Self::predict_single(right, sample)
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map_or(0, walk)
    }
}

fn mean_of(y: &Array1<f64>, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn sum_squared_error(y: &Array1<f64>, indices: &[usize]) -> f64 {
    let mean = mean_of(y, indices);
    indices.iter().map(|&i| (y[i] - mean).powi(2)).sum()
}
