//! Градиентный бустинг над регрессионными деревьями
//!
//! Регрессор минимизирует квадратичную ошибку, классификатор —
//! мультиномиальную логистическую функцию потерь (K деревьев на стадию,
//! значения листьев — шаг Ньютона).

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, Axis};

use super::tree::RegressionTree;
use crate::config::BoostingParams;
use crate::error::TrainingError;

const MIN_SAMPLES_SPLIT: usize = 2;
const MIN_PROBABILITY: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct GradientBoostingRegressor {
    params: BoostingParams,
    init_prediction: f64,
    estimators: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            init_prediction: 0.0,
            estimators: Vec::new(),
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<(), TrainingError> {
        check_shape(X, y.len())?;

        self.init_prediction = y.mean().ok_or(TrainingError::EmptyDataset)?;
        self.estimators = Vec::with_capacity(self.params.n_estimators);

        let mut raw = Array1::from_elem(X.nrows(), self.init_prediction);
        for _ in 0..self.params.n_estimators {
            let residuals = y - &raw;

            let mut tree = RegressionTree::new(self.params.max_depth, MIN_SAMPLES_SPLIT);
            tree.fit(X, &residuals)?;
            raw.scaled_add(self.params.learning_rate, &tree.predict(X)?);

            self.estimators.push(tree);
        }

        Ok(())
    }

    pub fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>, TrainingError> {
        if self.estimators.is_empty() && self.params.n_estimators > 0 {
            return Err(TrainingError::EmptyDataset);
        }

        let mut raw = Array1::from_elem(X.nrows(), self.init_prediction);
        for tree in &self.estimators {
            raw.scaled_add(self.params.learning_rate, &tree.predict(X)?);
        }
        Ok(raw)
    }

    pub fn n_estimators(&self) -> usize {
        self.estimators.len()
    }
}

#[derive(Debug, Clone)]
pub struct GradientBoostingClassifier {
    params: BoostingParams,
    n_classes: usize,
    /// Логарифмы априорных вероятностей классов
    init_prediction: Array1<f64>,
    /// Для каждой стадии — по дереву на класс
    estimators: Vec<Vec<RegressionTree>>,
    is_trained: bool,
}

impl GradientBoostingClassifier {
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            n_classes: 0,
            init_prediction: Array1::zeros(0),
            estimators: Vec::new(),
            is_trained: false,
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<(), TrainingError> {
        check_shape(X, y.len())?;
        if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
            return Err(TrainingError::DegenerateLabels {
                label,
                classes: n_classes,
            });
        }

        let n_samples = X.nrows();
        self.n_classes = n_classes;
        self.estimators = Vec::with_capacity(self.params.n_estimators);

        let mut counts = vec![0usize; n_classes];
        for &label in y {
            counts[label] += 1;
        }
        self.init_prediction = counts
            .iter()
            .map(|&c| (c as f64 / n_samples as f64).max(MIN_PROBABILITY).ln())
            .collect();
        self.is_trained = true;

        // Один класс: предсказание постоянно, деревья не нужны
        if n_classes < 2 {
            return Ok(());
        }

        let mut raw = Array2::zeros((n_samples, n_classes));
        for mut row in raw.rows_mut() {
            row.assign(&self.init_prediction);
        }

        let k_factor = (n_classes as f64 - 1.0) / n_classes as f64;

        for _ in 0..self.params.n_estimators {
            let probabilities = softmax_rows(&raw);
            let mut stage = Vec::with_capacity(n_classes);

            for class in 0..n_classes {
                let residuals: Array1<f64> = y
                    .iter()
                    .enumerate()
                    .map(|(i, &label)| {
                        let target = if label == class { 1.0 } else { 0.0 };
                        target - probabilities[[i, class]]
                    })
                    .collect();

                let mut tree = RegressionTree::new(self.params.max_depth, MIN_SAMPLES_SPLIT);
                tree.fit_with_leaf(X, &residuals, |indices| {
                    let numerator: f64 = indices.iter().map(|&i| residuals[i]).sum();
                    let denominator: f64 = indices
                        .iter()
                        .map(|&i| residuals[i].abs() * (1.0 - residuals[i].abs()))
                        .sum();
                    if denominator.abs() < 1e-150 {
                        0.0
                    } else {
                        k_factor * numerator / denominator
                    }
                })?;
                stage.push(tree);
            }

            for (class, tree) in stage.iter().enumerate() {
                let update = tree.predict(X)?;
                raw.column_mut(class)
                    .scaled_add(self.params.learning_rate, &update);
            }
            self.estimators.push(stage);
        }

        Ok(())
    }

    fn decision_function(&self, X: &Array2<f64>) -> Result<Array2<f64>, TrainingError> {
        if !self.is_trained {
            return Err(TrainingError::EmptyDataset);
        }

        let mut raw = Array2::zeros((X.nrows(), self.n_classes));
        for mut row in raw.rows_mut() {
            row.assign(&self.init_prediction);
        }
        for stage in &self.estimators {
            for (class, tree) in stage.iter().enumerate() {
                raw.column_mut(class)
                    .scaled_add(self.params.learning_rate, &tree.predict(X)?);
            }
        }
        Ok(raw)
    }

    pub fn predict_proba(&self, X: &Array2<f64>) -> Result<Array2<f64>, TrainingError> {
        Ok(softmax_rows(&self.decision_function(X)?))
    }

    /// Класс с наибольшей оценкой; при равенстве — с меньшим кодом
    pub fn predict(&self, X: &Array2<f64>) -> Result<Vec<usize>, TrainingError> {
        let raw = self.decision_function(X)?;
        Ok(raw
            .axis_iter(Axis(0))
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (class, &score)| {
                        if score > best.1 {
                            (class, score)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect())
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_stages(&self) -> usize {
        self.estimators.len()
    }
}

fn softmax_rows(raw: &Array2<f64>) -> Array2<f64> {
    let mut probabilities = raw.clone();
    for mut row in probabilities.rows_mut() {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    probabilities
}

fn check_shape(X: &Array2<f64>, targets: usize) -> Result<(), TrainingError> {
    if X.nrows() == 0 {
        return Err(TrainingError::EmptyDataset);
    }
    if X.nrows() != targets {
        return Err(TrainingError::ShapeMismatch {
            samples: X.nrows(),
            targets,
        });
    }
    Ok(())
}
