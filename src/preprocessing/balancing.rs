//! Балансировка классов производителей перед обучением классификатора

#![allow(non_snake_case)]

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{BalancingStrategy, TrainingConfig};
use crate::error::TrainingError;

/// Стратегия балансировки: `balance(features, labels) -> (features', labels')`
pub trait ClassBalancer: Send + Sync {
    fn balance(
        &self,
        X: &Array2<f64>,
        y: &[usize],
    ) -> Result<(Array2<f64>, Vec<usize>), TrainingError>;
}

pub fn balancer_for(config: &TrainingConfig) -> Box<dyn ClassBalancer> {
    match config.balancing {
        BalancingStrategy::Smote => Box::new(Smote::new(config.smote_k_neighbors, config.seed)),
        BalancingStrategy::None => Box::new(NoBalancing),
    }
}

/// Выборка без изменений
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBalancing;

impl ClassBalancer for NoBalancing {
    fn balance(
        &self,
        X: &Array2<f64>,
        y: &[usize],
    ) -> Result<(Array2<f64>, Vec<usize>), TrainingError> {
        check_shape(X, y)?;
        Ok((X.clone(), y.to_vec()))
    }
}

/// SMOTE: синтетические примеры интерполяцией между примером миноритарного
/// класса и одним из его ближайших соседей того же класса
#[derive(Debug, Clone, Copy)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self {
            k_neighbors: k_neighbors.max(1),
            seed,
        }
    }

    /// k ближайших соседей внутри класса для каждого примера (индексы в `members`)
    fn neighbours(&self, X: &Array2<f64>, members: &[usize], k: usize) -> Vec<Vec<usize>> {
        members
            .iter()
            .enumerate()
            .map(|(a, &i)| {
                let mut by_distance: Vec<(f64, usize)> = members
                    .iter()
                    .enumerate()
                    .filter(|(b, _)| *b != a)
                    .map(|(b, &j)| (squared_distance(X.row(i), X.row(j)), b))
                    .collect();
                by_distance.sort_by(|l, r| {
                    l.0.partial_cmp(&r.0)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(l.1.cmp(&r.1))
                });
                by_distance.into_iter().take(k).map(|(_, b)| b).collect()
            })
            .collect()
    }
}

impl ClassBalancer for Smote {
    fn balance(
        &self,
        X: &Array2<f64>,
        y: &[usize],
    ) -> Result<(Array2<f64>, Vec<usize>), TrainingError> {
        check_shape(X, y)?;

        let mut classes: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            classes.entry(label).or_default().push(i);
        }
        let target = classes.values().map(Vec::len).max().unwrap_or(0);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut synthetic: Vec<(Vec<f64>, usize)> = Vec::new();

        for (&class, members) in &classes {
            let n = members.len();
            if n >= target {
                continue;
            }
            if n < 2 {
                return Err(TrainingError::SingletonClass { class });
            }

            let k = self.k_neighbors.min(n - 1);
            let neighbours = self.neighbours(X, members, k);

            for _ in 0..(target - n) {
                let a = rng.gen_range(0..n);
                let b = neighbours[a][rng.gen_range(0..k)];
                let gap: f64 = rng.gen();

                let base = X.row(members[a]);
                let other = X.row(members[b]);
                let sample = base
                    .iter()
                    .zip(other.iter())
                    .map(|(x, z)| x + gap * (z - x))
                    .collect();
                synthetic.push((sample, class));
            }
        }

        if !synthetic.is_empty() {
            tracing::info!(
                "SMOTE: {} synthetic samples added, {} classes balanced to {}",
                synthetic.len(),
                classes.len(),
                target
            );
        }

        let n_total = X.nrows() + synthetic.len();
        let mut X_out = Array2::zeros((n_total, X.ncols()));
        X_out.slice_mut(ndarray::s![..X.nrows(), ..]).assign(X);
        let mut y_out = y.to_vec();

        for (offset, (sample, class)) in synthetic.into_iter().enumerate() {
            let i = X.nrows() + offset;
            for (j, value) in sample.into_iter().enumerate() {
                X_out[[i, j]] = value;
            }
            y_out.push(class);
        }

        Ok((X_out, y_out))
    }
}

fn check_shape(X: &Array2<f64>, y: &[usize]) -> Result<(), TrainingError> {
    if X.nrows() != y.len() {
        return Err(TrainingError::ShapeMismatch {
            samples: X.nrows(),
            targets: y.len(),
        });
    }
    if X.nrows() == 0 {
        return Err(TrainingError::EmptyDataset);
    }
    Ok(())
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, z)| (x - z).powi(2)).sum()
}
