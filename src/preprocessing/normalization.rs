//! Стандартизация признаков
//!
//! В системе две независимые подгонки: по сбалансированной выборке для
//! классификатора и по исходному каталогу для регрессора. Пространство
//! масштабирования зашито в тип, поэтому применить состояние одной модели ко
//! входу другой нельзя.

#![allow(non_snake_case)]

use std::marker::PhantomData;

use ndarray::{Array1, Array2, Axis};

use crate::error::TrainingError;
use crate::types::{FeatureVector, N_FEATURES};

/// Порог, ниже которого стандартное отклонение считается нулевым
const MIN_STD: f64 = 1e-10;

pub trait ScalingSpace: Clone + Copy + std::fmt::Debug + Send + Sync + 'static {
    const NAME: &'static str;
}

/// Пространство классификатора производителей
#[derive(Debug, Clone, Copy)]
pub struct ClassifierSpace;

/// Пространство регрессора мощности
#[derive(Debug, Clone, Copy)]
pub struct RegressorSpace;

impl ScalingSpace for ClassifierSpace {
    const NAME: &'static str = "classifier";
}

impl ScalingSpace for RegressorSpace {
    const NAME: &'static str = "regressor";
}

/// Среднее и стандартное отклонение по каждому признаку
#[derive(Debug, Clone)]
pub struct ScalerState<S: ScalingSpace> {
    mean: Array1<f64>,
    std: Array1<f64>,
    _space: PhantomData<S>,
}

/// Масштабированные признаки, привязанные к своему пространству
#[derive(Debug, Clone)]
pub struct Scaled<S: ScalingSpace> {
    values: Array2<f64>,
    _space: PhantomData<S>,
}

impl<S: ScalingSpace> Scaled<S> {
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}

impl<S: ScalingSpace> ScalerState<S> {
    pub fn fit(X: &Array2<f64>) -> Result<Self, TrainingError> {
        if X.nrows() == 0 {
            return Err(TrainingError::EmptyDataset);
        }

        let mean = X.mean_axis(Axis(0)).ok_or(TrainingError::EmptyDataset)?;
        let mut std = X.std_axis(Axis(0), 0.0);

        // Избегаем деления на ноль: постоянный признак масштабируется в 0
        for val in std.iter_mut() {
            if *val < MIN_STD {
                *val = 1.0;
            }
        }

        tracing::debug!("Fitted {} scaler: mean={:?}, std={:?}", S::NAME, mean, std);

        Ok(Self {
            mean,
            std,
            _space: PhantomData,
        })
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    pub fn transform(&self, X: &Array2<f64>) -> Scaled<S> {
        // Нормализация: (X - mean) / std
        let mut normalized = X.clone();
        for mut row in normalized.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = (*val - self.mean[i]) / self.std[i];
            }
        }

        Scaled {
            values: normalized,
            _space: PhantomData,
        }
    }

    pub fn transform_one(&self, features: &FeatureVector) -> Scaled<S> {
        let mut X = Array2::zeros((1, N_FEATURES));
        for (j, value) in features.to_array().iter().enumerate() {
            X[[0, j]] = *value;
        }
        self.transform(&X)
    }

    pub fn inverse_transform(&self, scaled: &Scaled<S>) -> Array2<f64> {
        let mut restored = scaled.values.clone();
        for mut row in restored.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = *val * self.std[i] + self.mean[i];
            }
        }
        restored
    }
}
