//! Обучение классификатора производителей и регрессора мощности

#![allow(non_snake_case)]

use super::gradient_boosting::{GradientBoostingClassifier, GradientBoostingRegressor};
use crate::catalog::Catalog;
use crate::config::TrainingConfig;
use crate::error::TrainingError;
use crate::preprocessing::{
    balancer_for, ClassBalancer, ClassifierSpace, LabelSpace, RegressorSpace, ScalerState,
};
use crate::types::FeatureVector;

/// Обученные модели вместе с их собственными масштабировщиками.
/// Создаются один раз при старте и дальше только читаются.
#[derive(Debug, Clone)]
pub struct TrainedModels {
    classifier_scaler: ScalerState<ClassifierSpace>,
    regressor_scaler: ScalerState<RegressorSpace>,
    classifier: GradientBoostingClassifier,
    regressor: GradientBoostingRegressor,
}

/// Метрики на обучающей выборке
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    pub classifier_samples: usize,
    pub regressor_samples: usize,
    pub classifier_accuracy: f64,
    pub regressor_rmse: f64,
}

impl TrainedModels {
    pub fn train(
        catalog: &Catalog,
        labels: &LabelSpace,
        config: &TrainingConfig,
    ) -> Result<(Self, TrainingReport), TrainingError> {
        let balancer = balancer_for(config);
        Self::train_with_balancer(catalog, labels, config, balancer.as_ref())
    }

    pub fn train_with_balancer(
        catalog: &Catalog,
        labels: &LabelSpace,
        config: &TrainingConfig,
        balancer: &dyn ClassBalancer,
    ) -> Result<(Self, TrainingReport), TrainingError> {
        if catalog.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let X = catalog.feature_matrix();
        let y_power = catalog.power_targets();
        let y_manufacturer = catalog
            .manufacturers()
            .map(|name| labels.encode(name))
            .collect::<Result<Vec<_>, _>>()?;

        // Балансировка только для классификатора
        let (X_balanced, y_balanced) =
            balancer
                .balance(&X, &y_manufacturer)
                .map_err(|err| match err {
                    TrainingError::SingletonClass { class } => {
                        TrainingError::SingletonManufacturer {
                            manufacturer: labels
                                .decode(class)
                                .map(str::to_string)
                                .unwrap_or_else(|_| format!("#{}", class)),
                        }
                    }
                    other => other,
                })?;

        let classifier_scaler = ScalerState::<ClassifierSpace>::fit(&X_balanced)?;
        let X_classifier = classifier_scaler.transform(&X_balanced);
        let mut classifier = GradientBoostingClassifier::new(config.classifier);
        classifier.fit(X_classifier.values(), &y_balanced, labels.len())?;

        // Регрессор: отдельная подгонка по исходному каталогу
        let regressor_scaler = ScalerState::<RegressorSpace>::fit(&X)?;
        let X_regressor = regressor_scaler.transform(&X);
        let mut regressor = GradientBoostingRegressor::new(config.regressor);
        regressor.fit(X_regressor.values(), &y_power)?;

        let predicted_codes = classifier.predict(X_classifier.values())?;
        let correct = predicted_codes
            .iter()
            .zip(y_balanced.iter())
            .filter(|(p, t)| p == t)
            .count();
        let predicted_power = regressor.predict(X_regressor.values())?;
        let mse = (&predicted_power - &y_power)
            .mapv(|x| x * x)
            .mean()
            .unwrap_or(0.0);

        let report = TrainingReport {
            classifier_samples: y_balanced.len(),
            regressor_samples: y_power.len(),
            classifier_accuracy: correct as f64 / y_balanced.len() as f64,
            regressor_rmse: mse.sqrt(),
        };
        tracing::info!(
            "Models trained: classifier {} samples / {} classes, accuracy {:.3}; regressor {} samples, RMSE {:.3} kW",
            report.classifier_samples,
            labels.len(),
            report.classifier_accuracy,
            report.regressor_samples,
            report.regressor_rmse
        );

        Ok((
            Self {
                classifier_scaler,
                regressor_scaler,
                classifier,
                regressor,
            },
            report,
        ))
    }

    /// Мощность (кВт) без округления
    pub fn predict_power(&self, features: &FeatureVector) -> Result<f64, TrainingError> {
        let scaled = self.regressor_scaler.transform_one(features);
        let prediction = self.regressor.predict(scaled.values())?;
        prediction.get(0).copied().ok_or(TrainingError::EmptyDataset)
    }

    /// Код производителя в пространстве меток обучения
    pub fn predict_manufacturer_code(&self, features: &FeatureVector) -> Result<usize, TrainingError> {
        let scaled = self.classifier_scaler.transform_one(features);
        let prediction = self.classifier.predict(scaled.values())?;
        prediction.first().copied().ok_or(TrainingError::EmptyDataset)
    }

    pub fn classifier_scaler(&self) -> &ScalerState<ClassifierSpace> {
        &self.classifier_scaler
    }

    pub fn regressor_scaler(&self) -> &ScalerState<RegressorSpace> {
        &self.regressor_scaler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BalancingStrategy;
    use crate::types::CatalogRow;

    fn row(pressure: f64, flow: f64, speed: f64, power: f64, manufacturer: &str) -> CatalogRow {
        CatalogRow {
            pressure,
            flow,
            speed,
            rated_power: power,
            manufacturer: manufacturer.to_string(),
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_rows(vec![
            row(1000.0, 500.0, 1450.0, 5.5, "A"),
            row(1010.0, 520.0, 1450.0, 5.7, "A"),
            row(1020.0, 540.0, 1450.0, 5.9, "A"),
            row(1030.0, 560.0, 1450.0, 6.1, "A"),
            row(2000.0, 1500.0, 2900.0, 15.0, "B"),
            row(2100.0, 1600.0, 2900.0, 16.0, "B"),
        ])
    }

    #[test]
    fn test_scalers_are_fitted_independently() {
        let catalog = catalog();
        let labels = LabelSpace::fit(catalog.manufacturers());
        let (models, report) =
            TrainedModels::train(&catalog, &labels, &TrainingConfig::default()).unwrap();

        // Классификатор обучен на 4 + 4 примерах, регрессор — на исходных 6
        assert_eq!(report.classifier_samples, 8);
        assert_eq!(report.regressor_samples, 6);

        let regressor_mean = models.regressor_scaler().mean()[0];
        let expected = catalog.rows().iter().map(|r| r.pressure).sum::<f64>() / 6.0;
        assert!((regressor_mean - expected).abs() < 1e-9);
        assert!((models.classifier_scaler().mean()[0] - regressor_mean).abs() > 1.0);
    }

    #[test]
    fn test_predictions_follow_training_data() {
        let catalog = catalog();
        let labels = LabelSpace::fit(catalog.manufacturers());
        let (models, report) =
            TrainedModels::train(&catalog, &labels, &TrainingConfig::default()).unwrap();
        assert_eq!(report.classifier_accuracy, 1.0);

        let query = catalog.rows()[4].features();
        assert_eq!(models.predict_manufacturer_code(&query).unwrap(), 1);
        assert!((models.predict_power(&query).unwrap() - 15.0).abs() < 0.05);
    }

    #[test]
    fn test_singleton_manufacturer_is_reported_by_name() {
        let catalog = Catalog::from_rows(vec![
            row(1000.0, 500.0, 1450.0, 5.5, "A"),
            row(1200.0, 600.0, 1450.0, 7.0, "B"),
            row(1000.0, 505.0, 1450.0, 5.6, "A"),
        ]);
        let labels = LabelSpace::fit(catalog.manufacturers());
        let err = TrainedModels::train(&catalog, &labels, &TrainingConfig::default()).unwrap_err();
        match err {
            TrainingError::SingletonManufacturer { manufacturer } => assert_eq!(manufacturer, "B"),
            other => panic!("unexpected error: {other}"),
        }

        let config = TrainingConfig {
            balancing: BalancingStrategy::None,
            ..TrainingConfig::default()
        };
        assert!(TrainedModels::train(&catalog, &labels, &config).is_ok());
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        let catalog = Catalog::default();
        let labels = LabelSpace::fit(catalog.manufacturers());
        assert!(matches!(
            TrainedModels::train(&catalog, &labels, &TrainingConfig::default()),
            Err(TrainingError::EmptyDataset)
        ));
    }
}
