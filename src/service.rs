//! Сервис предсказаний: каталог, метки и обученные модели в одном
//! неизменяемом объекте, который строится один раз при старте

use chrono::Utc;

use crate::catalog::Catalog;
use crate::config::TrainingConfig;
use crate::error::{ServiceError, TrainingError};
use crate::matching;
use crate::models::{TrainedModels, TrainingReport};
use crate::preprocessing::{balancer_for, ClassBalancer, LabelSpace};
use crate::report;
use crate::types::{FeatureVector, MatchResult, Prediction, QueryParams, ReportRecord};

/// Знаков после запятой в предсказанной мощности
const POWER_DECIMALS: i32 = 2;

#[derive(Debug, Clone)]
pub struct PredictionService {
    catalog: Catalog,
    labels: LabelSpace,
    models: TrainedModels,
    training_report: TrainingReport,
}

impl PredictionService {
    pub fn train(catalog: Catalog, config: &TrainingConfig) -> Result<Self, TrainingError> {
        Self::train_with_balancer(catalog, config, balancer_for(config).as_ref())
    }

    /// Обучение с собственной стратегией балансировки
    pub fn train_with_balancer(
        catalog: Catalog,
        config: &TrainingConfig,
        balancer: &dyn ClassBalancer,
    ) -> Result<Self, TrainingError> {
        let labels = LabelSpace::fit(catalog.manufacturers());
        tracing::info!(
            "Training on {} catalog rows, {} manufacturers",
            catalog.len(),
            labels.len()
        );
        let (models, training_report) =
            TrainedModels::train_with_balancer(&catalog, &labels, config, balancer)?;
        Ok(Self {
            catalog,
            labels,
            models,
            training_report,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    pub fn training_report(&self) -> &TrainingReport {
        &self.training_report
    }

    pub fn predict(&self, pressure: f64, flow: f64, speed: f64) -> Result<Prediction, ServiceError> {
        self.predict_features(&FeatureVector::try_new(pressure, flow, speed)?)
    }

    pub fn predict_query(&self, query: &QueryParams) -> Result<Prediction, ServiceError> {
        self.predict_features(&query.to_features()?)
    }

    fn predict_features(&self, features: &FeatureVector) -> Result<Prediction, ServiceError> {
        // Модели обучены при старте, ошибка здесь означает рассогласование состояния
        let power = self.models.predict_power(features).map_err(internal)?;
        let code = self
            .models
            .predict_manufacturer_code(features)
            .map_err(internal)?;
        let manufacturer = self.labels.decode(code)?.to_string();

        tracing::debug!(
            "Prediction for {:?}: {:.3} kW, {}",
            features,
            power,
            manufacturer
        );

        Ok(Prediction {
            power: round_to(power, POWER_DECIMALS),
            manufacturer,
        })
    }

    pub fn nearest_match(&self, pressure: f64, flow: f64, speed: f64) -> Result<MatchResult, ServiceError> {
        matching::nearest_match(&self.catalog, &FeatureVector::try_new(pressure, flow, speed)?)
    }

    /// Данные отчёта по ближайшему вентилятору
    pub fn build_report(&self, query: &QueryParams) -> Result<ReportRecord, ServiceError> {
        let features = query.to_features()?;
        let matched = matching::nearest_match(&self.catalog, &features)?;
        tracing::debug!(
            "Nearest match for {:?}: row {} at distance {:.3}",
            features,
            matched.index,
            matched.distance
        );
        Ok(report::assemble(features, &matched, Utc::now()))
    }
}

fn internal(err: TrainingError) -> ServiceError {
    tracing::error!("Model state inconsistent: {}", err);
    match err {
        TrainingError::Label(inner) => inner,
        TrainingError::DegenerateLabels { label, .. } => ServiceError::UnknownLabel(label),
        other => ServiceError::Internal(other.to_string()),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BalancingStrategy;
    use crate::preprocessing::{NoBalancing, Smote};
    use crate::types::CatalogRow;

    fn catalog() -> Catalog {
        let rows = [
            (1000.0, 500.0, 1450.0, 5.5, "A"),
            (1010.0, 510.0, 1450.0, 5.6, "A"),
            (1020.0, 520.0, 1450.0, 5.7, "A"),
            (1030.0, 530.0, 1450.0, 5.8, "A"),
            (2000.0, 900.0, 2900.0, 15.0, "B"),
            (2050.0, 950.0, 2900.0, 15.5, "B"),
        ]
        .into_iter()
        .map(|(pressure, flow, speed, rated_power, manufacturer)| CatalogRow {
            pressure,
            flow,
            speed,
            rated_power,
            manufacturer: manufacturer.to_string(),
        })
        .collect();
        Catalog::from_rows(rows)
    }

    #[test]
    fn test_train_uses_configured_balancer() {
        let config = TrainingConfig::default();
        let service = PredictionService::train(catalog(), &config).unwrap();
        let explicit = PredictionService::train_with_balancer(
            catalog(),
            &config,
            &Smote::new(config.smote_k_neighbors, config.seed),
        )
        .unwrap();

        assert_eq!(service.training_report().classifier_samples, 8);
        assert_eq!(service.training_report(), explicit.training_report());

        let unbalanced = TrainingConfig {
            balancing: BalancingStrategy::None,
            ..TrainingConfig::default()
        };
        let service = PredictionService::train(catalog(), &unbalanced).unwrap();
        let explicit =
            PredictionService::train_with_balancer(catalog(), &unbalanced, &NoBalancing).unwrap();
        assert_eq!(service.training_report().classifier_samples, 6);
        assert_eq!(service.training_report(), explicit.training_report());
    }

    #[test]
    fn test_round_to_two_decimals() {
        assert_eq!(round_to(5.5049, 2), 5.5);
        assert_eq!(round_to(5.556, 2), 5.56);
        assert_eq!(round_to(-1.234, 2), -1.23);
    }
}
