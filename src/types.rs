//! Типы данных для подбора вентиляторов

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Число признаков: давление, расход, скорость вращения
pub const N_FEATURES: usize = 3;

/// Одна запись каталога вентиляторов
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub pressure: f64,    // Па, статическое
    pub flow: f64,        // м³/ч
    pub speed: f64,       // 1/мин
    pub rated_power: f64, // кВт
    pub manufacturer: String,
}

impl CatalogRow {
    pub fn features(&self) -> FeatureVector {
        FeatureVector {
            pressure: self.pressure,
            flow: self.flow,
            speed: self.speed,
        }
    }
}

/// Вектор признаков в исходных единицах каталога
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub pressure: f64,
    pub flow: f64,
    pub speed: f64,
}

impl FeatureVector {
    /// Проверяет, что все три значения конечны
    pub fn try_new(pressure: f64, flow: f64, speed: f64) -> Result<Self, ServiceError> {
        for (name, value) in [("pressure", pressure), ("flow", flow), ("speed", speed)] {
            if !value.is_finite() {
                return Err(ServiceError::InvalidInput(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
        }
        Ok(Self {
            pressure,
            flow,
            speed,
        })
    }

    pub fn to_array(&self) -> [f64; N_FEATURES] {
        [self.pressure, self.flow, self.speed]
    }

    /// Евклидово расстояние в исходных (немасштабированных) единицах
    pub fn distance(&self, other: &FeatureVector) -> f64 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// Параметры запроса в том виде, в каком они приходят от клиента
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryParams {
    pub pressure: Option<f64>,
    pub flow: Option<f64>,
    pub speed: Option<f64>,
}

impl QueryParams {
    pub fn new(pressure: f64, flow: f64, speed: f64) -> Self {
        Self {
            pressure: Some(pressure),
            flow: Some(flow),
            speed: Some(speed),
        }
    }

    pub fn to_features(&self) -> Result<FeatureVector, ServiceError> {
        let require = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| ServiceError::InvalidInput(format!("missing field: {}", name)))
        };
        FeatureVector::try_new(
            require(self.pressure, "pressure")?,
            require(self.flow, "flow")?,
            require(self.speed, "speed")?,
        )
    }
}

/// Результат предсказания
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub power: f64, // кВт, округлено до 2 знаков
    pub manufacturer: String,
}

/// Ближайшая запись каталога
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub row: CatalogRow,
    pub index: usize,
    pub distance: f64,
}

/// Структурированные данные отчёта для рендерера
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub query: FeatureVector,
    pub matched: CatalogRow,
    pub distance: f64,
    pub summary: String,
    pub generated_at: DateTime<Utc>,
}

/// Ответ на запрос отчёта
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    pub report: String,
    /// Имя файла отчёта для `/api/download`. Сам файл текстовый (`.txt`),
    /// имя поля сохранено для совместимости с клиентами
    pub pdf_filename: String,
}
