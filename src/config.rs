//! Конфигурация сервиса и обучения
//!
//! Параметры командной строки, каждый можно задать и переменной окружения:
//! - `--catalog-path` / `FAN_CATALOG_PATH` (по умолчанию `merged_fan_export.csv`)
//! - `--addr` / `FAN_ML_ADDR` (по умолчанию `0.0.0.0:8000`)
//! - `--report-dir` / `FAN_REPORT_DIR` (по умолчанию временный каталог ОС)
//! - `--balancing` / `FAN_BALANCING`: `smote` или `none`

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATALOG_PATH: &str = "merged_fan_export.csv";
pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";

/// Гиперпараметры бустинга, одинаковые для классификатора и регрессора
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
        }
    }
}

/// Стратегия балансировки классов производителей
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BalancingStrategy {
    Smote,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub classifier: BoostingParams,
    pub regressor: BoostingParams,
    pub balancing: BalancingStrategy,
    pub smote_k_neighbors: usize,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            classifier: BoostingParams::default(),
            regressor: BoostingParams::default(),
            balancing: BalancingStrategy::Smote,
            smote_k_neighbors: 5,
            seed: 42,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "fan-select-ml")]
#[command(about = "Fan selection service: rated power, manufacturer and nearest catalog match")]
#[command(version)]
pub struct ServiceConfig {
    /// CSV export of the fan catalog
    #[arg(long, env = "FAN_CATALOG_PATH", default_value = DEFAULT_CATALOG_PATH)]
    pub catalog_path: PathBuf,

    /// Address to listen on
    #[arg(short, long, env = "FAN_ML_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,

    /// Directory for generated reports (default: OS temp directory)
    #[arg(long, env = "FAN_REPORT_DIR")]
    pub report_dir: Option<PathBuf>,

    /// Class balancing applied before classifier training
    #[arg(long, env = "FAN_BALANCING", value_enum, ignore_case = true, default_value_t = BalancingStrategy::Smote)]
    pub balancing: BalancingStrategy,
}

impl ServiceConfig {
    pub fn report_dir(&self) -> PathBuf {
        self.report_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn training(&self) -> TrainingConfig {
        TrainingConfig {
            balancing: self.balancing,
            ..TrainingConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::try_parse_from(["fan-select-ml"]).unwrap();
        assert_eq!(config.catalog_path, PathBuf::from(DEFAULT_CATALOG_PATH));
        assert_eq!(config.addr.port(), 8000);
        assert_eq!(config.report_dir(), std::env::temp_dir());

        let training = config.training();
        assert_eq!(training.balancing, BalancingStrategy::Smote);
        assert_eq!(training.classifier.n_estimators, 100);
        assert_eq!(training.regressor.max_depth, 3);
        assert_eq!(training.seed, 42);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::try_parse_from([
            "fan-select-ml",
            "--catalog-path",
            "/data/fans.csv",
            "--addr",
            "127.0.0.1:9000",
            "--report-dir",
            "/var/reports",
            "--balancing",
            "None",
        ])
        .unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("/data/fans.csv"));
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.report_dir(), PathBuf::from("/var/reports"));
        assert_eq!(config.training().balancing, BalancingStrategy::None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ServiceConfig::try_parse_from(["fan-select-ml", "--addr", "nowhere"]).is_err());
        assert!(ServiceConfig::try_parse_from(["fan-select-ml", "--balancing", "adasyn"]).is_err());
    }
}
