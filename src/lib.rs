//! Fan Select ML - предсказание мощности и производителя вентилятора

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod matching;
pub mod models;
pub mod preprocessing;
pub mod report;
pub mod service;
pub mod types;

pub use types::*;

// Re-export для удобства
pub use catalog::Catalog;
pub use error::{LoadError, ReportError, ServiceError, TrainingError};
pub use service::PredictionService;
