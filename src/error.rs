//! Ошибки загрузки, обучения и обработки запросов

use thiserror::Error;

/// Ошибки загрузки каталога (фатальные, при старте)
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed catalog CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Catalog is missing column '{column}'")]
    MissingColumn { column: String },

    #[error("Row {row}: cannot parse '{value}' in column '{column}' as a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}

/// Ошибки обучения моделей (фатальные, при старте)
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Empty dataset")]
    EmptyDataset,

    #[error("Class {class} has a single example, no same-class neighbour to interpolate with")]
    SingletonClass { class: usize },

    #[error("Manufacturer '{manufacturer}' has a single example, cannot oversample it")]
    SingletonManufacturer { manufacturer: String },

    #[error("Shape mismatch: {samples} samples, {targets} targets")]
    ShapeMismatch { samples: usize, targets: usize },

    #[error("Label {label} is outside the label space of {classes} classes")]
    DegenerateLabels { label: usize, classes: usize },

    #[error(transparent)]
    Label(#[from] ServiceError),
}

/// Ошибки отдельного запроса; не влияют на общее состояние
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Catalog is empty")]
    EmptyCatalog,

    #[error("Unknown label code {0}")]
    UnknownLabel(usize),

    #[error("Internal model error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Короткое имя вида ошибки для ответа API
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidInput(_) => "invalid_input",
            ServiceError::EmptyCatalog => "empty_catalog",
            ServiceError::UnknownLabel(_) => "unknown_label",
            ServiceError::Internal(_) => "internal",
        }
    }
}

/// Ошибки сохранения и выдачи отчётов
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid report handle '{0}'")]
    InvalidHandle(String),

    #[error("Report '{0}' not found")]
    NotFound(String),

    #[error("Report I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
