//! ML модели

pub mod gradient_boosting;
pub mod training;
pub mod tree;

pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingRegressor};
pub use training::{TrainedModels, TrainingReport};
pub use tree::RegressionTree;
