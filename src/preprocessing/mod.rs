//! Модуль предобработки данных

pub mod balancing;
pub mod label_encoding;
pub mod normalization;

pub use balancing::{balancer_for, ClassBalancer, NoBalancing, Smote};
pub use label_encoding::LabelSpace;
pub use normalization::{ClassifierSpace, RegressorSpace, Scaled, ScalerState, ScalingSpace};
