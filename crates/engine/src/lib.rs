pub mod config;
pub mod features;

pub use config::{ConfigError, IndicatorConfig, ModelConfig, TrainingData};
pub use features::{build_features, FeatureColumn, FeatureError, FeatureTable};
