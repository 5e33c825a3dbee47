pub mod features;
pub mod metrics;
pub mod predictor;
pub mod regression;
pub mod stats;

pub use features::{engineer_features, FeatureColumn, FEATURE_COLUMNS};
pub use predictor::{
    calculate_impact_probability, impact_probabilities, FittedModel, Horizon, MarketImpactModel,
    TrainingMetrics,
};
pub use regression::{LinearRegression, StandardScaler};
pub use stats::{
    category_anova, correlation_matrix, ici_ttest, residual_analysis, students_t_test, AnovaResult,
    CorrelationMatrix, ResidualAnalysis, TTestResult,
};
