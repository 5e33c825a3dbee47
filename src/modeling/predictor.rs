use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::error::{Result, SignalError};
use crate::modeling::features::{engineer_features, feature_row, FEATURE_COLUMNS};
use crate::modeling::metrics::{mean_absolute_error, mean_squared_error, r2_score};
use crate::modeling::regression::{LinearRegression, StandardScaler};
use crate::{clamp_range, EnrichedRecord, ImpactPrediction};

const MIN_PARTITION: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub train_r2: f64,
    pub test_r2: f64,
    pub train_mse: f64,
    pub test_mse: f64,
    pub train_mae: f64,
    pub test_mae: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub overfit_gap: f64,
    pub is_overfit: bool,
    pub intercept: f64,
    pub coefficients: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub scaler: StandardScaler,
    pub regression: LinearRegression,
}

#[derive(Debug, Clone)]
pub struct MarketImpactModel {
    config: ModelConfig,
    fitted: Option<FittedModel>,
}

impl MarketImpactModel {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn fitted(&self) -> Option<&FittedModel> {
        self.fitted.as_ref()
    }

    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.fitted.as_ref().map(|fitted| &fitted.scaler)
    }

    pub fn engineer_features(&self, records: &[EnrichedRecord]) -> Vec<EnrichedRecord> {
        engineer_features(records)
    }

    pub fn minimum_records(&self) -> usize {
        let fraction = self.config.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return usize::MAX;
        }
        // test needs n·f > 1, train needs n·(1 - f) >= 2 up to one rounding step
        let partition = MIN_PARTITION as f64;
        let lower = ((partition - 1.0) / fraction)
            .floor()
            .max((partition / (1.0 - fraction)).floor())
            .max(2.0 * partition) as usize;
        let upper = lower + ((partition + 1.0) / (1.0 - fraction)).ceil() as usize + 1;
        (lower..=upper)
            .find(|&n| {
                let (train, test) = self.partition_sizes(n);
                train >= MIN_PARTITION && test >= MIN_PARTITION
            })
            .unwrap_or(upper)
    }

    pub fn train_test_split(&self, count: usize) -> (Vec<usize>, Vec<usize>) {
        let mut indices: Vec<usize> = (0..count).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);
        let (_, test_size) = self.partition_sizes(count);
        let train = indices.split_off(test_size);
        (train, indices)
    }

    pub fn train(&mut self, records: &[EnrichedRecord]) -> Result<TrainingMetrics> {
        let required = self.minimum_records();
        if records.len() < required {
            return Err(SignalError::InsufficientData {
                records: records.len(),
                required,
            });
        }

        let engineered = engineer_features(records);
        let rows: Vec<Vec<f64>> = engineered.iter().map(feature_row).collect();
        let labels: Vec<f64> = engineered
            .iter()
            .map(|record| record.features.map(|f| f.market_readiness).unwrap_or(0.0))
            .collect();

        let (train_idx, test_idx) = self.train_test_split(rows.len());
        let pick_rows = |idx: &[usize]| idx.iter().map(|&i| rows[i].clone()).collect::<Vec<_>>();
        let pick_labels = |idx: &[usize]| idx.iter().map(|&i| labels[i]).collect::<Vec<_>>();
        let (x_train, y_train) = (pick_rows(&train_idx), pick_labels(&train_idx));
        let (x_test, y_test) = (pick_rows(&test_idx), pick_labels(&test_idx));

        let scaler = StandardScaler::fit(&x_train)?;
        let x_train_scaled = scaler.transform(&x_train);
        let x_test_scaled = scaler.transform(&x_test);

        let regression = LinearRegression::fit(&x_train_scaled, &y_train)?;
        let train_pred = regression.predict(&x_train_scaled);
        let test_pred = regression.predict(&x_test_scaled);

        let train_r2 = r2_score(&y_train, &train_pred).ok_or_else(|| SignalError::TrainingFailed {
            statistic: "train_r2".to_string(),
            reason: "market_readiness has zero variance in the training partition".to_string(),
        })?;
        let test_r2 = r2_score(&y_test, &test_pred).ok_or_else(|| SignalError::TrainingFailed {
            statistic: "test_r2".to_string(),
            reason: "market_readiness has zero variance in the test partition".to_string(),
        })?;

        let overfit_gap = train_r2 - test_r2;
        let is_overfit = overfit_gap > self.config.overfit_tolerance;
        let metrics = TrainingMetrics {
            train_r2,
            test_r2,
            train_mse: mean_squared_error(&y_train, &train_pred),
            test_mse: mean_squared_error(&y_test, &test_pred),
            train_mae: mean_absolute_error(&y_train, &train_pred),
            test_mae: mean_absolute_error(&y_test, &test_pred),
            train_samples: y_train.len(),
            test_samples: y_test.len(),
            overfit_gap,
            is_overfit,
            intercept: regression.intercept(),
            coefficients: FEATURE_COLUMNS
                .iter()
                .zip(regression.coefficients().iter())
                .map(|(column, beta)| (column.name().to_string(), *beta))
                .collect(),
        };

        info!(
            "Model training complete - train_r2={:.4}, test_r2={:.4}, test_mae={:.4}",
            metrics.train_r2, metrics.test_r2, metrics.test_mae
        );
        if is_overfit {
            warn!(
                "Model overfit - train_r2={:.4}, test_r2={:.4}, gap={:.4}, tolerance={:.4}",
                train_r2, test_r2, overfit_gap, self.config.overfit_tolerance
            );
        }

        self.fitted = Some(FittedModel { scaler, regression });
        Ok(metrics)
    }

    pub fn predict(&self, records: &[EnrichedRecord]) -> Result<Vec<EnrichedRecord>> {
        let fitted = self.fitted.as_ref().ok_or(SignalError::ModelNotTrained)?;
        let engineered = engineer_features(records);
        Ok(engineered
            .into_iter()
            .map(|record| {
                let scaled = fitted.scaler.transform_row(&feature_row(&record));
                EnrichedRecord {
                    predicted_readiness: Some(fitted.regression.predict_row(&scaled)),
                    ..record
                }
            })
            .collect())
    }

    fn partition_sizes(&self, count: usize) -> (usize, usize) {
        let test = ((count as f64) * self.config.test_fraction).ceil() as usize;
        let test = test.min(count);
        (count - test, test)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    H24,
    H48,
    H72,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::H24, Horizon::H48, Horizon::H72];

    pub fn hours(self) -> u32 {
        match self {
            Horizon::H24 => 24,
            Horizon::H48 => 48,
            Horizon::H72 => 72,
        }
    }

    pub fn ici_weight(self, ici: f64) -> f64 {
        match self {
            Horizon::H24 => 0.6 + 0.4 * ici,
            Horizon::H48 => 0.7 + 0.3 * ici,
            Horizon::H72 => 0.8 + 0.2 * ici,
        }
    }

    pub fn lookalike_weight(self, similarity: f64) -> f64 {
        match self {
            Horizon::H24 => 0.7 + 0.3 * similarity,
            Horizon::H48 => 0.8 + 0.2 * similarity,
            Horizon::H72 => 0.9 + 0.1 * similarity,
        }
    }

    pub fn probability(self, readiness: f64, ici: f64, similarity: f64) -> f64 {
        let raw = readiness * 100.0 * self.ici_weight(ici) * self.lookalike_weight(similarity);
        clamp_range(raw, 0.0, 100.0)
    }
}

pub fn impact_probabilities(readiness: f64, ici: f64, similarity: f64) -> ImpactPrediction {
    ImpactPrediction {
        predicted_readiness: readiness,
        impact_prob_24h: Horizon::H24.probability(readiness, ici, similarity),
        impact_prob_48h: Horizon::H48.probability(readiness, ici, similarity),
        impact_prob_72h: Horizon::H72.probability(readiness, ici, similarity),
    }
}

pub fn calculate_impact_probability(records: &[EnrichedRecord]) -> Result<Vec<EnrichedRecord>> {
    records
        .iter()
        .map(|record| {
            let readiness = record
                .predicted_readiness
                .ok_or_else(|| SignalError::MissingPrediction {
                    record_id: record.record.stable_id(),
                })?;
            Ok(EnrichedRecord {
                impact: Some(impact_probabilities(
                    readiness,
                    record.ici(),
                    record.lookalike_similarity(),
                )),
                ..record.clone()
            })
        })
        .collect()
}
