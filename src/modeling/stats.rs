use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use std::collections::BTreeMap;
use tracing::debug;

use crate::lookalike::BenchmarkSpace;
use crate::modeling::features::FeatureColumn;
use crate::modeling::metrics::{correlation, mean};
use crate::EnrichedRecord;

const HIGH_ICI_GROUP: f64 = 0.7;
const LOW_ICI_GROUP: f64 = 0.3;
const SIGNIFICANCE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.columns.iter().position(|name| name == row)?;
        let j = self.columns.iter().position(|name| name == col)?;
        Some(self.values[i][j])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    pub t_statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: f64,
    pub df_within: f64,
    pub groups: Vec<(String, usize)>,
    pub significant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualAnalysis {
    pub mean_residual: f64,
    pub std_residual: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

pub fn correlation_matrix(records: &[EnrichedRecord], columns: &[FeatureColumn]) -> CorrelationMatrix {
    let series: Vec<Vec<f64>> = columns
        .iter()
        .map(|column| records.iter().map(|record| column.value(record)).collect())
        .collect();
    let values = series
        .iter()
        .map(|left| {
            series
                .iter()
                .map(|right| {
                    let pairs: Vec<(f64, f64)> =
                        left.iter().cloned().zip(right.iter().cloned()).collect();
                    correlation(&pairs)
                })
                .collect()
        })
        .collect();
    CorrelationMatrix {
        columns: columns.iter().map(|column| column.name().to_string()).collect(),
        values,
    }
}

pub fn ici_ttest(records: &[EnrichedRecord]) -> Option<TTestResult> {
    let high: Vec<f64> = records
        .iter()
        .filter(|record| record.ici() > HIGH_ICI_GROUP)
        .map(|record| record.readiness())
        .collect();
    let low: Vec<f64> = records
        .iter()
        .filter(|record| record.ici() < LOW_ICI_GROUP)
        .map(|record| record.readiness())
        .collect();
    debug!("ICI t-test groups - high={}, low={}", high.len(), low.len());
    if high.is_empty() || low.is_empty() {
        return None;
    }
    students_t_test(&high, &low)
}

/// One-way ANOVA of predicted readiness across the categories of the
/// matched benchmarks.
pub fn category_anova(
    records: &[EnrichedRecord],
    benchmarks: &BenchmarkSpace,
) -> Option<AnovaResult> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in records {
        let category = record
            .lookalike
            .as_ref()
            .and_then(|matched| benchmarks.get(&matched.benchmark_id))
            .map(|benchmark| benchmark.spec.category.as_str());
        if let Some(category) = category {
            groups.entry(category).or_default().push(record.readiness());
        }
    }
    debug!("Category ANOVA groups - groups={}", groups.len());
    if groups.len() < 2 {
        return None;
    }

    let samples: Vec<&[f64]> = groups.values().map(|values| values.as_slice()).collect();
    let total: usize = samples.iter().map(|values| values.len()).sum();
    let df_between = (samples.len() - 1) as f64;
    let df_within = total as f64 - samples.len() as f64;
    if df_within < 1.0 {
        return None;
    }

    let grand_mean = samples.iter().flat_map(|values| values.iter()).sum::<f64>() / total as f64;
    let between: f64 = samples
        .iter()
        .map(|values| values.len() as f64 * (mean(values) - grand_mean).powi(2))
        .sum();
    let within: f64 = samples
        .iter()
        .map(|values| {
            let center = mean(values);
            values.iter().map(|v| (v - center).powi(2)).sum::<f64>()
        })
        .sum();
    if within <= f64::EPSILON {
        return None;
    }

    let f_statistic = (between / df_between) / (within / df_within);
    let p_value = match FisherSnedecor::new(df_between, df_within) {
        Ok(dist) => 1.0 - dist.cdf(f_statistic),
        Err(_) => return None,
    };
    Some(AnovaResult {
        f_statistic,
        p_value,
        df_between,
        df_within,
        groups: groups
            .iter()
            .map(|(category, values)| (category.to_string(), values.len()))
            .collect(),
        significant: p_value < SIGNIFICANCE,
    })
}

pub fn residual_analysis(actual: &[f64], predicted: &[f64]) -> Option<ResidualAnalysis> {
    let residuals: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| a - p)
        .collect();
    if residuals.len() < 2 {
        return None;
    }
    let n = residuals.len() as f64;
    let center = mean(&residuals);
    let moment = |power: i32| residuals.iter().map(|r| (r - center).powi(power)).sum::<f64>() / n;
    let m2 = moment(2);
    let (skewness, kurtosis) = if m2 <= f64::EPSILON {
        (0.0, 0.0)
    } else {
        (moment(3) / m2.powf(1.5), moment(4) / (m2 * m2) - 3.0)
    };
    Some(ResidualAnalysis {
        mean_residual: center,
        std_residual: (m2 * n / (n - 1.0)).sqrt(),
        skewness,
        kurtosis,
    })
}

pub fn students_t_test(a: &[f64], b: &[f64]) -> Option<TTestResult> {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let df = n1 + n2 - 2.0;
    if a.is_empty() || b.is_empty() || df < 1.0 {
        return None;
    }
    let (mean_a, mean_b) = (mean(a), mean(b));
    let ss = |values: &[f64], center: f64| values.iter().map(|v| (v - center).powi(2)).sum::<f64>();
    let pooled = (ss(a, mean_a) + ss(b, mean_b)) / df;
    let standard_error = (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    if standard_error <= f64::EPSILON {
        return None;
    }
    let t_statistic = (mean_a - mean_b) / standard_error;
    let p_value = match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t_statistic.abs())),
        Err(_) => return None,
    };
    Some(TTestResult {
        t_statistic,
        p_value,
        degrees_of_freedom: df,
        significant: p_value < SIGNIFICANCE,
    })
}
