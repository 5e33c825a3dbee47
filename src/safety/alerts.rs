use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::info;

use crate::config::ThresholdConfig;
use crate::EnrichedRecord;

const MAX_KEYWORDS: usize = 5;
const MIN_KEYWORD_CHARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    /// `[0, 2)` Medium, `[2, 4)` High, `[4, ∞)` Critical.
    pub fn from_toxicity(toxicity: u32) -> Self {
        if toxicity < 2 {
            Severity::Medium
        } else if toxicity < 4 {
            Severity::High
        } else {
            Severity::Critical
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    WeaponizedMeme,
    BrandSafetyCritical,
}

impl AlertType {
    fn code(self) -> &'static str {
        match self {
            AlertType::WeaponizedMeme => "WPN",
            AlertType::BrandSafetyCritical => "BSC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    ReviewPlacement,
    ImmediateKeywordExclusion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub record_id: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub irony_collapse_index: f64,
    pub toxicity_score: u32,
    pub predicted_readiness: f64,
    pub lookalike_similarity: f64,
    pub impact_prob_24h: Option<f64>,
    pub keywords: Vec<String>,
    pub recommended_action: RecommendedAction,
    pub campaign_exposure: Severity,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AlertAggregator {
    thresholds: ThresholdConfig,
}

impl AlertAggregator {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    pub fn aggregate(&self, records: &[EnrichedRecord]) -> Vec<Alert> {
        self.aggregate_at(records, Utc::now())
    }

    pub fn aggregate_at(&self, records: &[EnrichedRecord], at: DateTime<Utc>) -> Vec<Alert> {
        let mut alerts = self.weaponized_alerts(records, at);
        alerts.extend(self.brand_safety_alerts(records, at));
        rank(&mut alerts);
        alerts
    }

    pub fn weaponized_alerts(&self, records: &[EnrichedRecord], at: DateTime<Utc>) -> Vec<Alert> {
        let alerts: Vec<Alert> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                record.is_weaponized()
                    && record.readiness() > self.thresholds.readiness_alert_threshold
            })
            .map(|(position, record)| {
                let severity = Severity::from_toxicity(record.toxicity_total());
                let keywords = record
                    .toxicity
                    .as_ref()
                    .map(|score| first_unique(&score.matched_terms, MAX_KEYWORDS))
                    .unwrap_or_default();
                build_alert(
                    AlertType::WeaponizedMeme,
                    record,
                    position,
                    at,
                    severity,
                    keywords,
                    RecommendedAction::ReviewPlacement,
                    severity,
                )
            })
            .collect();
        info!("Brand safety alerts generated - weaponized={}", alerts.len());
        alerts
    }

    pub fn brand_safety_alerts(&self, records: &[EnrichedRecord], at: DateTime<Utc>) -> Vec<Alert> {
        let alerts: Vec<Alert> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                record.ici() > self.thresholds.high_ici
                    && record.toxicity_total() >= self.thresholds.toxicity_threshold
            })
            .map(|(position, record)| {
                build_alert(
                    AlertType::BrandSafetyCritical,
                    record,
                    position,
                    at,
                    Severity::Critical,
                    risky_keywords(record.body()),
                    RecommendedAction::ImmediateKeywordExclusion,
                    Severity::High,
                )
            })
            .collect();
        info!("Brand safety alerts generated - critical={}", alerts.len());
        alerts
    }
}

pub fn risky_keywords(body: &str) -> Vec<String> {
    body.to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() >= MIN_KEYWORD_CHARS)
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn build_alert(
    alert_type: AlertType,
    record: &EnrichedRecord,
    position: usize,
    at: DateTime<Utc>,
    severity: Severity,
    keywords: Vec<String>,
    recommended_action: RecommendedAction,
    campaign_exposure: Severity,
) -> Alert {
    let record_id = record.record.stable_id();
    Alert {
        alert_id: format!(
            "ALERT_{}_{}_{}_{}",
            alert_type.code(),
            record_id,
            position,
            at.format("%Y%m%d%H%M%S")
        ),
        record_id,
        alert_type,
        severity,
        irony_collapse_index: record.ici(),
        toxicity_score: record.toxicity_total(),
        predicted_readiness: record.readiness(),
        lookalike_similarity: record.lookalike_similarity(),
        impact_prob_24h: record.impact.map(|impact| impact.impact_prob_24h),
        keywords,
        recommended_action,
        campaign_exposure,
        created_at: at,
    }
}

fn rank(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.toxicity_score.cmp(&a.toxicity_score))
            .then_with(|| {
                b.predicted_readiness
                    .partial_cmp(&a.predicted_readiness)
                    .unwrap_or(Ordering::Equal)
            })
    });
}

fn first_unique(terms: &[String], limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for term in terms {
        if out.len() == limit {
            break;
        }
        if !out.contains(term) {
            out.push(term.clone());
        }
    }
    out
}
