use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SignalConfig;
use crate::error::Result;
use crate::lookalike::{BenchmarkSpace, ClusterAssignment, MemeClusterer};
use crate::modeling::{
    calculate_impact_probability, category_anova, ici_ttest, residual_analysis, AnovaResult,
    MarketImpactModel, ResidualAnalysis, TTestResult, TrainingMetrics,
};
use crate::safety::{channel_safety, high_risk_summary, Alert, AlertAggregator, ChannelSafety, HighRiskSummary};
use crate::scoring::{SemanticScorer, ToxicityScorer};
use crate::{enrich, DataQuality, EnrichedRecord, TextRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub generated_at: DateTime<Utc>,
    pub records: Vec<EnrichedRecord>,
    pub metrics: Option<TrainingMetrics>,
    pub alerts: Vec<Alert>,
    pub channel_safety: Vec<ChannelSafety>,
    pub high_risk: Option<HighRiskSummary>,
    pub clusters: Option<ClusterAssignment>,
    pub ici_ttest: Option<TTestResult>,
    pub category_anova: Option<AnovaResult>,
    pub residuals: Option<ResidualAnalysis>,
}

impl PipelineReport {
    fn empty(at: DateTime<Utc>) -> Self {
        Self {
            generated_at: at,
            records: Vec::new(),
            metrics: None,
            alerts: Vec::new(),
            channel_safety: Vec::new(),
            high_risk: None,
            clusters: None,
            ici_ttest: None,
            category_anova: None,
            residuals: None,
        }
    }

    pub fn flagged_records(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.quality != DataQuality::Clean)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct SignalPipeline {
    config: SignalConfig,
    semantic: SemanticScorer,
    benchmarks: BenchmarkSpace,
    model: MarketImpactModel,
    toxicity: ToxicityScorer,
    aggregator: AlertAggregator,
    clusterer: MemeClusterer,
}

impl SignalPipeline {
    pub fn new(config: SignalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            semantic: SemanticScorer::new(config.semantic.clone()),
            benchmarks: BenchmarkSpace::new(&config.benchmarks)?,
            model: MarketImpactModel::new(config.model.clone()),
            toxicity: ToxicityScorer::new(&config.toxicity, config.thresholds.weaponized_threshold)?,
            aggregator: AlertAggregator::new(config.thresholds.clone()),
            clusterer: MemeClusterer::new(config.clustering.clone()),
            config,
        })
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn model(&self) -> &MarketImpactModel {
        &self.model
    }

    pub fn benchmarks(&self) -> &BenchmarkSpace {
        &self.benchmarks
    }

    pub fn run(&mut self, records: Vec<TextRecord>) -> Result<PipelineReport> {
        self.run_at(records, Utc::now())
    }

    pub fn run_at(&mut self, records: Vec<TextRecord>, at: DateTime<Utc>) -> Result<PipelineReport> {
        if records.is_empty() {
            return Ok(PipelineReport::empty(at));
        }
        info!("Pipeline started - records={}", records.len());
        let matched = self.prepare(records);
        let metrics = self.model.train(&matched)?;
        self.finish(matched, Some(metrics), at)
    }

    pub fn score(&self, records: Vec<TextRecord>) -> Result<PipelineReport> {
        self.score_at(records, Utc::now())
    }

    pub fn score_at(&self, records: Vec<TextRecord>, at: DateTime<Utc>) -> Result<PipelineReport> {
        if records.is_empty() {
            return Ok(PipelineReport::empty(at));
        }
        let matched = self.prepare(records);
        self.finish(matched, None, at)
    }

    fn prepare(&self, records: Vec<TextRecord>) -> Vec<EnrichedRecord> {
        let enriched = enrich(records);
        let flagged = enriched
            .iter()
            .filter(|record| record.quality != DataQuality::Clean)
            .count();
        if flagged > 0 {
            warn!("Data quality flags - flagged={}, total={}", flagged, enriched.len());
        }
        let scored = self.semantic.score_records(&enriched);
        debug!("Semantic scoring complete - records={}", scored.len());
        self.benchmarks.find_lookalikes(&scored)
    }

    fn finish(
        &self,
        matched: Vec<EnrichedRecord>,
        metrics: Option<TrainingMetrics>,
        at: DateTime<Utc>,
    ) -> Result<PipelineReport> {
        let predicted = self.model.predict(&matched)?;
        let projected = calculate_impact_probability(&predicted)?;
        let records = self.toxicity.score_records(&projected);

        let alerts = self.aggregator.aggregate_at(&records, at);
        let labels: Vec<f64> = records
            .iter()
            .map(|record| record.features.map(|f| f.market_readiness).unwrap_or(0.0))
            .collect();
        let predictions: Vec<f64> = records.iter().map(|record| record.readiness()).collect();

        info!(
            "Pipeline complete - records={}, alerts={}",
            records.len(),
            alerts.len()
        );

        Ok(PipelineReport {
            generated_at: at,
            metrics,
            alerts,
            channel_safety: channel_safety(&records),
            high_risk: high_risk_summary(&records, self.config.thresholds.high_risk_toxicity, at),
            clusters: Some(self.clusterer.cluster_records(&records)),
            ici_ttest: ici_ttest(&records),
            category_anova: category_anova(&records, &self.benchmarks),
            residuals: residual_analysis(&labels, &predictions),
            records,
        })
    }
}
