use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::{char_len, EngineeredFeatures, EnrichedRecord};

fn financial_action_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(?:buy|invest|hold|long|bullish|calls|puts|strike)\b")
            .expect("static financial-action pattern")
    })
}

fn urgency_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(?:now|today|asap|urgent|quick|fast)\b").expect("static urgency pattern")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumn {
    SeriousnessThreshold,
    IronyCollapseIndex,
    LookalikeSimilarity,
    FinancialKeywordCount,
    HumorKeywordCount,
    FinancialWords,
    UrgencyWords,
    CapsRatio,
    ExclamationCount,
    TextLength,
}

pub const FEATURE_COLUMNS: [FeatureColumn; 10] = [
    FeatureColumn::SeriousnessThreshold,
    FeatureColumn::IronyCollapseIndex,
    FeatureColumn::LookalikeSimilarity,
    FeatureColumn::FinancialKeywordCount,
    FeatureColumn::HumorKeywordCount,
    FeatureColumn::FinancialWords,
    FeatureColumn::UrgencyWords,
    FeatureColumn::CapsRatio,
    FeatureColumn::ExclamationCount,
    FeatureColumn::TextLength,
];

impl FeatureColumn {
    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::SeriousnessThreshold => "seriousness_threshold",
            FeatureColumn::IronyCollapseIndex => "irony_collapse_index",
            FeatureColumn::LookalikeSimilarity => "lookalike_similarity",
            FeatureColumn::FinancialKeywordCount => "financial_keyword_count",
            FeatureColumn::HumorKeywordCount => "humor_keyword_count",
            FeatureColumn::FinancialWords => "financial_words",
            FeatureColumn::UrgencyWords => "urgency_words",
            FeatureColumn::CapsRatio => "caps_ratio",
            FeatureColumn::ExclamationCount => "exclamation_count",
            FeatureColumn::TextLength => "text_length",
        }
    }

    pub fn value(self, record: &EnrichedRecord) -> f64 {
        let features = record.features.unwrap_or_else(|| text_features(record.body(), 0.0));
        match self {
            FeatureColumn::SeriousnessThreshold => record.seriousness(),
            FeatureColumn::IronyCollapseIndex => record.ici(),
            FeatureColumn::LookalikeSimilarity => record.lookalike_similarity(),
            FeatureColumn::FinancialKeywordCount => record
                .semantic
                .map(|score| score.financial_keyword_count as f64)
                .unwrap_or(0.0),
            FeatureColumn::HumorKeywordCount => record
                .semantic
                .map(|score| score.humor_keyword_count as f64)
                .unwrap_or(0.0),
            FeatureColumn::FinancialWords => features.financial_words as f64,
            FeatureColumn::UrgencyWords => features.urgency_words as f64,
            FeatureColumn::CapsRatio => features.caps_ratio,
            FeatureColumn::ExclamationCount => features.exclamation_count as f64,
            FeatureColumn::TextLength => features.text_length as f64,
        }
    }
}

/// The label's engagement term is normalized by the batch maximum, so the
/// whole batch has to be present; a batch whose maximum engagement is 0
/// contributes 0 for that term.
pub fn engineer_features(records: &[EnrichedRecord]) -> Vec<EnrichedRecord> {
    let max_engagement = records
        .iter()
        .map(|record| record.record.score)
        .max()
        .unwrap_or(0);

    records
        .par_iter()
        .map(|record| {
            let engagement = if max_engagement == 0 {
                0.0
            } else {
                record.record.score as f64 / max_engagement as f64
            };
            let readiness = 0.3 * record.seriousness()
                + 0.3 * record.ici()
                + 0.2 * record.lookalike_similarity()
                + 0.2 * engagement;
            EnrichedRecord {
                features: Some(text_features(record.body(), readiness)),
                ..record.clone()
            }
        })
        .collect()
}

pub fn feature_row(record: &EnrichedRecord) -> Vec<f64> {
    FEATURE_COLUMNS.iter().map(|column| column.value(record)).collect()
}

fn text_features(text: &str, market_readiness: f64) -> EngineeredFeatures {
    let lowercase = text.to_lowercase();
    let text_length = char_len(text);
    let uppercase = text.chars().filter(|ch| ch.is_uppercase()).count();
    EngineeredFeatures {
        financial_words: financial_action_pattern().find_iter(&lowercase).count(),
        urgency_words: urgency_pattern().find_iter(&lowercase).count(),
        caps_ratio: uppercase as f64 / (text_length + 1) as f64,
        exclamation_count: text.matches('!').count(),
        text_length,
        market_readiness,
    }
}
