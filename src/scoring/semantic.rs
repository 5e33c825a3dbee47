use rayon::prelude::*;

use crate::config::SemanticConfig;
use crate::{clamp01, DataQuality, EnrichedRecord, SemanticScore};

/// Keywords are counted as lowercase substrings, so "holding" counts as
/// "hold" and "jklol" counts twice.
#[derive(Debug, Clone)]
pub struct SemanticScorer {
    financial_keywords: Vec<String>,
    humor_keywords: Vec<String>,
}

impl SemanticScorer {
    pub fn new(config: SemanticConfig) -> Self {
        Self {
            financial_keywords: normalize_keywords(config.financial_keywords),
            humor_keywords: normalize_keywords(config.humor_keywords),
        }
    }

    pub fn keyword_counts(&self, text: &str) -> (usize, usize) {
        let lowercase = text.to_lowercase();
        (
            count_keywords(&lowercase, &self.financial_keywords),
            count_keywords(&lowercase, &self.humor_keywords),
        )
    }

    pub fn seriousness_threshold(&self, text: &str) -> f64 {
        let (financial, humor) = self.keyword_counts(text);
        clamp01(seriousness_from_counts(financial, humor))
    }

    pub fn irony_collapse_index(&self, text: &str) -> f64 {
        let (financial, humor) = self.keyword_counts(text);
        clamp01(irony_collapse_from_counts(financial, humor))
    }

    pub fn score(&self, text: &str) -> SemanticScore {
        let (financial, humor) = self.keyword_counts(text);
        SemanticScore {
            seriousness_threshold: clamp01(seriousness_from_counts(financial, humor)),
            irony_collapse_index: clamp01(irony_collapse_from_counts(financial, humor)),
            financial_keyword_count: financial,
            humor_keyword_count: humor,
        }
    }

    pub fn score_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<SemanticScore> {
        texts.par_iter().map(|text| self.score(text.as_ref())).collect()
    }

    pub fn score_records(&self, records: &[EnrichedRecord]) -> Vec<EnrichedRecord> {
        records
            .par_iter()
            .map(|record| {
                let score = match record.quality {
                    DataQuality::MissingBody => SemanticScore::neutral(),
                    _ => self.score(record.body()),
                };
                EnrichedRecord {
                    semantic: Some(score),
                    ..record.clone()
                }
            })
            .collect()
    }
}

impl Default for SemanticScorer {
    fn default() -> Self {
        Self::new(SemanticConfig::default())
    }
}

pub fn seriousness_from_counts(financial: usize, humor: usize) -> f64 {
    let total = financial + humor;
    if total == 0 {
        return 0.5;
    }
    financial as f64 / total as f64
}

pub fn irony_collapse_from_counts(financial: usize, humor: usize) -> f64 {
    if humor == 0 && financial > 0 {
        return 0.9;
    }
    if humor > financial * 2 {
        return 0.1;
    }
    // no keywords at all: neutral midpoint, same as the seriousness threshold
    if financial + humor == 0 {
        return 0.5;
    }
    let share = financial as f64 / (financial + humor) as f64;
    if financial > humor {
        0.7 + share * 0.3
    } else {
        0.3 + share * 0.4
    }
}

fn count_keywords(lowercase: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .map(|keyword| lowercase.matches(keyword.as_str()).count())
        .sum()
}

fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}
