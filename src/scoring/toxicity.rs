use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ToxicityConfig;
use crate::error::{Result, SignalError};
use crate::{EnrichedRecord, ToxicityScore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToxicityCategory {
    pub name: String,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone)]
struct CategoryPattern {
    name: String,
    pattern: Option<Regex>,
}

#[derive(Debug, Clone)]
pub struct ToxicityScorer {
    categories: Vec<CategoryPattern>,
    weaponized_threshold: u32,
}

impl ToxicityScorer {
    pub fn new(config: &ToxicityConfig, weaponized_threshold: u32) -> Result<Self> {
        let categories = config
            .categories
            .iter()
            .map(compile_category)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            categories,
            weaponized_threshold,
        })
    }

    pub fn weaponized_threshold(&self) -> u32 {
        self.weaponized_threshold
    }

    pub fn analyze(&self, text: &str) -> (u32, BTreeMap<String, u32>) {
        let lowercase = text.to_lowercase();
        let mut breakdown = BTreeMap::new();
        for category in &self.categories {
            let hits = category
                .pattern
                .as_ref()
                .map(|pattern| pattern.find_iter(&lowercase).count() as u32)
                .unwrap_or(0);
            *breakdown.entry(category.name.clone()).or_insert(0) += hits;
        }
        let total = breakdown.values().sum();
        (total, breakdown)
    }

    pub fn score(&self, text: &str) -> ToxicityScore {
        let (total_toxicity, category_breakdown) = self.analyze(text);
        ToxicityScore {
            total_toxicity,
            category_breakdown,
            matched_terms: self.matched_terms(text),
            is_weaponized: total_toxicity >= self.weaponized_threshold,
        }
    }

    pub fn matched_terms(&self, text: &str) -> Vec<String> {
        let lowercase = text.to_lowercase();
        let mut hits: Vec<(usize, String)> = self
            .categories
            .iter()
            .filter_map(|category| category.pattern.as_ref())
            .flat_map(|pattern| {
                pattern
                    .find_iter(&lowercase)
                    .map(|found| (found.start(), found.as_str().to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();
        hits.sort_by_key(|(start, _)| *start);
        hits.into_iter().map(|(_, term)| term).collect()
    }

    pub fn score_records(&self, records: &[EnrichedRecord]) -> Vec<EnrichedRecord> {
        records
            .par_iter()
            .map(|record| EnrichedRecord {
                toxicity: Some(self.score(record.body())),
                ..record.clone()
            })
            .collect()
    }
}

fn compile_category(category: &ToxicityCategory) -> Result<CategoryPattern> {
    let terms: Vec<String> = category
        .terms
        .iter()
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .map(|term| regex::escape(&term))
        .collect();
    if terms.is_empty() {
        return Ok(CategoryPattern {
            name: category.name.clone(),
            pattern: None,
        });
    }
    let source = format!(r"\b(?:{})\b", terms.join("|"));
    let pattern = Regex::new(&source).map_err(|err| SignalError::InvalidPattern {
        name: category.name.clone(),
        reason: err.to_string(),
    })?;
    Ok(CategoryPattern {
        name: category.name.clone(),
        pattern: Some(pattern),
    })
}
