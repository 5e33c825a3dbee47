use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SignalError};
use crate::lookalike::vector::{cosine_similarity, create_feature_vector, FeatureVector};
use crate::{EnrichedRecord, LookalikeMatch};

pub const BENCHMARK_SERIOUSNESS: f64 = 0.9;
pub const BENCHMARK_ICI: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSpec {
    pub id: String,
    pub text: String,
    pub market_impact: f64,
    pub category: String,
}

impl BenchmarkSpec {
    pub fn new(id: &str, text: &str, market_impact: f64, category: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            market_impact,
            category: category.to_string(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            BenchmarkSpec::new(
                "DOGE_2021",
                "DOGE to the moon diamond hands hold the line crypto investment",
                0.95,
                "cryptocurrency",
            ),
            BenchmarkSpec::new(
                "GME_2021",
                "GME stonks ape together strong buy hold wallstreetbets",
                0.98,
                "stocks",
            ),
            BenchmarkSpec::new(
                "NFT_2021",
                "NFT investment mint drop blockchain digital art",
                0.85,
                "crypto_art",
            ),
            BenchmarkSpec::new(
                "SHIB_2021",
                "SHIB shiba inu meme coin hold investment community",
                0.82,
                "cryptocurrency",
            ),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct Benchmark {
    pub spec: BenchmarkSpec,
    pub vector: FeatureVector,
}

#[derive(Debug, Clone)]
pub struct BenchmarkSpace {
    benchmarks: Vec<Benchmark>,
}

impl BenchmarkSpace {
    pub fn new(specs: &[BenchmarkSpec]) -> Result<Self> {
        if specs.is_empty() {
            return Err(SignalError::Config("benchmark set is empty".to_string()));
        }
        let benchmarks = specs
            .iter()
            .map(|spec| Benchmark {
                vector: create_feature_vector(&spec.text, BENCHMARK_SERIOUSNESS, BENCHMARK_ICI),
                spec: spec.clone(),
            })
            .collect();
        Ok(Self { benchmarks })
    }

    pub fn benchmarks(&self) -> &[Benchmark] {
        &self.benchmarks
    }

    pub fn get(&self, id: &str) -> Option<&Benchmark> {
        self.benchmarks.iter().find(|benchmark| benchmark.spec.id == id)
    }

    pub fn similarity_matrix(&self, vectors: &[FeatureVector]) -> Vec<Vec<f64>> {
        vectors
            .par_iter()
            .map(|vector| {
                self.benchmarks
                    .iter()
                    .map(|benchmark| cosine_similarity(vector, &benchmark.vector))
                    .collect()
            })
            .collect()
    }

    pub fn match_vector(&self, vector: &FeatureVector) -> LookalikeMatch {
        let row: Vec<f64> = self
            .benchmarks
            .iter()
            .map(|benchmark| cosine_similarity(vector, &benchmark.vector))
            .collect();
        self.best_match(&row)
    }

    pub fn find_lookalikes(&self, records: &[EnrichedRecord]) -> Vec<EnrichedRecord> {
        if records.is_empty() {
            return Vec::new();
        }
        let vectors: Vec<FeatureVector> = records.par_iter().map(record_vector).collect();
        let matrix = self.similarity_matrix(&vectors);
        debug!(
            "Lookalike matching - records={}, benchmarks={}",
            records.len(),
            self.benchmarks.len()
        );

        records
            .iter()
            .zip(matrix.iter())
            .map(|(record, row)| EnrichedRecord {
                lookalike: Some(self.best_match(row)),
                ..record.clone()
            })
            .collect()
    }

    // strict `>` keeps the first-listed benchmark on ties
    fn best_match(&self, row: &[f64]) -> LookalikeMatch {
        let mut best_idx = 0usize;
        let mut best_similarity = f64::NEG_INFINITY;
        for (idx, similarity) in row.iter().enumerate() {
            if *similarity > best_similarity {
                best_idx = idx;
                best_similarity = *similarity;
            }
        }
        let benchmark = &self.benchmarks[best_idx];
        let similarity = if best_similarity.is_finite() {
            best_similarity
        } else {
            0.0
        };
        LookalikeMatch {
            benchmark_id: benchmark.spec.id.clone(),
            similarity,
            estimated_market_impact: similarity * benchmark.spec.market_impact,
        }
    }
}

pub(crate) fn record_vector(record: &EnrichedRecord) -> FeatureVector {
    create_feature_vector(record.body(), record.seriousness(), record.ici())
}
