use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClusteringConfig;
use crate::lookalike::benchmarks::record_vector;
use crate::lookalike::vector::{squared_distance, FeatureVector, FEATURE_DIM};
use crate::EnrichedRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub labels: Vec<usize>,
    pub centroids: Vec<FeatureVector>,
    pub inertia: f64,
}

impl ClusterAssignment {
    fn empty() -> Self {
        Self {
            labels: Vec::new(),
            centroids: Vec::new(),
            inertia: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemeClusterer {
    config: ClusteringConfig,
}

impl MemeClusterer {
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    pub fn cluster_records(&self, records: &[EnrichedRecord]) -> ClusterAssignment {
        let vectors: Vec<FeatureVector> = records.par_iter().map(record_vector).collect();
        self.fit(&vectors)
    }

    pub fn fit(&self, vectors: &[FeatureVector]) -> ClusterAssignment {
        let k = self.config.clusters.min(vectors.len());
        if k == 0 {
            return ClusterAssignment::empty();
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best: Option<ClusterAssignment> = None;
        for run in 0..self.config.n_init.max(1) {
            let seeds = rand::seq::index::sample(&mut rng, vectors.len(), k).into_vec();
            let centroids = seeds.iter().map(|&idx| vectors[idx]).collect();
            let candidate = self.lloyd(vectors, centroids);
            debug!("K-means run - run={}, k={}, inertia={:.6}", run, k, candidate.inertia);
            let better = best
                .as_ref()
                .map(|current| candidate.inertia < current.inertia)
                .unwrap_or(true);
            if better {
                best = Some(candidate);
            }
        }
        best.unwrap_or_else(ClusterAssignment::empty)
    }

    fn lloyd(&self, vectors: &[FeatureVector], mut centroids: Vec<FeatureVector>) -> ClusterAssignment {
        let mut labels = assign(vectors, &centroids);
        for _ in 0..self.config.max_iter {
            centroids = recompute_centroids(vectors, &labels, &centroids);
            let next = assign(vectors, &centroids);
            if next == labels {
                break;
            }
            labels = next;
        }
        let inertia = vectors
            .iter()
            .zip(labels.iter())
            .map(|(vector, &label)| squared_distance(vector, &centroids[label]))
            .sum();
        ClusterAssignment {
            labels,
            centroids,
            inertia,
        }
    }
}

fn assign(vectors: &[FeatureVector], centroids: &[FeatureVector]) -> Vec<usize> {
    vectors
        .iter()
        .map(|vector| {
            let mut best = 0usize;
            let mut best_distance = f64::INFINITY;
            for (idx, centroid) in centroids.iter().enumerate() {
                let distance = squared_distance(vector, centroid);
                if distance < best_distance {
                    best = idx;
                    best_distance = distance;
                }
            }
            best
        })
        .collect()
}

// an emptied cluster keeps its previous centroid
fn recompute_centroids(
    vectors: &[FeatureVector],
    labels: &[usize],
    previous: &[FeatureVector],
) -> Vec<FeatureVector> {
    let mut sums = vec![[0.0; FEATURE_DIM]; previous.len()];
    let mut counts = vec![0usize; previous.len()];
    for (vector, &label) in vectors.iter().zip(labels.iter()) {
        counts[label] += 1;
        for (sum, value) in sums[label].iter_mut().zip(vector.iter()) {
            *sum += value;
        }
    }
    sums.into_iter()
        .zip(counts)
        .zip(previous.iter())
        .map(|((sum, count), prior)| {
            if count == 0 {
                *prior
            } else {
                sum.map(|value| value / count as f64)
            }
        })
        .collect()
}
