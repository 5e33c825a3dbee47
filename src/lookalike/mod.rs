pub mod benchmarks;
pub mod cluster;
pub mod vector;

pub use benchmarks::{Benchmark, BenchmarkSpace, BenchmarkSpec, BENCHMARK_ICI, BENCHMARK_SERIOUSNESS};
pub use cluster::{ClusterAssignment, MemeClusterer};
pub use vector::{cosine_similarity, create_feature_vector, FeatureVector, FEATURE_DIM};
