use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Result, SignalError};
use crate::lookalike::BenchmarkSpec;
use crate::scoring::ToxicityCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub high_ici: f64,
    pub medium_ici: f64,
    pub low_ici: f64,
    pub toxicity_threshold: u32,
    pub lookalike_threshold: f64,
    pub weaponized_threshold: u32,
    pub readiness_alert_threshold: f64,
    pub high_risk_toxicity: u32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high_ici: 0.8,
            medium_ici: 0.5,
            low_ici: 0.3,
            toxicity_threshold: 2,
            lookalike_threshold: 0.7,
            weaponized_threshold: 2,
            readiness_alert_threshold: 0.5,
            high_risk_toxicity: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    pub financial_keywords: Vec<String>,
    pub humor_keywords: Vec<String>,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            financial_keywords: to_strings(&[
                "buy", "invest", "hold", "long", "bullish", "calls", "puts", "position",
                "portfolio", "stake",
            ]),
            humor_keywords: to_strings(&[
                "lol", "lmao", "haha", "joke", "jk", "kidding", "ironic", "sarcasm",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToxicityConfig {
    pub categories: Vec<ToxicityCategory>,
}

impl Default for ToxicityConfig {
    fn default() -> Self {
        let category = |name: &str, terms: &[&str]| ToxicityCategory {
            name: name.to_string(),
            terms: to_strings(terms),
        };
        Self {
            categories: vec![
                category(
                    "misinformation",
                    &["fake", "scam", "ponzi", "rug pull", "fraud"],
                ),
                category("harassment", &["attack", "target", "brigade", "raid"]),
                category("extremism", &["war", "fight", "destroy", "kill"]),
                category(
                    "manipulation",
                    &["pump", "dump", "coordinate", "manipulate"],
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub overfit_tolerance: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            overfit_tolerance: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub clusters: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub seed: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            clusters: 6,
            n_init: 10,
            max_iter: 300,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub thresholds: ThresholdConfig,
    pub semantic: SemanticConfig,
    pub toxicity: ToxicityConfig,
    pub model: ModelConfig,
    pub clustering: ClusteringConfig,
    pub benchmarks: Vec<BenchmarkSpec>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            semantic: SemanticConfig::default(),
            toxicity: ToxicityConfig::default(),
            model: ModelConfig::default(),
            clustering: ClusteringConfig::default(),
            benchmarks: BenchmarkSpec::defaults(),
        }
    }
}

impl SignalConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>)> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents).map_err(|err| SignalError::parse("config", err))?
            } else {
                SignalConfig::default()
            }
        } else {
            SignalConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| SignalError::Config(format!("failed to serialize config: {}", err)))?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if !(t.low_ici <= t.medium_ici && t.medium_ici <= t.high_ici) {
            return Err(SignalError::Config(format!(
                "ici thresholds must be ordered low <= medium <= high, got {} / {} / {}",
                t.low_ici, t.medium_ici, t.high_ici
            )));
        }
        let split = self.model.test_fraction;
        if !(split > 0.0 && split < 1.0) {
            return Err(SignalError::Config(format!(
                "test_fraction must be in (0, 1), got {}",
                split
            )));
        }
        if self.benchmarks.is_empty() {
            return Err(SignalError::Config("benchmark set is empty".to_string()));
        }
        for benchmark in &self.benchmarks {
            if !(benchmark.market_impact > 0.0 && benchmark.market_impact <= 1.0) {
                return Err(SignalError::Config(format!(
                    "benchmark {} has market_impact {} outside (0, 1]",
                    benchmark.id, benchmark.market_impact
                )));
            }
        }
        if self.clustering.clusters == 0 {
            return Err(SignalError::Config("clustering.clusters must be at least 1".to_string()));
        }
        if self.clustering.n_init == 0 {
            return Err(SignalError::Config("clustering.n_init must be at least 1".to_string()));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_parse::<f64>("SIGNAL_HIGH_ICI") {
            self.thresholds.high_ici = value;
        }
        if let Some(value) = env_parse::<u32>("SIGNAL_TOXICITY_THRESHOLD") {
            self.thresholds.toxicity_threshold = value;
        }
        if let Some(value) = env_parse::<u32>("SIGNAL_WEAPONIZED_THRESHOLD") {
            self.thresholds.weaponized_threshold = value;
        }
        if let Some(value) = env_parse::<f64>("SIGNAL_LOOKALIKE_THRESHOLD") {
            self.thresholds.lookalike_threshold = value;
        }
        if let Some(value) = env_parse::<u64>("SIGNAL_MODEL_SEED") {
            self.model.seed = value;
        }
        if let Some(value) = env_parse::<f64>("SIGNAL_TEST_FRACTION") {
            self.model.test_fraction = value;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse::<T>().ok())
}

fn default_config_path() -> Option<PathBuf> {
    env::var("SIGNAL_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/signal.toml")))
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
