pub mod config;
pub mod error;
pub mod lookalike;
pub mod modeling;
pub mod pipeline;
pub mod safety;
pub mod scoring;

use chrono::DateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::ThresholdConfig;

pub use crate::config::SignalConfig;
pub use crate::error::{Result, SignalError};
pub use crate::pipeline::{PipelineReport, SignalPipeline};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTextRecord")]
pub struct TextRecord {
    pub id: String,
    pub body: Option<String>,
    pub source_timestamp: Option<i64>,
    pub subreddit_or_channel: String,
    pub score: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coerced_fields: Vec<String>,
}

impl TextRecord {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: Some(body.into()),
            source_timestamp: None,
            subreddit_or_channel: String::new(),
            score: 0,
            coerced_fields: Vec::new(),
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.subreddit_or_channel = channel.into();
        self
    }

    pub fn with_score(mut self, score: u64) -> Self {
        self.score = score;
        self
    }

    pub fn text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    pub fn stable_id(&self) -> String {
        if !self.id.trim().is_empty() {
            return self.id.clone();
        }
        format!("post_{:x}", stable_hash64(self.text()))
    }

    pub fn quality(&self) -> DataQuality {
        match self.body.as_deref() {
            None => DataQuality::MissingBody,
            Some(body) if body.trim().is_empty() => DataQuality::EmptyBody,
            Some(_) if !self.coerced_fields.is_empty() => DataQuality::CoercedFields,
            Some(_) => DataQuality::Clean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Clean,
    CoercedFields,
    EmptyBody,
    MissingBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemanticScore {
    pub seriousness_threshold: f64,
    pub irony_collapse_index: f64,
    pub financial_keyword_count: usize,
    pub humor_keyword_count: usize,
}

impl SemanticScore {
    pub fn neutral() -> Self {
        Self {
            seriousness_threshold: 0.5,
            irony_collapse_index: 0.5,
            financial_keyword_count: 0,
            humor_keyword_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookalikeMatch {
    pub benchmark_id: String,
    pub similarity: f64,
    pub estimated_market_impact: f64,
}

impl LookalikeMatch {
    pub fn is_strong(&self, lookalike_threshold: f64) -> bool {
        self.similarity >= lookalike_threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineeredFeatures {
    pub financial_words: usize,
    pub urgency_words: usize,
    pub caps_ratio: f64,
    pub exclamation_count: usize,
    pub text_length: usize,
    pub market_readiness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactPrediction {
    pub predicted_readiness: f64,
    pub impact_prob_24h: f64,
    pub impact_prob_48h: f64,
    pub impact_prob_72h: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToxicityScore {
    pub total_toxicity: u32,
    pub category_breakdown: BTreeMap<String, u32>,
    pub matched_terms: Vec<String>,
    pub is_weaponized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IciBand {
    Ironic,
    Low,
    Medium,
    High,
}

impl IciBand {
    pub fn from_index(ici: f64, thresholds: &ThresholdConfig) -> Self {
        if ici > thresholds.high_ici {
            IciBand::High
        } else if ici > thresholds.medium_ici {
            IciBand::Medium
        } else if ici > thresholds.low_ici {
            IciBand::Low
        } else {
            IciBand::Ironic
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IciBand::Ironic => "Ironic",
            IciBand::Low => "Low",
            IciBand::Medium => "Medium",
            IciBand::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub record: TextRecord,
    pub quality: DataQuality,
    pub semantic: Option<SemanticScore>,
    pub lookalike: Option<LookalikeMatch>,
    pub features: Option<EngineeredFeatures>,
    pub predicted_readiness: Option<f64>,
    pub impact: Option<ImpactPrediction>,
    pub toxicity: Option<ToxicityScore>,
}

impl EnrichedRecord {
    pub fn new(record: TextRecord) -> Self {
        let quality = record.quality();
        Self {
            record,
            quality,
            semantic: None,
            lookalike: None,
            features: None,
            predicted_readiness: None,
            impact: None,
            toxicity: None,
        }
    }

    pub fn body(&self) -> &str {
        self.record.text()
    }

    pub fn seriousness(&self) -> f64 {
        self.semantic
            .map(|score| score.seriousness_threshold)
            .unwrap_or(0.5)
    }

    pub fn ici(&self) -> f64 {
        self.semantic
            .map(|score| score.irony_collapse_index)
            .unwrap_or(0.5)
    }

    pub fn lookalike_similarity(&self) -> f64 {
        self.lookalike
            .as_ref()
            .map(|matched| matched.similarity)
            .unwrap_or(0.0)
    }

    pub fn readiness(&self) -> f64 {
        self.predicted_readiness.unwrap_or(0.0)
    }

    pub fn toxicity_total(&self) -> u32 {
        self.toxicity
            .as_ref()
            .map(|score| score.total_toxicity)
            .unwrap_or(0)
    }

    pub fn is_weaponized(&self) -> bool {
        self.toxicity
            .as_ref()
            .map(|score| score.is_weaponized)
            .unwrap_or(false)
    }

    pub fn ici_band(&self, thresholds: &ThresholdConfig) -> IciBand {
        IciBand::from_index(self.ici(), thresholds)
    }
}

pub fn enrich(records: Vec<TextRecord>) -> Vec<EnrichedRecord> {
    records.into_iter().map(EnrichedRecord::new).collect()
}

// raw JSON per field; malformed values are coerced and listed in `coerced_fields`
#[derive(Deserialize)]
struct RawTextRecord {
    #[serde(default, deserialize_with = "present")]
    id: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    body: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    source_timestamp: Option<Value>,
    #[serde(
        default,
        alias = "subreddit",
        alias = "channel",
        deserialize_with = "present"
    )]
    subreddit_or_channel: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    score: Option<Value>,
    #[serde(default)]
    coerced_fields: Vec<String>,
}

impl From<RawTextRecord> for TextRecord {
    fn from(raw: RawTextRecord) -> Self {
        let mut coerced = raw.coerced_fields;
        let mut mark = |field: &str, clean: bool| {
            if !clean && !coerced.iter().any(|name| name == field) {
                coerced.push(field.to_string());
            }
        };

        let (id, clean) = lenient_text(raw.id);
        mark("id", clean);
        let body = match raw.body {
            Some(Value::String(text)) => Some(text),
            _ => None,
        };
        let (source_timestamp, clean) = lenient_timestamp(raw.source_timestamp);
        mark("source_timestamp", clean);
        let (subreddit_or_channel, clean) = lenient_text(raw.subreddit_or_channel);
        mark("subreddit_or_channel", clean);
        let (score, clean) = lenient_score(raw.score);
        mark("score", clean);

        Self {
            id,
            body,
            source_timestamp,
            subreddit_or_channel,
            score,
            coerced_fields: coerced,
        }
    }
}

// absent stays `None`, an explicit null becomes `Some(Value::Null)`
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn lenient_text(value: Option<Value>) -> (String, bool) {
    match value {
        None => (String::new(), true),
        Some(Value::String(text)) => (text, true),
        Some(Value::Number(number)) => (number.to_string(), false),
        Some(Value::Bool(flag)) => (flag.to_string(), false),
        Some(_) => (String::new(), false),
    }
}

fn lenient_timestamp(value: Option<Value>) -> (Option<i64>, bool) {
    match value {
        None | Some(Value::Null) => (None, true),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(seconds) => (Some(seconds), true),
            None => (
                number
                    .as_f64()
                    .filter(|seconds| seconds.is_finite())
                    .map(|seconds| seconds.trunc() as i64),
                false,
            ),
        },
        Some(Value::String(text)) => {
            let text = text.trim();
            let parsed = text.parse::<i64>().ok().or_else(|| {
                DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|stamp| stamp.timestamp())
            });
            (parsed, false)
        }
        Some(_) => (None, false),
    }
}

fn lenient_score(value: Option<Value>) -> (u64, bool) {
    match value {
        None | Some(Value::Null) => (0, true),
        Some(Value::Number(number)) => match number.as_u64() {
            Some(score) => (score, true),
            None => (
                number
                    .as_f64()
                    .filter(|score| score.is_finite())
                    .map(|score| score.max(0.0).round() as u64)
                    .unwrap_or(0),
                false,
            ),
        },
        Some(Value::String(text)) => (text.trim().parse::<u64>().unwrap_or(0), false),
        Some(_) => (0, false),
    }
}

pub(crate) fn stable_hash64(value: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

pub(crate) fn clamp01(value: f64) -> f64 {
    clamp_range(value, 0.0, 1.0)
}

pub(crate) fn clamp_range(value: f64, low: f64, high: f64) -> f64 {
    if value.is_nan() {
        return low;
    }
    value.max(low).min(high)
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
