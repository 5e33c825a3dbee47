use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::warn;

use crate::EnrichedRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSafety {
    pub channel: String,
    pub avg_toxicity: f64,
    pub weaponized_count: usize,
    pub total_posts: usize,
    pub weaponized_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighRiskSummary {
    pub generated_at: DateTime<Utc>,
    pub high_risk_count: usize,
    pub top_channels: Vec<(String, usize)>,
    pub average_toxicity: f64,
}

pub fn channel_safety(records: &[EnrichedRecord]) -> Vec<ChannelSafety> {
    let mut groups: BTreeMap<&str, (u64, usize, usize)> = BTreeMap::new();
    for record in records {
        let entry = groups
            .entry(record.record.subreddit_or_channel.as_str())
            .or_insert((0, 0, 0));
        entry.0 += record.toxicity_total() as u64;
        entry.1 += usize::from(record.is_weaponized());
        entry.2 += 1;
    }

    let mut rows: Vec<ChannelSafety> = groups
        .into_iter()
        .map(|(channel, (toxicity, weaponized, total))| ChannelSafety {
            channel: channel.to_string(),
            avg_toxicity: toxicity as f64 / total as f64,
            weaponized_count: weaponized,
            total_posts: total,
            weaponized_rate: weaponized as f64 / total as f64,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.weaponized_rate
            .partial_cmp(&a.weaponized_rate)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

pub fn high_risk_summary(
    records: &[EnrichedRecord],
    min_toxicity: u32,
    at: DateTime<Utc>,
) -> Option<HighRiskSummary> {
    let high_risk: Vec<&EnrichedRecord> = records
        .iter()
        .filter(|record| record.toxicity_total() >= min_toxicity)
        .collect();
    if high_risk.is_empty() {
        return None;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &high_risk {
        *counts
            .entry(record.record.subreddit_or_channel.as_str())
            .or_insert(0) += 1;
    }
    let mut top_channels: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(channel, count)| (channel.to_string(), count))
        .collect();
    top_channels.sort_by(|a, b| b.1.cmp(&a.1));
    top_channels.truncate(3);

    let total: u64 = high_risk.iter().map(|record| record.toxicity_total() as u64).sum();
    warn!("High-risk memes detected - count={}", high_risk.len());

    Some(HighRiskSummary {
        generated_at: at,
        high_risk_count: high_risk.len(),
        top_channels,
        average_toxicity: total as f64 / high_risk.len() as f64,
    })
}
