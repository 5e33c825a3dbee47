use regex::Regex;
use std::sync::OnceLock;

use crate::char_len;

pub const FEATURE_DIM: usize = 20;

pub type FeatureVector = [f64; FEATURE_DIM];

const MARKER_TERMS: [&str; 8] = [
    "buy", "invest", "hold", "moon", "diamond", "hands", "ape", "stonk",
];
const PRESENCE_TERMS: [&str; 3] = ["crypto", "stock", "nft"];
const MOMENTUM_TERMS: [&str; 3] = ["rocket", "gain", "loss"];

fn caps_run_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Z]{2,}").expect("static caps-run pattern"))
}

/// Lookalike vector layout:
/// - `0..2`: seriousness, irony-collapse index
/// - `2..10`: marker substring counts over `len + 1`
/// - `10`: word count / 100
/// - `11`: ALL-CAPS runs of two or more letters over `len + 1`
/// - `12..14`: `!` and `$` counts over `len + 1`
/// - `14..17`: presence of "crypto", "stock", "nft"
/// - `17..20`: "rocket", "gain", "loss" counts over `len + 1`
pub fn create_feature_vector(text: &str, seriousness: f64, ici: f64) -> FeatureVector {
    let lowercase = text.to_lowercase();
    let denom = (char_len(text) + 1) as f64;
    let share = |count: usize| count as f64 / denom;

    let mut vector = [0.0; FEATURE_DIM];
    vector[0] = seriousness;
    vector[1] = ici;
    for (offset, term) in MARKER_TERMS.iter().enumerate() {
        vector[2 + offset] = share(lowercase.matches(term).count());
    }
    vector[10] = text.split_whitespace().count() as f64 / 100.0;
    vector[11] = share(caps_run_pattern().find_iter(text).count());
    vector[12] = share(text.matches('!').count());
    vector[13] = share(text.matches('$').count());
    for (offset, term) in PRESENCE_TERMS.iter().enumerate() {
        vector[14 + offset] = if lowercase.contains(term) { 1.0 } else { 0.0 };
    }
    for (offset, term) in MOMENTUM_TERMS.iter().enumerate() {
        vector[17 + offset] = share(lowercase.matches(term).count());
    }
    vector
}

pub fn cosine_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

pub(crate) fn dot(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub(crate) fn norm(v: &FeatureVector) -> f64 {
    dot(v, v).sqrt()
}

pub(crate) fn squared_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
