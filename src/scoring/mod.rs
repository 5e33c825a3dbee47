pub mod semantic;
pub mod toxicity;

pub use semantic::{irony_collapse_from_counts, seriousness_from_counts, SemanticScorer};
pub use toxicity::{ToxicityCategory, ToxicityScorer};
