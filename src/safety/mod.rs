pub mod alerts;
pub mod monitor;

pub use alerts::{Alert, AlertAggregator, AlertType, RecommendedAction, Severity};
pub use monitor::{channel_safety, high_risk_summary, ChannelSafety, HighRiskSummary};
