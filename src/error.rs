#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("market impact model has not been trained")]
    ModelNotTrained,

    #[error("not enough records to train: got {records}, need at least {required}")]
    InsufficientData { records: usize, required: usize },

    #[error("training failed ({statistic}): {reason}")]
    TrainingFailed { statistic: String, reason: String },

    #[error("record {record_id} has no predicted readiness")]
    MissingPrediction { record_id: String },

    #[error("invalid pattern for {name}: {reason}")]
    InvalidPattern { name: String, reason: String },
}

impl SignalError {
    pub fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        SignalError::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SignalError>;
