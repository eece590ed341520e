//! Domain error types.

/// Top-level error type for trendwatch.
#[derive(Debug, thiserror::Error)]
pub enum TrendwatchError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("unsupported chart type: {requested} (supported: weekly)")]
    UnsupportedChart { requested: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {units} units, need at least {minimum}")]
    InsufficientUnits {
        symbol: String,
        units: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TrendwatchError> for std::process::ExitCode {
    fn from(err: &TrendwatchError) -> Self {
        let code: u8 = match err {
            TrendwatchError::Io(_) => 1,
            TrendwatchError::ConfigParse { .. }
            | TrendwatchError::ConfigMissing { .. }
            | TrendwatchError::ConfigInvalid { .. } => 2,
            TrendwatchError::Data { .. } => 3,
            TrendwatchError::InvalidParam { .. } | TrendwatchError::UnsupportedChart { .. } => 4,
            TrendwatchError::NoData { .. } | TrendwatchError::InsufficientUnits { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
