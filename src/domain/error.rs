//! Domain error types.

/// Malformed or semantically invalid input reaching a calculator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("invalid price {price} at index {index}")]
    InvalidPrice { index: usize, price: f64 },

    #[error("return at index {index} is not finite")]
    NonFiniteReturn { index: usize },

    #[error("negative amount {amount} for asset {asset}")]
    NegativeAmount { asset: String, amount: f64 },

    #[error("non-finite amount for asset {asset}")]
    NonFiniteAmount { asset: String },

    #[error("empty asset identifier")]
    EmptyAssetId,

    #[error("duplicate asset identifier: {0}")]
    DuplicateAsset(String),

    #[error("no price history for asset {asset}")]
    MissingPriceHistory { asset: String },

    #[error("invalid risk weights: {reason}")]
    InvalidWeights { reason: String },

    #[error("invalid volatility normalization: {reason}")]
    InvalidNormalization { reason: String },

    #[error("unknown risk profile: {0}")]
    UnknownRiskProfile(String),
}

/// Top-level error type for astraport.
#[derive(Debug, thiserror::Error)]
pub enum AstraportError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

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

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no holdings found for wallet {wallet}")]
    NoData { wallet: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AstraportError> for std::process::ExitCode {
    fn from(err: &AstraportError) -> Self {
        let code: u8 = match err {
            AstraportError::Io(_) => 1,
            AstraportError::ConfigParse { .. }
            | AstraportError::ConfigMissing { .. }
            | AstraportError::ConfigInvalid { .. } => 2,
            AstraportError::DataSource { .. } => 3,
            AstraportError::InvalidInput(_) => 4,
            AstraportError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
