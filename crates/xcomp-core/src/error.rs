use thiserror::Error;

/// Validation and contract errors exposed by `xcomp-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol must look like '/<SIGNATURE>:XCOMP': '{value}'")]
    SymbolMalformed { value: String },
    #[error("symbol signature cannot be empty")]
    EmptySignature,
    #[error("symbol signature must contain a trait name, not only digits: '{value}'")]
    SignatureWithoutName { value: String },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },
    #[error("symbol tier '{value}' must be a positive integer without leading zeros")]
    InvalidTier { value: String },

    #[error("day key must be an ISO-8601 date (YYYY-MM-DD): '{value}'")]
    InvalidDayKey { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },

    #[error("setting '{name}' has invalid value '{value}': {reason}")]
    InvalidSetting {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}
