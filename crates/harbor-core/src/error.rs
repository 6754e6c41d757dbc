//! Error types for Harbor

use thiserror::Error;

/// The main error type for Harbor operations
#[derive(Debug, Error)]
pub enum HarborError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Import error: {0}")]
    ImportError(String),
}

/// Result type alias for Harbor operations
pub type Result<T> = std::result::Result<T, HarborError>;

impl From<toml::de::Error> for HarborError {
    fn from(err: toml::de::Error) -> Self {
        HarborError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for HarborError {
    fn from(err: toml::ser::Error) -> Self {
        HarborError::TomlSerError(err.to_string())
    }
}
