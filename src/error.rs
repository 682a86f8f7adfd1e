use thiserror::Error;

/// The main Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The converter was built with a configuration it cannot work with.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A field required by the configuration is absent from the record.
    #[error("Missing field error: field `{field}` not found in record with fields {record_fields:?}")]
    MissingFieldError {
        field: String,
        record_fields: Vec<String>,
    },

    /// The field exists but does not hold a value of the expected type.
    #[error("Type mismatch error: field `{field}` expected {expected}, found {found} in record with fields {record_fields:?}")]
    TypeMismatchError {
        field: String,
        expected: String,
        found: String,
        record_fields: Vec<String>,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Whether the error concerns a single record. Per-record errors leave the converter
    /// usable; the caller decides whether to drop, dead-letter or fail the batch.
    pub fn is_per_record(&self) -> bool {
        !matches!(self, Error::ConfigurationError(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::SerializationError(value.to_string())
    }
}
