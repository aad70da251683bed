//! Error types for directory object operations.
//!
//! Every failure in the object model is synchronous and raised at the point of misuse. The
//! variants separate caller mistakes (unknown attributes, malformed accessor names) from wiring
//! defects upstream (converter options that do not cover an attribute).

use thiserror::Error;

/// Main error type for directory object operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A strict getter was used for an attribute that is not present and has no default
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Converter or schema wiring is wrong (missing option entry, unknown converter)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Malformed request (bad accessor name, unparsable wire value, wrong value type)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A converter refused to produce a batch of the requested kind
    #[error("Batch modification `{kind}` is not supported for attribute `{attribute}`")]
    UnsupportedBatch {
        /// Wire attribute the batch targeted
        attribute: String,
        /// Kind of batch that was rejected
        kind: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// External collaborator error (last value lookups)
    #[error("External service error: {service}: {message}")]
    ExternalServiceError {
        /// Collaborator that failed
        service: String,
        /// Error message
        message: String,
    },
}

/// Specialized result type for directory object operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAttribute(_) => "INVALID_ATTRIBUTE",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::UnsupportedBatch { .. } => "UNSUPPORTED_BATCH",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ExternalServiceError { .. } => "EXTERNAL_SERVICE_ERROR",
        }
    }

    /// Returns true if this error points at a wiring or collaborator failure that is logged at
    /// warn level; caller mistakes are logged at debug.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_) | Self::ExternalServiceError { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
