//! Schema client errors

use thiserror::Error;

/// Confluent-compatible error codes
pub mod error_codes {
    // Subject/schema not found
    pub const SUBJECT_NOT_FOUND: u32 = 40401;
    pub const VERSION_NOT_FOUND: u32 = 40402;
    pub const SCHEMA_NOT_FOUND: u32 = 40403;

    // Invalid requests
    pub const INVALID_SCHEMA: u32 = 42201;
    pub const INVALID_VERSION: u32 = 42202;
    pub const UNSUPPORTED_MEDIA_TYPE: u32 = 415;
    pub const CONFLICT: u32 = 409;

    // Internal errors
    pub const INTERNAL_ERROR: u32 = 50001;
    pub const UPSTREAM_UNAVAILABLE: u32 = 50003;
    pub const UNIMPLEMENTED: u32 = 50101;
}

/// Schema client error types
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),

    #[error("Version not found: {subject} version {version}")]
    VersionNotFound { subject: String, version: String },

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid schema type: {0}")]
    InvalidSchemaType(String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream call timed out: {0}")]
    Timeout(String),

    #[error("Upstream call cancelled")]
    Cancelled,

    #[error("Not implemented: {0}")]
    Unimplemented(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Get the Confluent-compatible error code
    pub fn error_code(&self) -> u32 {
        match self {
            ClientError::SubjectNotFound(_) => error_codes::SUBJECT_NOT_FOUND,
            ClientError::VersionNotFound { .. } => error_codes::VERSION_NOT_FOUND,
            ClientError::SchemaNotFound(_) => error_codes::SCHEMA_NOT_FOUND,
            ClientError::InvalidRequest(_)
            | ClientError::InvalidSchemaType(_)
            | ClientError::Codec(_) => error_codes::INVALID_SCHEMA,
            ClientError::InvalidVersion(_) => error_codes::INVALID_VERSION,
            ClientError::Conflict(_) => error_codes::CONFLICT,
            ClientError::UpstreamUnavailable(_)
            | ClientError::Timeout(_)
            | ClientError::Cancelled => error_codes::UPSTREAM_UNAVAILABLE,
            ClientError::Unimplemented(_) => error_codes::UNIMPLEMENTED,
            ClientError::Serialization(_) | ClientError::Config(_) | ClientError::Internal(_) => {
                error_codes::INTERNAL_ERROR
            }
        }
    }

    /// Get the HTTP status code
    pub fn http_status(&self) -> u16 {
        match self {
            ClientError::SubjectNotFound(_)
            | ClientError::VersionNotFound { .. }
            | ClientError::SchemaNotFound(_) => 404,
            ClientError::InvalidRequest(_)
            | ClientError::InvalidSchemaType(_)
            | ClientError::InvalidVersion(_)
            | ClientError::Codec(_) => 422,
            ClientError::Conflict(_) => 409,
            ClientError::UpstreamUnavailable(_) | ClientError::Cancelled => 503,
            ClientError::Timeout(_) => 504,
            ClientError::Unimplemented(_) => 501,
            _ => 500,
        }
    }

    /// Whether this error means the id, subject or version does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ClientError::SubjectNotFound(_)
                | ClientError::VersionNotFound { .. }
                | ClientError::SchemaNotFound(_)
        )
    }

    /// Rebuild an error from a registry error body
    pub fn from_error_code(error_code: u32, message: String) -> Self {
        match error_code {
            error_codes::SUBJECT_NOT_FOUND => ClientError::SubjectNotFound(message),
            error_codes::VERSION_NOT_FOUND => ClientError::VersionNotFound {
                subject: String::new(),
                version: message,
            },
            error_codes::SCHEMA_NOT_FOUND => ClientError::SchemaNotFound(message),
            error_codes::INVALID_SCHEMA | 42203 | 42204 => ClientError::InvalidRequest(message),
            error_codes::INVALID_VERSION => ClientError::InvalidVersion(message),
            error_codes::UNSUPPORTED_MEDIA_TYPE => ClientError::InvalidRequest(message),
            error_codes::CONFLICT => ClientError::Conflict(message),
            error_codes::UNIMPLEMENTED => ClientError::Unimplemented(message),
            _ => ClientError::UpstreamUnavailable(format!("{}: {}", error_code, message)),
        }
    }
}

/// Result type for schema client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(e.to_string())
        } else if e.is_decode() {
            ClientError::Serialization(e.to_string())
        } else {
            ClientError::UpstreamUnavailable(e.to_string())
        }
    }
}
