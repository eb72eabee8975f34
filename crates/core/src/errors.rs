//! Error types for the dirgroups core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Writeback(#[from] WritebackError),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Directory API errors
// ---------------------------------------------------------------------------

/// Errors from the remote directory service.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// HTTP-level transport error (network, TLS, timeout).
    #[error("directory HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("directory API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Credentials were rejected or lack the required scope.
    #[error("directory authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The customer scope (or the collection under it) does not exist.
    #[error("directory resource not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("directory rate limit exceeded, retry after {retry_after}")]
    RateLimited { retry_after: String },

    /// JSON deserialization failure.
    #[error("directory response parse error: {0}")]
    ParseError(String),

    /// The service handed back a page token already sent during this listing.
    #[error("directory pagination loop: page token '{0}' repeated")]
    PaginationLoop(String),

    /// The caller cancelled the read while pages were still being fetched.
    #[error("directory listing cancelled after {pages} page(s)")]
    Cancelled { pages: usize },

    /// The customer scope is empty.
    #[error("customer scope must not be empty")]
    EmptyCustomer,
}

impl DirectoryError {
    /// Whether this error means the target is gone rather than unreachable.
    ///
    /// Only an explicit 404 qualifies. Authorization failures are reported
    /// as-is even though some services use 403 to hide existence.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::ApiError { status, .. } => *status == 404,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Host state errors
// ---------------------------------------------------------------------------

/// Errors writing values into host state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WritebackError {
    /// The key is not declared in the schema.
    #[error("invalid address to set: \"{0}\"")]
    UnknownAttribute(String),

    /// The value does not conform to the declared attribute type.
    #[error("{path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

// ---------------------------------------------------------------------------
// Data source errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a data source read to the host runtime.
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// Listing failed for a reason other than the target being gone.
    #[error("Error when reading or editing {resource}: {source}")]
    Read {
        resource: String,
        #[source]
        source: DirectoryError,
    },

    /// The projected result could not be stored.
    #[error("failed to store {resource}: {source}")]
    Writeback {
        resource: String,
        #[source]
        source: WritebackError,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
