//! Error types for docwright

use thiserror::Error;

/// Result type alias for docwright operations
pub type Result<T> = std::result::Result<T, DocwrightError>;

/// Unified error type for all docwright operations
#[derive(Error, Debug, Clone)]
pub enum DocwrightError {
    #[error("MongoDB error: {0}")]
    MongoDB(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Connect, close or implicit-connect failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Registering or running a hook identifier outside the closed set
    #[error("Invalid hook name: {0}")]
    InvalidHookName(String),

    /// Lookup by identity found no record
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Failure raised by a hook callback
    #[error("Hook error: {0}")]
    Hook(String),

    /// Operation not permitted in the handle's current state (e.g. after delete)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Driver-reported timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Failure of a delegated call or hook, tagged with the operation in flight
    #[error("Operation '{operation}' failed: {source}")]
    Operation {
        operation: String,
        source: Box<DocwrightError>,
    },
}

impl DocwrightError {
    /// Tags this error with the name of the operation that was executing.
    ///
    /// Domain outcomes (`NotFound`, `InvalidState`, `InvalidHookName`) and
    /// errors that already carry an operation tag are returned unchanged.
    pub fn tag(self, operation: impl Into<String>) -> Self {
        match self {
            DocwrightError::Operation { .. }
            | DocwrightError::NotFound(_)
            | DocwrightError::InvalidState(_)
            | DocwrightError::InvalidHookName(_) => self,
            other => DocwrightError::Operation {
                operation: operation.into(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error, looking through operation tags
    pub fn root_cause(&self) -> &DocwrightError {
        match self {
            DocwrightError::Operation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Name of the operation this error was raised in, if tagged
    pub fn operation_name(&self) -> Option<&str> {
        match self {
            DocwrightError::Operation { operation, .. } => Some(operation),
            _ => None,
        }
    }

    /// Returns true if the root cause is a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), DocwrightError::NotFound(_))
    }

    /// Returns true if this error is potentially retryable.
    ///
    /// Nothing in docwright retries; callers decide.
    pub fn is_retryable(&self) -> bool {
        matches!(self.root_cause(), DocwrightError::Timeout(_))
    }
}

impl From<serde_json::Error> for DocwrightError {
    fn from(err: serde_json::Error) -> Self {
        DocwrightError::Serialization(err.to_string())
    }
}

// MongoDB-specific error conversions (when mongodb-errors feature is enabled)
#[cfg(feature = "mongodb-errors")]
impl From<mongodb::error::Error> for DocwrightError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;
        match err.kind.as_ref() {
            ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                DocwrightError::Timeout(err.to_string())
            }
            ErrorKind::ServerSelection { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::Io(_) => DocwrightError::Connection(err.to_string()),
            _ => DocwrightError::MongoDB(err.to_string()),
        }
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::ser::Error> for DocwrightError {
    fn from(err: bson::ser::Error) -> Self {
        DocwrightError::Serialization(format!("BSON serialization error: {}", err))
    }
}

#[cfg(feature = "mongodb-errors")]
impl From<bson::de::Error> for DocwrightError {
    fn from(err: bson::de::Error) -> Self {
        DocwrightError::Deserialization(format!("BSON deserialization error: {}", err))
    }
}
