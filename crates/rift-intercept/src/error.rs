//! Error types for interception, registration and fixtures.

use crate::request::PreparedRequest;
use std::path::PathBuf;

/// Failure surfaced to the caller of an intercepted request.
///
/// Simulated failures registered as stub bodies or returned by callbacks use
/// the same type, so client code sees them exactly like real network errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// No registered stub matched and no passthrough rule applied.
    #[error("{message}")]
    ConnectionRefused {
        message: String,
        request: Option<Box<PreparedRequest>>,
    },
    #[error("connection error: {0}")]
    Connection(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Request attached to a connection-refused error.
    pub fn request(&self) -> Option<&PreparedRequest> {
        match self {
            TransportError::ConnectionRefused { request, .. } => request.as_deref(),
            _ => None,
        }
    }

    pub fn is_connection_refused(&self) -> bool {
        matches!(self, TransportError::ConnectionRefused { .. })
    }
}

/// Errors from the registration, lifecycle and assertion APIs.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("Response is not registered for URL {0}")]
    NotRegistered(String),
    #[error("Cannot replace registry, current registry has responses.\nRun `reset()` first")]
    RegistryConflict,
    #[error("Not all requests have been executed {0:?}")]
    UnfiredExpectations(Vec<String>),
    #[error("Expected URL '{url}' to be called {expected} times. Called {actual} times.")]
    CallCountMismatch {
        url: String,
        expected: usize,
        actual: usize,
    },
    #[error("invalid matcher: {0}")]
    InvalidMatcher(String),
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

/// Errors raised while loading or writing fixture files.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid fixture entry {index}: {message}")]
    InvalidEntry { index: usize, message: String },
}
