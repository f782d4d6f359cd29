//! Error types for vaultwatch.
//!
//! One unified error enum for the engine, plus:
//! - `ErrorKind`: coarse classification callers can branch on
//! - `ApiFailure`: the `{error, status}` wire shape for service boundaries

use crate::evidence::EvidenceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all engine operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Missing or invalid parameter: {0}")]
    InvalidRequest(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Not authorized for profile: {0}")]
    Forbidden(String),

    #[error("Finding not found: {0}")]
    FindingNotFound(String),

    #[error("Failed to load vault for profile {profile}: {message}")]
    VaultUnavailable { profile: String, message: String },

    #[error("Invalid status transition for {category} finding: {from} -> {to}")]
    InvalidTransition {
        category: String,
        from: String,
        to: String,
    },

    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("A scan is already running for profile: {0}")]
    ScanInFlight(String),

    #[error("Evidence source error: {0}")]
    Evidence(#[from] EvidenceError),

    #[error("Failed to read snapshot: {path}")]
    SnapshotRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write snapshot: {path}")]
    SnapshotWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config: {path}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Coarse error classification. Callers branch on this, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Timeout,
    Conflict,
    Unconfigured,
    Internal,
}

impl WatchError {
    /// Classification used by service boundaries and callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WatchError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            WatchError::Unauthorized => ErrorKind::Unauthorized,
            WatchError::Forbidden(_) => ErrorKind::Forbidden,
            WatchError::FindingNotFound(_) => ErrorKind::NotFound,
            WatchError::VaultUnavailable { .. } => ErrorKind::Internal,
            WatchError::InvalidTransition { .. }
            | WatchError::VersionConflict { .. }
            | WatchError::ScanInFlight(_) => ErrorKind::Conflict,
            WatchError::Evidence(e) => e.kind(),
            WatchError::SnapshotRead { .. }
            | WatchError::SnapshotWrite { .. }
            | WatchError::Json(_) => ErrorKind::Internal,
            WatchError::ConfigParse { .. } | WatchError::Config(_) => ErrorKind::Unconfigured,
            WatchError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// HTTP-style status code for the `{error, status}` wire shape.
    pub fn status(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Timeout => 408,
            ErrorKind::Conflict => 409,
            ErrorKind::Unconfigured | ErrorKind::Internal => 500,
        }
    }
}

/// Serialized failure shape returned by the service entry points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiFailure {
    pub error: String,
    pub status: u16,
}

impl From<&WatchError> for ApiFailure {
    fn from(err: &WatchError) -> Self {
        ApiFailure {
            error: err.to_string(),
            status: err.status(),
        }
    }
}
