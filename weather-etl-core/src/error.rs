//! Typed errors for the fetch and store sides of the pipeline.
//!
//! Fetch errors are per city and never abort a run; database errors are
//! fatal for the whole run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single fetch attempt failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Timeout or connection failure.
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The body did not have the expected shape or held out-of-range values.
    #[error("malformed response: {0}")]
    Parse(String),
}

impl FetchError {
    /// Network failures and 5xx responses are transient; 4xx and parse
    /// failures are final for that city.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::HttpStatus { status, .. } => (500..600).contains(status),
            FetchError::Parse(_) => false,
        }
    }

    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Network(_) => FetchErrorKind::Network,
            FetchError::HttpStatus { status, .. } => match status {
                400..=499 => FetchErrorKind::HttpClient,
                500..=599 => FetchErrorKind::HttpServer,
                _ => FetchErrorKind::HttpUnexpected,
            },
            FetchError::Parse(_) => FetchErrorKind::Parse,
        }
    }
}

/// Coarse classification of a fetch failure, reported per city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    Network,
    HttpClient,
    HttpServer,
    /// Informational or unfollowed redirect status.
    HttpUnexpected,
    Parse,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Network => "network",
            FetchErrorKind::HttpClient => "http_client",
            FetchErrorKind::HttpServer => "http_server",
            FetchErrorKind::HttpUnexpected => "http_unexpected",
            FetchErrorKind::Parse => "parse",
        }
    }
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure while talking to the relational store.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("unsupported database url '{0}': expected postgres://, postgresql:// or sqlite:")]
    UnsupportedUrl(String),
}
