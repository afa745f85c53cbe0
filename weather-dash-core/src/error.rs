//! Error types for both failure domains.

use reqwest::StatusCode;
use thiserror::Error;

/// Why a single position request failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The service could not compute a fix, e.g. location services are switched off.
    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Location access denied")]
    PermissionDenied,

    #[error("Timed out waiting for a position")]
    Timeout,

    #[error("Location service error: {0}")]
    Other(String),
}

impl LocationError {
    /// Only an unavailable fix is worth asking for again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PositionUnavailable)
    }
}

/// Why a backend call failed. The sentinel-returning gateway methods log this
/// and discard it; the `try_` methods hand it to the caller.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to parse backend JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Forecast daily sequences have different lengths")]
    InconsistentForecast,
}

impl GatewayError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}
