//! Error types for apicheck
//!
//! Two layers: `ProbeError` is the per-probe taxonomy that always folds into an
//! `Outcome`, and `ApicheckError` covers everything around the probes.

use thiserror::Error;

use crate::credentials::CredentialKind;
use crate::outcome::{Outcome, WarningReason};

/// Everything that can go wrong inside a single probe
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// A credential the probe needs is not set
    #[error("Missing credential: {credential} not set")]
    MissingCredential { credential: CredentialKind },

    /// Connection refused, timeout, TLS/handshake failure, unreadable body
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success status that carries no special meaning for this probe
    #[error("API error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// 401 from a token-gated endpoint
    #[error("Endpoint reachable but token expired (HTTP {status})")]
    AuthExpired { status: u16 },

    /// HTTP 200 but the payload lacks the expected success field
    #[error("Unexpected response shape: {0}")]
    ShapeMismatch(String),

    /// Well-formed response whose content failed a secondary check
    #[error("Response processed but expected content not recognized: {excerpt}")]
    PartialMatch { excerpt: String },
}

impl ProbeError {
    /// The outcome category this error folds into
    pub fn outcome(&self) -> Outcome {
        match self {
            ProbeError::AuthExpired { .. } => Outcome::Warning(WarningReason::TokenExpired),
            ProbeError::PartialMatch { .. } => Outcome::Warning(WarningReason::PartialMatch),
            ProbeError::MissingCredential { .. }
            | ProbeError::Transport(_)
            | ProbeError::HttpStatus { .. }
            | ProbeError::ShapeMismatch(_) => Outcome::Failure,
        }
    }
}

/// Errors outside the probe boundary
#[derive(Debug, Error)]
pub enum ApicheckError {
    /// Test image could not be produced
    #[error("Asset error: {0}")]
    Asset(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Result type alias for apicheck operations
pub type Result<T> = std::result::Result<T, ApicheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_display() {
        let err = ProbeError::MissingCredential {
            credential: CredentialKind::ApiKey,
        };
        assert_eq!(err.to_string(), "Missing credential: GEMINI_API_KEY not set");
    }

    #[test]
    fn test_http_status_display() {
        let err = ProbeError::HttpStatus {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "API error 403: forbidden");
    }

    #[test]
    fn test_failure_categories() {
        let failures = vec![
            ProbeError::MissingCredential {
                credential: CredentialKind::ProjectId,
            },
            ProbeError::Transport("connection refused".to_string()),
            ProbeError::HttpStatus {
                status: 500,
                body: String::new(),
            },
            ProbeError::ShapeMismatch("no candidates".to_string()),
        ];

        for err in failures {
            assert_eq!(err.outcome(), Outcome::Failure, "{err}");
        }
    }

    #[test]
    fn test_asset_error_display() {
        let err = ApicheckError::Asset("Failed to read image /tmp/x.png: not found".to_string());
        assert_eq!(err.to_string(), "Asset error: Failed to read image /tmp/x.png: not found");
    }

    #[test]
    fn test_warning_categories() {
        assert_eq!(
            ProbeError::AuthExpired { status: 401 }.outcome(),
            Outcome::Warning(WarningReason::TokenExpired)
        );
        assert_eq!(
            ProbeError::PartialMatch {
                excerpt: "a blue rectangle".to_string()
            }
            .outcome(),
            Outcome::Warning(WarningReason::PartialMatch)
        );
    }
}
