//! Probe outcome types.
//!
//! Every probe yields exactly one `ProbeResult`. The aggregator only ever looks
//! at the `Outcome`; `detail` is for humans.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProbeError;
use crate::probe::ProbeName;

/// Why a call that completed still deserves attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    /// Endpoint reachable but the bearer token was rejected
    TokenExpired,
    /// Response well-formed but the expected marker text was absent
    PartialMatch,
}

impl WarningReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningReason::TokenExpired => "token_expired",
            WarningReason::PartialMatch => "partial_match",
        }
    }
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    Warning(WarningReason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Outcome::Warning(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Failure => f.write_str("failure"),
            Outcome::Warning(reason) => write!(f, "warning({})", reason),
        }
    }
}

/// Outcome of one probe plus the detail shown to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub probe: ProbeName,
    pub outcome: Outcome,
    pub detail: String,
}

impl ProbeResult {
    /// A successful probe
    pub fn success(probe: ProbeName, detail: impl Into<String>) -> Self {
        Self {
            probe,
            outcome: Outcome::Success,
            detail: detail.into(),
        }
    }

    /// Fold a probe error into a result; the category comes from the error kind
    pub fn from_error(probe: ProbeName, err: &ProbeError) -> Self {
        Self {
            probe,
            outcome: err.outcome(),
            detail: err.to_string(),
        }
    }
}
