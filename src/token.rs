//! Bearer token heuristics.
//!
//! Superficial format checks only; the token is never decoded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by Google OAuth access tokens
pub const TOKEN_PREFIX: &str = "ya29.";

/// Shorter tokens are treated as truncated
pub const MIN_TOKEN_LEN: usize = 50;

const PREVIEW_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenIssue {
    BadPrefix,
    TooShort,
}

impl fmt::Display for TokenIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenIssue::BadPrefix => write!(f, "does not start with {}", TOKEN_PREFIX),
            TokenIssue::TooShort => write!(f, "shorter than {} characters", MIN_TOKEN_LEN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "issue", rename_all = "snake_case")]
pub enum TokenCheck {
    Valid,
    Invalid(TokenIssue),
    Absent,
}

impl TokenCheck {
    pub fn is_invalid(&self) -> bool {
        matches!(self, TokenCheck::Invalid(_))
    }
}

/// Classify a token string
pub fn check(token: Option<&str>) -> TokenCheck {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return TokenCheck::Absent,
    };

    if !token.starts_with(TOKEN_PREFIX) {
        return TokenCheck::Invalid(TokenIssue::BadPrefix);
    }

    if token.chars().count() < MIN_TOKEN_LEN {
        return TokenCheck::Invalid(TokenIssue::TooShort);
    }

    TokenCheck::Valid
}

/// What the report shows about a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAnalysis {
    pub length: usize,
    pub preview: String,
    pub check: TokenCheck,
}

/// Length, a short prefix and the heuristic verdict; never the whole token
pub fn analyze(token: Option<&str>) -> TokenAnalysis {
    let token = token.unwrap_or_default();
    TokenAnalysis {
        length: token.chars().count(),
        preview: token.chars().take(PREVIEW_LEN).collect(),
        check: check(Some(token)),
    }
}
