//! Result aggregation
//!
//! `aggregate` turns the probe results of one run into a `Report`: counters,
//! per-mode status lines, findings, recommendations and a severity band.

pub mod render;
pub mod rules;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::credentials::{CredentialKind, Credentials};
use crate::outcome::{Outcome, ProbeResult, WarningReason};
use crate::probe::ProbeName;
use crate::token::TokenAnalysis;

use rules::RuleContext;

/// Display label for each probe, in report order
pub const STATUS_LABELS: [(ProbeName, &str); 4] = [
    (ProbeName::GeminiLive, "Mode 1 (Native Audio) - Gemini Live"),
    (ProbeName::VertexAi, "Mode 2 (Voice Chat) - Vertex AI"),
    (ProbeName::GeminiRest, "Mode 3 (Text+Multimodal) - Gemini"),
    (ProbeName::Multimodal, "Multimodal Processing"),
];

/// Category -> display string
pub fn status_text(outcome: Option<Outcome>) -> &'static str {
    match outcome {
        Some(Outcome::Success) => "WORKING",
        Some(Outcome::Failure) => "FAILED",
        Some(Outcome::Warning(WarningReason::TokenExpired)) => "TOKEN_EXPIRED",
        Some(Outcome::Warning(WarningReason::PartialMatch)) => "PARTIAL",
        None => "UNKNOWN",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub success: usize,
    /// All warnings, whatever the reason
    pub warning: usize,
    pub token_expired: usize,
    pub partial: usize,
    pub failure: usize,
    pub total: usize,
}

impl Tally {
    pub fn add(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Success => self.success += 1,
            Outcome::Failure => self.failure += 1,
            Outcome::Warning(reason) => {
                self.warning += 1;
                match reason {
                    WarningReason::TokenExpired => self.token_expired += 1,
                    WarningReason::PartialMatch => self.partial += 1,
                }
            }
        }
    }

    pub fn band(&self) -> SeverityBand {
        SeverityBand::from_counts(self.success, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Ready,
    MinorIssues,
    MultipleIssues,
}

impl SeverityBand {
    pub fn from_counts(success: usize, total: usize) -> Self {
        if success == total {
            SeverityBand::Ready
        } else if success + 1 == total {
            SeverityBand::MinorIssues
        } else {
            SeverityBand::MultipleIssues
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SeverityBand::Ready => "All integrations working - App ready for production!",
            SeverityBand::MinorIssues => "Most integrations working - Minor fixes needed",
            SeverityBand::MultipleIssues => "Multiple integration issues - Review required",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub probe: ProbeName,
    pub label: String,
    pub outcome: Option<Outcome>,
    pub status: String,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub credential: CredentialKind,
    pub label: String,
    pub present: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub tally: Tally,
    pub band: SeverityBand,
    pub lines: Vec<StatusLine>,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenAnalysis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<CredentialStatus>,
    pub generated_at: DateTime<Local>,
}

impl Report {
    /// Attach the token heuristic; this can add recommendations
    pub fn with_token(mut self, token: TokenAnalysis) -> Self {
        self.token = Some(token);
        self.refresh_rules();
        self
    }

    pub fn with_credentials(mut self, credentials: &Credentials) -> Self {
        self.credentials = credentials
            .status()
            .into_iter()
            .map(|(credential, present)| CredentialStatus {
                credential,
                label: credential.label().to_string(),
                present,
            })
            .collect();
        self
    }

    pub fn outcome(&self, probe: ProbeName) -> Option<Outcome> {
        self.lines.iter().find(|l| l.probe == probe).and_then(|l| l.outcome)
    }

    fn outcome_map(&self) -> BTreeMap<ProbeName, Outcome> {
        self.lines
            .iter()
            .filter_map(|l| l.outcome.map(|o| (l.probe, o)))
            .collect()
    }

    fn refresh_rules(&mut self) {
        let outcomes = self.outcome_map();
        let ctx = RuleContext {
            outcomes: &outcomes,
            token: self.token.as_ref().map(|t| t.check),
        };
        self.findings = rules::evaluate(rules::FINDINGS, &ctx);
        self.recommendations = rules::evaluate(rules::RECOMMENDATIONS, &ctx);
    }
}

/// Build a report from one run's results
pub fn aggregate(results: &[ProbeResult]) -> Report {
    let mut tally = Tally::default();
    for result in results {
        tally.add(result.outcome);
    }

    let lines = STATUS_LABELS
        .iter()
        .map(|(probe, label)| {
            let result = results.iter().find(|r| r.probe == *probe);
            let outcome = result.map(|r| r.outcome);
            StatusLine {
                probe: *probe,
                label: label.to_string(),
                outcome,
                status: status_text(outcome).to_string(),
                detail: result.map(|r| r.detail.clone()),
            }
        })
        .collect();

    let mut report = Report {
        tally,
        band: tally.band(),
        lines,
        findings: Vec::new(),
        recommendations: Vec::new(),
        token: None,
        credentials: Vec::new(),
        generated_at: Local::now(),
    };
    report.refresh_rules();
    report
}
