//! Finding and recommendation rules.
//!
//! Each rule is an independent predicate over the joint outcome set. Rules are
//! evaluated in list order; any number may fire.

use std::collections::BTreeMap;

use crate::outcome::{Outcome, WarningReason};
use crate::probe::ProbeName;
use crate::token::TokenCheck;

/// Everything a rule may look at
pub struct RuleContext<'a> {
    pub outcomes: &'a BTreeMap<ProbeName, Outcome>,
    pub token: Option<TokenCheck>,
}

impl RuleContext<'_> {
    pub fn outcome(&self, probe: ProbeName) -> Option<Outcome> {
        self.outcomes.get(&probe).copied()
    }

    pub fn is(&self, probe: ProbeName, outcome: Outcome) -> bool {
        self.outcome(probe) == Some(outcome)
    }
}

pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&RuleContext<'_>) -> bool,
    pub messages: &'static [&'static str],
}

impl Rule {
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<String> {
        if (self.applies)(ctx) {
            self.messages.iter().map(|m| m.to_string()).collect()
        } else {
            Vec::new()
        }
    }
}

const TOKEN_EXPIRED: Outcome = Outcome::Warning(WarningReason::TokenExpired);
const PARTIAL: Outcome = Outcome::Warning(WarningReason::PartialMatch);

pub const FINDINGS: &[Rule] = &[
    Rule {
        name: "text-and-image",
        applies: |ctx| ctx.is(ProbeName::GeminiRest, Outcome::Success) && ctx.is(ProbeName::Multimodal, Outcome::Success),
        messages: &["Mode 3 fully functional with text and image processing"],
    },
    Rule {
        name: "live-socket",
        applies: |ctx| ctx.is(ProbeName::GeminiLive, Outcome::Success),
        messages: &["Mode 1 WebSocket connection working for real-time audio"],
    },
    Rule {
        name: "vertex-token-expired",
        applies: |ctx| ctx.is(ProbeName::VertexAi, TOKEN_EXPIRED),
        messages: &["Mode 2 needs OAuth token refresh for full functionality"],
    },
    Rule {
        name: "image-partial",
        applies: |ctx| ctx.is(ProbeName::Multimodal, PARTIAL),
        messages: &["Image processed but text not fully recognized"],
    },
];

pub const RECOMMENDATIONS: &[Rule] = &[
    Rule {
        name: "refresh-vertex-token",
        applies: |ctx| ctx.is(ProbeName::VertexAi, TOKEN_EXPIRED),
        messages: &[
            "Implement OAuth token refresh for Mode 2",
            "Add service account authentication as fallback",
        ],
    },
    Rule {
        name: "regenerate-token",
        applies: |ctx| matches!(ctx.token, Some(TokenCheck::Invalid(_))),
        messages: &["Regenerate the Vertex access token (gcloud auth print-access-token)"],
    },
];

pub fn evaluate(rules: &[Rule], ctx: &RuleContext<'_>) -> Vec<String> {
    rules.iter().flat_map(|rule| rule.evaluate(ctx)).collect()
}
