//! Text rendering for `Report`.

use colored::*;
use std::fmt::{self, Write};

use crate::outcome::Outcome;
use crate::report::{Report, SeverityBand, StatusLine};
use crate::token::TokenCheck;

const RULE_WIDTH: usize = 50;
const SUB_RULE_WIDTH: usize = 30;

fn heading(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}", title.bold())?;
    writeln!(out, "{}", "-".repeat(SUB_RULE_WIDTH))
}

fn status_cell(line: &StatusLine) -> ColoredString {
    let text = match line.outcome {
        Some(Outcome::Success) => format!("✅ {}", line.status),
        Some(Outcome::Failure) => format!("❌ {}", line.status),
        Some(Outcome::Warning(_)) => format!("⚠️ {}", line.status),
        None => format!("❓ {}", line.status),
    };
    match line.outcome {
        Some(Outcome::Success) => text.green(),
        Some(Outcome::Failure) => text.red(),
        Some(Outcome::Warning(_)) => text.yellow(),
        None => text.dimmed(),
    }
}

impl Report {
    fn write_text(&self, out: &mut String, verbose: bool) -> fmt::Result {
        writeln!(out, "{}", "📊 INTEGRATION TEST REPORT".bold())?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

        if !self.credentials.is_empty() {
            heading(out, "CONFIGURATION:")?;
            for status in &self.credentials {
                let mark = if status.present {
                    "✅ Found".green()
                } else {
                    "❌ Missing".red()
                };
                writeln!(out, "   {}: {}", status.label, mark)?;
            }
        }

        if let Some(token) = &self.token {
            heading(out, "TOKEN ANALYSIS:")?;
            match token.check {
                TokenCheck::Absent => writeln!(out, "   {}", "No access token to check".dimmed())?,
                check => {
                    writeln!(out, "   Length: {} characters", token.length)?;
                    writeln!(out, "   Starts with: {}...", token.preview)?;
                    match check {
                        TokenCheck::Invalid(issue) => {
                            writeln!(out, "   Format: {} ({})", "❌ Invalid".red(), issue)?
                        }
                        _ => writeln!(out, "   Format: {}", "✅ Valid".green())?,
                    }
                }
            }
        }

        writeln!(out)?;
        writeln!(out, "✅ Successful: {}", self.tally.success)?;
        writeln!(out, "⚠️ Warnings: {}", self.tally.warning)?;
        writeln!(out, "❌ Failed: {}", self.tally.failure)?;

        heading(out, "DETAILED RESULTS:")?;
        for line in &self.lines {
            writeln!(out, "{}: {}", line.label, status_cell(line))?;
            if verbose {
                if let Some(detail) = line.detail.as_deref().filter(|d| !d.is_empty()) {
                    writeln!(out, "    {}", detail.dimmed())?;
                }
            }
        }

        heading(out, "KEY FINDINGS:")?;
        if self.findings.is_empty() {
            writeln!(out, "{}", "(none)".dimmed())?;
        }
        for finding in &self.findings {
            writeln!(out, "• {}", finding)?;
        }

        heading(out, "RECOMMENDATIONS:")?;
        for (i, rec) in self.recommendations.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, rec)?;
        }
        let band = match self.band {
            SeverityBand::Ready => format!("🎉 {}", self.band.message()).green().bold(),
            SeverityBand::MinorIssues => format!("👍 {}", self.band.message()).yellow(),
            SeverityBand::MultipleIssues => format!("⚠️ {}", self.band.message()).red(),
        };
        writeln!(out, "{}", band)?;

        writeln!(out)?;
        writeln!(
            out,
            "🏁 Testing complete at {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Multi-section text report; `verbose` adds each probe's detail line
    pub fn render(&self, verbose: bool) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_text(&mut out, verbose);
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}
