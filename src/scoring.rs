use serde::{Deserialize, Serialize};

const GOOD_THRESHOLD: f64 = 80.0;
const WARNING_THRESHOLD: f64 = 60.0;

/// Colour tier for a 0-100 score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Warning,
    Critical,
}

impl Severity {
    /// `>= 80` good, `>= 60` warning, anything else critical. Non-finite
    /// scores are critical.
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            Severity::Critical
        } else if score >= GOOD_THRESHOLD {
            Severity::Good
        } else if score >= WARNING_THRESHOLD {
            Severity::Warning
        } else {
            Severity::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Good => "good",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// ANSI foreground colour code used by the terminal renderer.
    pub fn ansi_color(&self) -> &'static str {
        match self {
            Severity::Good => "32",
            Severity::Warning => "33",
            Severity::Critical => "31",
        }
    }
}
