//! Report records served by the report endpoints.
//!
//! Reports come in two tiers. `overview` carries counts and a locked
//! preview, `detailed` additionally carries the full violation list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::ScoreSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportTier {
    Overview,
    Detailed,
}

impl ReportTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportTier::Overview => "overview",
            ReportTier::Detailed => "detailed",
        }
    }
}

/// Older reports score `overall/accessibility/custom`. Any other key means
/// the record is not in this shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LegacyScoreSet {
    pub overall: f64,
    pub accessibility: f64,
    pub custom: f64,
}

/// Either score shape the backend may attach to a report.
///
/// `ScoreSet` accepts any object since every field is optional, so the
/// strict legacy shape is tried first. A record mixing both shapes fails
/// the legacy match and resolves to the canonical one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ReportScores {
    Legacy(LegacyScoreSet),
    Standard(ScoreSet),
}

impl ReportScores {
    pub fn rows(&self) -> Vec<(&'static str, Option<f64>)> {
        match self {
            ReportScores::Standard(scores) => scores.rows(),
            ReportScores::Legacy(scores) => vec![
                ("Overall", Some(scores.overall)),
                ("Accessibility", Some(scores.accessibility)),
                ("Custom", Some(scores.custom)),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSummary {
    pub total_violations: u32,
    pub critical: u32,
    pub serious: u32,
    pub moderate: u32,
    pub minor: u32,
    pub passes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub help_url: Option<String>,
    #[serde(default)]
    pub nodes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewCategory {
    pub name: String,
    pub count: u32,
}

/// Locked preview shown on overview reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct IssuePreview {
    pub categories: Vec<PreviewCategory>,
    pub has_critical_issues: bool,
    pub has_more_issues: bool,
}

impl IssuePreview {
    pub fn total(&self) -> u32 {
        self.categories.iter().map(|category| category.count).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpgradeInfo {
    pub features: Vec<String>,
    pub price: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub analysis_id: Option<String>,
    pub report_type: ReportTier,
    #[serde(default)]
    pub website_url: Option<String>,
    pub scores: ReportScores,
    #[serde(default)]
    pub summary: ReportSummary,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub violations: Option<Vec<Violation>>,
    #[serde(default)]
    pub issue_preview: Option<IssuePreview>,
    #[serde(default)]
    pub upgrade_info: Option<UpgradeInfo>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl Report {
    /// True when the report names a different analysis than `analysis_id`.
    /// Reports that omit the field are assumed to match.
    pub fn belongs_to_other(&self, analysis_id: &str) -> bool {
        self.analysis_id
            .as_deref()
            .is_some_and(|own| own != analysis_id)
    }
}
