//! Analysis records as returned by `GET /api/analysis/{id}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::CompletedWithErrors => "completed_with_errors",
            AnalysisStatus::Failed => "failed",
        }
    }

    /// `completed`, `completed_with_errors` and `failed` end a scan.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisStatus::Completed | AnalysisStatus::CompletedWithErrors | AnalysisStatus::Failed
        )
    }
}

/// Canonical score set on a 0-100 scale. A category the scanner could not
/// measure arrives as `null` or is left out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreSet {
    pub overall: Option<f64>,
    pub accessibility: Option<f64>,
    pub seo: Option<f64>,
    pub performance: Option<f64>,
}

impl ScoreSet {
    pub fn rows(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("Overall", self.overall),
            ("Accessibility", self.accessibility),
            ("SEO", self.seo),
            ("Performance", self.performance),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub url: String,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub selector: Option<String>,
}

/// Issues grouped by audit category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssueGroups {
    #[serde(default)]
    pub accessibility: Vec<Issue>,
    #[serde(default)]
    pub seo: Vec<Issue>,
    #[serde(default)]
    pub performance: Vec<Issue>,
}

impl IssueGroups {
    pub fn total(&self) -> usize {
        self.accessibility.len() + self.seo.len() + self.performance.len()
    }

    pub fn by_category(&self) -> [(&'static str, &[Issue]); 3] {
        [
            ("Accessibility", self.accessibility.as_slice()),
            ("SEO", self.seo.as_slice()),
            ("Performance", self.performance.as_slice()),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: String,
    pub url: String,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub scores: Option<ScoreSet>,
    #[serde(default)]
    pub screenshots: Vec<Screenshot>,
    #[serde(default)]
    pub issues: IssueGroups,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Analysis {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
