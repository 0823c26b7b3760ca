use std::path::Path;

use anyhow::Context;
use log::info;
use thiserror::Error;

use crate::api::{AnalysisApi, ApiError};
use crate::models::{IssuePreview, Report, ReportScores, ReportSummary, ReportTier, UpgradeInfo, Violation};

/// Follow-up action offered next to a report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportAction<'a> {
    Upgrade { info: Option<&'a UpgradeInfo> },
    Download,
}

/// What a report's tier allows the user to see.
#[derive(Debug, Clone, Copy)]
pub struct ReportView<'a> {
    report: &'a Report,
}

impl<'a> ReportView<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self { report }
    }

    pub fn tier(&self) -> ReportTier {
        self.report.report_type
    }

    pub fn scores(&self) -> &'a ReportScores {
        &self.report.scores
    }

    pub fn summary(&self) -> &'a ReportSummary {
        &self.report.summary
    }

    /// Full violation list. Never exposed on overview reports, even when
    /// the backend included one.
    pub fn violations(&self) -> Option<&'a [Violation]> {
        match self.report.report_type {
            ReportTier::Detailed => Some(self.report.violations.as_deref().unwrap_or(&[])),
            ReportTier::Overview => None,
        }
    }

    pub fn preview(&self) -> Option<&'a IssuePreview> {
        match self.report.report_type {
            ReportTier::Overview => self.report.issue_preview.as_ref(),
            ReportTier::Detailed => None,
        }
    }

    pub fn visible_violation_count(&self) -> usize {
        self.violations().map_or(0, <[Violation]>::len)
    }

    pub fn action(&self) -> ReportAction<'a> {
        match self.report.report_type {
            ReportTier::Overview => ReportAction::Upgrade {
                info: self.report.upgrade_info.as_ref(),
            },
            ReportTier::Detailed => ReportAction::Download,
        }
    }
}

#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("backend returned a {0} report for an upgrade request")]
    WrongTier(&'static str),

    #[error("backend returned a report for analysis {0}")]
    OtherAnalysis(String),
}

impl UpgradeError {
    pub fn user_message(&self) -> String {
        match self {
            UpgradeError::Api(err) => err.user_message("Failed to unlock the detailed report."),
            _ => "Failed to unlock the detailed report.".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum UpgradeResult {
    AlreadyDetailed,
    Upgraded(Report),
}

/// Requests the detailed variant of `current`. The caller replaces its
/// report with the returned one only on `Upgraded`; on error the current
/// report stays as it is.
pub async fn request_upgrade(
    api: &dyn AnalysisApi,
    analysis_id: &str,
    current: &Report,
) -> Result<UpgradeResult, UpgradeError> {
    if current.report_type == ReportTier::Detailed {
        return Ok(UpgradeResult::AlreadyDetailed);
    }

    let detailed = api.get_detailed_report(analysis_id).await?;

    if detailed.report_type != ReportTier::Detailed {
        return Err(UpgradeError::WrongTier(detailed.report_type.as_str()));
    }
    if detailed.belongs_to_other(analysis_id) {
        return Err(UpgradeError::OtherAnalysis(
            detailed.analysis_id.clone().unwrap_or_default(),
        ));
    }

    info!("Unlocked detailed report {} for analysis {analysis_id}", detailed.id);
    Ok(UpgradeResult::Upgraded(detailed))
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("PDF export requires the detailed report")]
    Locked,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to save PDF: {0:#}")]
    Io(anyhow::Error),
}

impl DownloadError {
    pub fn user_message(&self) -> String {
        match self {
            DownloadError::Locked => "Upgrade to the detailed report to download a PDF.".to_string(),
            DownloadError::Api(err) => err.user_message("Failed to download the PDF report."),
            DownloadError::Io(_) => "Failed to save the PDF report.".to_string(),
        }
    }
}

/// Downloads the PDF for a detailed report and writes it to `dest`.
/// The bytes land in a sibling `.part` file first so a failed write never
/// leaves a truncated PDF behind.
pub async fn download_pdf(
    api: &dyn AnalysisApi,
    analysis_id: &str,
    current: &Report,
    dest: &Path,
) -> Result<u64, DownloadError> {
    if current.report_type != ReportTier::Detailed {
        return Err(DownloadError::Locked);
    }

    let bytes = api.download_pdf(analysis_id).await?;

    let partial = dest.with_extension("pdf.part");
    tokio::fs::write(&partial, &bytes)
        .await
        .with_context(|| format!("failed to write {}", partial.display()))
        .map_err(DownloadError::Io)?;
    tokio::fs::rename(&partial, dest)
        .await
        .with_context(|| format!("failed to move PDF into {}", dest.display()))
        .map_err(DownloadError::Io)?;

    info!("Saved {} byte PDF for analysis {analysis_id} to {}", bytes.len(), dest.display());
    Ok(bytes.len() as u64)
}
