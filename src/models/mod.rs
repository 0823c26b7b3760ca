pub mod analysis;
pub mod envelope;
pub mod report;

pub use analysis::{Analysis, AnalysisStatus, Issue, IssueGroups, ScoreSet, Screenshot};
pub use envelope::{ApiEnvelope, ErrorBody};
pub use report::{
    IssuePreview, LegacyScoreSet, PreviewCategory, Recommendation, Report, ReportScores,
    ReportSummary, ReportTier, UpgradeInfo, Violation,
};
