use serde::{Deserialize, Serialize};

use crate::models::{Analysis, AnalysisStatus, Report};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ViewStatus {
    #[default]
    Idle,
    Polling,
    /// Backend reached `completed` or `completed_with_errors`.
    Completed,
    /// Backend reported `failed`. Not a client error.
    Failed,
    /// Nothing usable to show: see [`UnavailableReason`].
    Unavailable,
    Disposed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UnavailableReason {
    NoCachedData,
    MalformedCache,
    PollTimeout,
}

impl UnavailableReason {
    pub fn user_message(&self) -> &'static str {
        "Results not found. Please try again."
    }

    pub fn detail(&self) -> &'static str {
        match self {
            UnavailableReason::NoCachedData => "no results cached for this session",
            UnavailableReason::MalformedCache => "cached results could not be read",
            UnavailableReason::PollTimeout => "analysis did not finish within the polling budget",
        }
    }
}

/// Everything the results view renders. One instance per controller.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultsState {
    pub status: ViewStatus,
    pub analysis_id: Option<String>,
    pub analysis: Option<Analysis>,
    pub report: Option<Report>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub unavailable: Option<UnavailableReason>,
    /// Last user-visible failure notice from an upgrade/download/load.
    pub notice: Option<String>,
}

impl ResultsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_polling(&mut self, analysis_id: String, max_attempts: u32) {
        *self = Self {
            status: ViewStatus::Polling,
            analysis_id: Some(analysis_id),
            max_attempts,
            ..Self::default()
        };
    }

    /// Last write wins: the newest fetched record replaces the previous one.
    pub fn record_attempt(&mut self, analysis: Analysis, attempt: u32) {
        self.attempts = attempt;
        self.analysis = Some(analysis);
    }

    pub fn finish_terminal(&mut self, attempts: u32) {
        self.attempts = attempts;
        self.status = match self.analysis.as_ref().map(|analysis| analysis.status) {
            Some(AnalysisStatus::Failed) => ViewStatus::Failed,
            _ => ViewStatus::Completed,
        };
    }

    pub fn mark_unavailable(&mut self, reason: UnavailableReason) {
        self.status = ViewStatus::Unavailable;
        self.unavailable = Some(reason);
    }

    pub fn show_cached(&mut self, analysis_id: String, analysis: Option<Analysis>, report: Option<Report>) {
        let status = match analysis.as_ref().map(|analysis| analysis.status) {
            Some(AnalysisStatus::Failed) => ViewStatus::Failed,
            Some(status) if status.is_terminal() => ViewStatus::Completed,
            Some(_) => ViewStatus::Idle,
            None if report.is_some() => ViewStatus::Completed,
            None => ViewStatus::Idle,
        };

        *self = Self {
            status,
            analysis_id: Some(analysis_id),
            analysis,
            report,
            ..Self::default()
        };
    }

    pub fn dispose(&mut self) {
        if self.status == ViewStatus::Polling {
            self.status = ViewStatus::Disposed;
        }
    }
}
