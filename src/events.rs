use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::{Analysis, Report};
use crate::polling::ViewStatus;

/// Notifications pushed from controllers to whatever renders the view.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ViewEvent {
    #[serde(rename_all = "camelCase")]
    AnalysisUpdated {
        analysis: Analysis,
        attempt: u32,
        max_attempts: u32,
    },
    #[serde(rename_all = "camelCase")]
    PollFinished { status: ViewStatus, attempts: u32 },
    ReportChanged { report: Report },
    Notice { message: String },
}

impl ViewEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ViewEvent::AnalysisUpdated { .. } => "analysis-updated",
            ViewEvent::PollFinished { .. } => "poll-finished",
            ViewEvent::ReportChanged { .. } => "report-changed",
            ViewEvent::Notice { .. } => "notice",
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: ViewEvent);
}

/// Forwards events to an unbounded channel. A closed receiver is ignored.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ViewEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ViewEvent) {
        let _ = self.tx.send(event);
    }
}
