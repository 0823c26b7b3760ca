//! Plain-text rendering of results for the terminal.

use crate::{
    models::{Analysis, Report},
    polling::{ResultsState, ViewStatus},
    report::{ReportAction, ReportView},
    scoring::Severity,
};

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{text}\x1b[0m", severity.ansi_color())
        } else {
            text.to_string()
        }
    }

    /// `  Accessibility    72  warning`
    ///
    /// The score is rounded to whole points once; that value is both shown
    /// and classified.
    pub fn score_row(&self, label: &str, score: Option<f64>) -> String {
        let Some(score) = score else {
            return format!("  {label:<14}{:>5}  not measured", "-");
        };
        let shown = score.round();
        let severity = Severity::from_score(shown);
        format!(
            "  {label:<14}{:>5}  {}",
            format!("{shown:.0}"),
            self.paint(severity, severity.as_str())
        )
    }

    pub fn progress(&self, analysis: &Analysis, attempt: u32, max_attempts: u32) -> String {
        format!(
            "[{attempt}/{max_attempts}] {} is {}",
            analysis.url,
            analysis.status.as_str()
        )
    }

    pub fn results(&self, state: &ResultsState) -> String {
        let mut out = String::new();

        match state.status {
            ViewStatus::Unavailable => {
                let reason = state.unavailable.map(|reason| reason.user_message());
                out.push_str(reason.unwrap_or("Results not found. Please try again."));
                out.push('\n');
                return out;
            }
            ViewStatus::Disposed => {
                out.push_str("Stopped waiting for results.\n");
                return out;
            }
            _ => {}
        }

        if let Some(analysis) = &state.analysis {
            out.push_str(&self.analysis(analysis));
        } else if let Some(id) = &state.analysis_id {
            out.push_str(&format!("Analysis {id}\n"));
        }

        if let Some(report) = &state.report {
            out.push('\n');
            out.push_str(&self.report(report));
        }

        if let Some(notice) = &state.notice {
            out.push_str(&format!("\n! {notice}\n"));
        }

        out
    }

    pub fn analysis(&self, analysis: &Analysis) -> String {
        let mut out = format!("{} ({})\n", analysis.url, analysis.status.as_str());

        if let Some(message) = &analysis.error_message {
            out.push_str(&format!("  {message}\n"));
        }

        if let Some(scores) = &analysis.scores {
            for (label, score) in scores.rows() {
                out.push_str(&self.score_row(label, score));
                out.push('\n');
            }
        }

        let total = analysis.issues.total();
        if total > 0 {
            out.push_str(&format!("Issues found: {total}\n"));
        }
        for (category, issues) in analysis.issues.by_category() {
            if issues.is_empty() {
                continue;
            }
            out.push_str(&format!("{category} issues ({})\n", issues.len()));
            for issue in issues {
                match &issue.impact {
                    Some(impact) => out.push_str(&format!("  - [{impact}] {}\n", issue.title)),
                    None => out.push_str(&format!("  - {}\n", issue.title)),
                }
            }
        }

        if !analysis.screenshots.is_empty() {
            out.push_str("Screenshots\n");
            for shot in &analysis.screenshots {
                let device = shot.device.as_deref().unwrap_or("page");
                out.push_str(&format!("  {device}: {}\n", shot.url));
            }
        }

        out
    }

    pub fn report(&self, report: &Report) -> String {
        let view = ReportView::new(report);
        let mut out = format!("Report {} ({})\n", report.id, view.tier().as_str());

        for (label, score) in view.scores().rows() {
            out.push_str(&self.score_row(label, score));
            out.push('\n');
        }

        let summary = view.summary();
        out.push_str(&format!(
            "Violations: {} total, {} critical, {} serious, {} moderate, {} minor\n",
            summary.total_violations, summary.critical, summary.serious, summary.moderate, summary.minor
        ));

        if !report.recommendations.is_empty() {
            out.push_str("Recommendations\n");
            for recommendation in &report.recommendations {
                out.push_str(&format!("  - {}\n", recommendation.title));
            }
        }

        if let Some(violations) = view.violations() {
            for violation in violations {
                let impact = violation.impact.as_deref().unwrap_or("unknown");
                out.push_str(&format!(
                    "  [{impact}] {}: {} ({} elements)\n",
                    violation.id, violation.description, violation.nodes
                ));
            }
        }

        if let Some(preview) = view.preview() {
            out.push_str(&format!("{} issues in the detailed report\n", preview.total()));
            for category in &preview.categories {
                out.push_str(&format!("  {}: {} issues (locked)\n", category.name, category.count));
            }
        }

        match view.action() {
            ReportAction::Upgrade { info } => {
                out.push_str("Unlock the detailed report with `siteaudit upgrade`");
                if let Some(price) = info.and_then(|info| info.price.as_deref()) {
                    out.push_str(&format!(" ({price})"));
                }
                out.push('\n');
                for feature in info.map(|info| info.features.as_slice()).unwrap_or_default() {
                    out.push_str(&format!("  + {feature}\n"));
                }
            }
            ReportAction::Download => {
                out.push_str("Download the PDF with `siteaudit download`\n");
            }
        }

        out
    }
}
