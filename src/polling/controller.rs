use std::{path::Path, sync::Arc};

use anyhow::{anyhow, bail, Result};
use log::{error, info, warn};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    api::AnalysisApi,
    events::{EventSink, ViewEvent},
    models::{Analysis, Report},
    report::{download_pdf, request_upgrade, UpgradeResult},
    store::ResultsCache,
};

use super::{poll_until, PollConfig, PollOutcome, ResultsState, UnavailableReason};

#[derive(Default)]
struct PollerSlot {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

/// Drives one results view: polls an analysis, keeps the latest record,
/// and runs the report actions against it.
#[derive(Clone)]
pub struct ResultsController {
    state: Arc<Mutex<ResultsState>>,
    api: Arc<dyn AnalysisApi>,
    cache: ResultsCache,
    events: Arc<dyn EventSink>,
    poller: Arc<Mutex<PollerSlot>>,
    config: PollConfig,
}

impl ResultsController {
    pub fn new(
        api: Arc<dyn AnalysisApi>,
        cache: ResultsCache,
        events: Arc<dyn EventSink>,
        config: PollConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ResultsState::new())),
            api,
            cache,
            events,
            poller: Arc::new(Mutex::new(PollerSlot::default())),
            config,
        }
    }

    pub async fn snapshot(&self) -> ResultsState {
        self.state.lock().await.clone()
    }

    /// Starts polling `analysis_id`, replacing whatever the view showed.
    pub async fn open(&self, analysis_id: &str) -> Result<()> {
        let analysis_id = analysis_id.trim();
        if analysis_id.is_empty() {
            bail!("analysis id must not be empty");
        }

        self.dispose().await;

        {
            let mut state = self.state.lock().await;
            state.begin_polling(analysis_id.to_string(), self.config.max_attempts);
        }

        self.spawn_poller(analysis_id.to_string()).await;
        info!("Polling analysis {analysis_id}");
        Ok(())
    }

    /// Clears the session cache, requests a scan of `url` and starts
    /// polling it. Returns the new analysis id.
    pub async fn start_scan(&self, url: &str) -> Result<String> {
        self.dispose().await;

        if let Err(err) = self.cache.clear().await {
            warn!("Failed to clear cached results before new scan: {err:#}");
        }

        let analysis = self.api.start_analysis(url).await.map_err(|err| {
            let message = err.user_message("Failed to start the scan.");
            anyhow::Error::new(err).context(message)
        })?;

        info!("Started analysis {} for {}", analysis.id, analysis.url);
        self.open(&analysis.id).await?;
        Ok(analysis.id)
    }

    /// Resolves when the current poll has finished or was disposed.
    pub async fn wait(&self) -> ResultsState {
        let handle = self.poller.lock().await.handle.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!("results poller task failed: {err}");
            }
        }
        self.snapshot().await
    }

    /// Stops the poll owned by this view. Nothing from the cancelled
    /// sequence touches state after this returns.
    pub async fn dispose(&self) {
        let (handle, token) = {
            let mut slot = self.poller.lock().await;
            (slot.handle.take(), slot.cancel_token.take())
        };

        if let Some(token) = token {
            // Cancel under the state lock so an update already holding it
            // finishes first and none can start afterwards.
            let mut state = self.state.lock().await;
            token.cancel();
            state.dispose();
        }

        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!("results poller task failed to join: {err}");
            }
        }
    }

    /// Shows whatever the session cache holds, without polling.
    pub async fn restore_cached(&self) -> ResultsState {
        self.dispose().await;

        let cached = self.cache.load().await;
        let mut state = self.state.lock().await;
        match cached {
            Ok(cached) => state.show_cached(cached.analysis_id, cached.analysis, cached.report),
            Err(reason) => {
                info!("No cached results to show: {}", reason.detail());
                *state = ResultsState::new();
                state.mark_unavailable(reason);
            }
        }
        state.clone()
    }

    /// Points the view at `analysis_id` without polling, reusing cached
    /// data when it belongs to the same analysis.
    pub async fn attach(&self, analysis_id: &str) -> Result<ResultsState> {
        let analysis_id = analysis_id.trim();
        if analysis_id.is_empty() {
            bail!("analysis id must not be empty");
        }

        self.dispose().await;

        let cached = self
            .cache
            .load()
            .await
            .ok()
            .filter(|cached| cached.analysis_id == analysis_id);
        let mut state = self.state.lock().await;
        match cached {
            Some(cached) => state.show_cached(cached.analysis_id, cached.analysis, cached.report),
            None => state.show_cached(analysis_id.to_string(), None, None),
        }
        Ok(state.clone())
    }

    /// Fetches the overview report for the open analysis.
    pub async fn load_report(&self) -> Result<Report> {
        let analysis_id = self.current_analysis_id().await?;

        match self.api.get_report(&analysis_id).await {
            Ok(report) => {
                self.replace_report(&analysis_id, report.clone()).await;
                Ok(report)
            }
            Err(err) => {
                let message = err.user_message("Failed to load the report.");
                self.notify(message.clone()).await;
                Err(anyhow::Error::new(err).context(message))
            }
        }
    }

    /// Swaps an overview report for the detailed one. On failure the
    /// current report is left untouched and a notice is raised.
    pub async fn upgrade_report(&self) -> Result<Report> {
        let (analysis_id, current) = self.current_report().await?;

        match request_upgrade(self.api.as_ref(), &analysis_id, &current).await {
            Ok(UpgradeResult::AlreadyDetailed) => Ok(current),
            Ok(UpgradeResult::Upgraded(report)) => {
                self.replace_report(&analysis_id, report.clone()).await;
                Ok(report)
            }
            Err(err) => {
                let message = err.user_message();
                self.notify(message.clone()).await;
                Err(anyhow::Error::new(err).context(message))
            }
        }
    }

    pub async fn download_report(&self, dest: &Path) -> Result<u64> {
        let (analysis_id, current) = self.current_report().await?;

        match download_pdf(self.api.as_ref(), &analysis_id, &current, dest).await {
            Ok(written) => Ok(written),
            Err(err) => {
                let message = err.user_message();
                self.notify(message.clone()).await;
                Err(anyhow::Error::new(err).context(message))
            }
        }
    }

    async fn current_analysis_id(&self) -> Result<String> {
        self.state
            .lock()
            .await
            .analysis_id
            .clone()
            .ok_or_else(|| anyhow!("no analysis is open"))
    }

    async fn current_report(&self) -> Result<(String, Report)> {
        let state = self.state.lock().await;
        let analysis_id = state
            .analysis_id
            .clone()
            .ok_or_else(|| anyhow!("no analysis is open"))?;
        let report = state
            .report
            .clone()
            .ok_or_else(|| anyhow!("no report loaded for analysis {analysis_id}"))?;
        Ok((analysis_id, report))
    }

    async fn replace_report(&self, analysis_id: &str, report: Report) {
        let mut state = self.state.lock().await;
        if state.analysis_id.as_deref() != Some(analysis_id) {
            warn!("Dropping report for {analysis_id}: view moved on");
            return;
        }

        if let Err(err) = self.cache.save_report(analysis_id, &report).await {
            error!("Failed to cache report for {analysis_id}: {err:#}");
        }
        state.report = Some(report.clone());
        state.notice = None;
        self.events.emit(ViewEvent::ReportChanged { report });
    }

    async fn notify(&self, message: String) {
        let mut state = self.state.lock().await;
        state.notice = Some(message.clone());
        self.events.emit(ViewEvent::Notice { message });
    }

    async fn spawn_poller(&self, analysis_id: String) {
        let mut slot = self.poller.lock().await;
        if let Some(token) = slot.cancel_token.take() {
            token.cancel();
        }

        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();
        let state = self.state.clone();
        let api = self.api.clone();
        let cache = self.cache.clone();
        let events = self.events.clone();
        let config = self.config;

        let handle = tokio::spawn(async move {
            let update_token = task_token.clone();
            let update_state = state.clone();
            let update_events = events.clone();

            let outcome = poll_until(
                config,
                &task_token,
                move |_| {
                    let api = api.clone();
                    let analysis_id = analysis_id.clone();
                    async move { api.get_by_id(&analysis_id).await }
                },
                Analysis::is_terminal,
                move |analysis: Analysis, attempt| {
                    let token = update_token.clone();
                    let state = update_state.clone();
                    let cache = cache.clone();
                    let events = update_events.clone();
                    async move {
                        let mut guard = state.lock().await;
                        if token.is_cancelled() {
                            return;
                        }

                        if let Err(err) = cache.save_analysis(&analysis).await {
                            error!("Failed to cache analysis {}: {err:#}", analysis.id);
                        }
                        guard.record_attempt(analysis.clone(), attempt);
                        events.emit(ViewEvent::AnalysisUpdated {
                            analysis,
                            attempt,
                            max_attempts: config.max_attempts,
                        });
                    }
                },
            )
            .await;

            finish_poll(&state, events.as_ref(), &task_token, outcome).await;
        });

        slot.handle = Some(handle);
        slot.cancel_token = Some(cancel_token);
    }
}

async fn finish_poll(
    state: &Mutex<ResultsState>,
    events: &dyn EventSink,
    token: &CancellationToken,
    outcome: PollOutcome<Analysis>,
) {
    let mut guard = state.lock().await;
    if token.is_cancelled() {
        return;
    }

    match outcome {
        PollOutcome::Terminal { value, attempts } => {
            info!(
                "Analysis {} finished as {} after {attempts} attempts",
                value.id,
                value.status.as_str()
            );
            guard.finish_terminal(attempts);
        }
        PollOutcome::Exhausted { attempts, .. } => {
            warn!("Analysis did not finish within {attempts} attempts");
            guard.attempts = attempts;
            guard.mark_unavailable(UnavailableReason::PollTimeout);
        }
        PollOutcome::Cancelled { .. } => return,
    }

    events.emit(ViewEvent::PollFinished {
        status: guard.status,
        attempts: guard.attempts,
    });
}
