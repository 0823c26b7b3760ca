use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::models::{Analysis, Report};
use crate::polling::UnavailableReason;

use super::KeyValueStore;

/// The single key holding the most recently viewed results.
pub const RESULTS_KEY: &str = "siteaudit.latestResults";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CachedResults {
    pub analysis_id: String,
    pub analysis: Option<Analysis>,
    pub report: Option<Report>,
    pub saved_at: DateTime<Utc>,
}

/// Typed view over the `RESULTS_KEY` entry of a [`KeyValueStore`].
#[derive(Clone)]
pub struct ResultsCache {
    store: Arc<dyn KeyValueStore>,
}

impl ResultsCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<CachedResults, UnavailableReason> {
        let raw = match self.store.get(RESULTS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Err(UnavailableReason::NoCachedData),
            Err(err) => {
                error!("Failed to read cached results: {err:#}");
                return Err(UnavailableReason::NoCachedData);
            }
        };

        serde_json::from_str::<CachedResults>(&raw).map_err(|err| {
            warn!("Discarding malformed cached results: {err}");
            UnavailableReason::MalformedCache
        })
    }

    /// Stores `analysis` as the latest record. A report cached for the same
    /// analysis is kept; anything cached for another analysis is dropped.
    pub async fn save_analysis(&self, analysis: &Analysis) -> Result<()> {
        let report = match self.load().await {
            Ok(cached) if cached.analysis_id == analysis.id => cached.report,
            _ => None,
        };

        self.write(CachedResults {
            analysis_id: analysis.id.clone(),
            analysis: Some(analysis.clone()),
            report,
            saved_at: Utc::now(),
        })
        .await
    }

    /// Replaces the cached report in full.
    pub async fn save_report(&self, analysis_id: &str, report: &Report) -> Result<()> {
        let analysis = match self.load().await {
            Ok(cached) if cached.analysis_id == analysis_id => cached.analysis,
            _ => None,
        };

        self.write(CachedResults {
            analysis_id: analysis_id.to_string(),
            analysis,
            report: Some(report.clone()),
            saved_at: Utc::now(),
        })
        .await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store
            .remove(RESULTS_KEY)
            .await
            .context("failed to clear cached results")
    }

    async fn write(&self, record: CachedResults) -> Result<()> {
        let serialized = serde_json::to_string(&record).context("failed to serialize results")?;
        self.store
            .set(RESULTS_KEY, serialized)
            .await
            .context("failed to cache results")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisStatus, ReportScores, ReportTier, ScoreSet};
    use crate::store::MemoryStore;

    fn analysis(id: &str, status: AnalysisStatus) -> Analysis {
        Analysis {
            id: id.into(),
            url: "https://example.com".into(),
            status,
            scores: None,
            screenshots: Vec::new(),
            issues: Default::default(),
            error_message: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn report(id: &str) -> Report {
        Report {
            id: id.into(),
            analysis_id: None,
            report_type: ReportTier::Overview,
            website_url: None,
            scores: ReportScores::Standard(ScoreSet::default()),
            summary: Default::default(),
            recommendations: Vec::new(),
            violations: None,
            issue_preview: None,
            upgrade_info: None,
            generated_at: None,
        }
    }

    fn cache() -> (ResultsCache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ResultsCache::new(store.clone()), store)
    }

    #[tokio::test]
    async fn empty_store_is_no_cached_data() {
        let (cache, _) = cache();
        assert_eq!(cache.load().await, Err(UnavailableReason::NoCachedData));
    }

    #[tokio::test]
    async fn malformed_entry_is_reported() {
        let (cache, store) = cache();
        store.set(RESULTS_KEY, "{\"analysisId\": 5".into()).await.unwrap();
        assert_eq!(cache.load().await, Err(UnavailableReason::MalformedCache));
    }

    #[tokio::test]
    async fn analysis_update_keeps_report_for_same_id() {
        let (cache, _) = cache();
        cache.save_analysis(&analysis("a1", AnalysisStatus::Processing)).await.unwrap();
        cache.save_report("a1", &report("r1")).await.unwrap();
        cache.save_analysis(&analysis("a1", AnalysisStatus::Completed)).await.unwrap();

        let cached = cache.load().await.unwrap();
        assert_eq!(cached.analysis.unwrap().status, AnalysisStatus::Completed);
        assert_eq!(cached.report.unwrap().id, "r1");
    }

    #[tokio::test]
    async fn new_analysis_replaces_everything() {
        let (cache, _) = cache();
        cache.save_report("a1", &report("r1")).await.unwrap();
        cache.save_analysis(&analysis("a2", AnalysisStatus::Pending)).await.unwrap();

        let cached = cache.load().await.unwrap();
        assert_eq!(cached.analysis_id, "a2");
        assert!(cached.report.is_none());

        cache.clear().await.unwrap();
        assert_eq!(cache.load().await, Err(UnavailableReason::NoCachedData));
    }
}
