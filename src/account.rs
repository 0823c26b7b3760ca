use anyhow::Result;
use log::{info, warn};

use crate::api::AnalysisApi;
use crate::store::ResultsCache;

const DELETE_FALLBACK: &str = "Failed to delete account. Please try again.";

/// Deletes the signed-in account. On failure the error's top-level message
/// is the backend's `message` verbatim when one was sent.
pub async fn delete_account(api: &dyn AnalysisApi, cache: &ResultsCache) -> Result<()> {
    if let Err(err) = api.delete_account().await {
        let message = err.user_message(DELETE_FALLBACK);
        warn!("Account deletion failed: {err}");
        return Err(anyhow::Error::new(err).context(message));
    }

    if let Err(err) = cache.clear().await {
        warn!("Account deleted but cached results could not be cleared: {err:#}");
    }
    info!("Account deleted");
    Ok(())
}
