use std::sync::Arc;

use tracing::info;

use crate::api_client::AnalysisApi;
use crate::errors::AnalyzerError;
use crate::jobs::store::JobStore;
use crate::models::job::JobId;

/// Deletes jobs pessimistically: the store only changes after the backend confirmed.
/// User confirmation is the caller's responsibility.
#[derive(Clone)]
pub struct DeletionCoordinator {
    api: Arc<dyn AnalysisApi>,
    store: JobStore,
}

impl DeletionCoordinator {
    pub fn new(api: Arc<dyn AnalysisApi>, store: JobStore) -> Self {
        Self { api, store }
    }

    pub async fn delete(&self, job_id: &JobId) -> Result<(), AnalyzerError> {
        self.api
            .delete_job(job_id)
            .await
            .map_err(|e| AnalyzerError::deletion(job_id, e))?;

        let held = self.store.remove(job_id);
        info!(%job_id, held, "Analysis deleted");
        Ok(())
    }
}
