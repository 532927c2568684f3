use std::sync::Arc;

use tracing::{debug, info};

use crate::api_client::AnalysisApi;
use crate::errors::AnalyzerError;
use crate::jobs::store::JobStore;
use crate::models::job::HistoryPage;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Loads pages of past jobs into the JobStore list view.
#[derive(Clone)]
pub struct HistoryPaginator {
    api: Arc<dyn AnalysisApi>,
    store: JobStore,
    page_size: u32,
}

impl HistoryPaginator {
    pub fn new(api: Arc<dyn AnalysisApi>, store: JobStore, page_size: u32) -> Self {
        Self {
            api,
            store,
            page_size: page_size.max(1),
        }
    }

    /// Fetches one page and merges it. On failure the store is left as it was.
    pub async fn fetch_page(&self, offset: u64, limit: u32) -> Result<HistoryPage, AnalyzerError> {
        if limit == 0 {
            return Err(AnalyzerError::Validation(
                "Page limit must be greater than zero".to_string(),
            ));
        }

        let page = self
            .api
            .list_jobs(offset, limit)
            .await
            .map_err(AnalyzerError::fetch)?;

        self.store.merge_page(offset, &page);
        info!(
            offset,
            items = page.items.len(),
            total = page.total,
            has_more = page.has_more,
            "History page loaded"
        );
        Ok(page)
    }

    /// Reloads the first page, replacing whatever the list held.
    pub async fn refresh(&self) -> Result<HistoryPage, AnalyzerError> {
        self.fetch_page(0, self.page_size).await
    }

    /// Fetches the page after the rows already held.
    /// Returns `None` without a request when the backend already said there is no more.
    pub async fn fetch_next_page(&self) -> Result<Option<HistoryPage>, AnalyzerError> {
        let view = self.store.history();
        if view.loaded && !view.has_more {
            debug!(held = view.items.len(), "History exhausted, skipping fetch");
            return Ok(None);
        }
        let offset = view.items.len() as u64;
        self.fetch_page(offset, self.page_size).await.map(Some)
    }

    pub fn has_more(&self) -> bool {
        let view = self.store.history();
        !view.loaded || view.has_more
    }
}
