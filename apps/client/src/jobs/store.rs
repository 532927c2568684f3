//! JobStore — the in-memory source of truth for job details and the history list.
//!
//! Every mutation replaces its slice (one job record, or the items/total/has_more triple)
//! under a single write lock, so readers never observe a half-applied update.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::models::job::{HistoryPage, Job, JobId, JobSummary};

/// The list view as last merged from the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryView {
    pub items: Vec<JobSummary>,
    pub total: u64,
    pub has_more: bool,
    /// False until the first page has been merged.
    pub loaded: bool,
}

#[derive(Debug, Default)]
struct StoreInner {
    jobs: HashMap<JobId, Job>,
    history: HistoryView,
}

/// Cheap to clone; all clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub fn job(&self, id: &JobId) -> Option<Job> {
        self.read().jobs.get(id).cloned()
    }

    /// Consistent snapshot of the list view.
    pub fn history(&self) -> HistoryView {
        self.read().history.clone()
    }

    #[cfg(test)]
    pub fn held_count(&self) -> usize {
        self.read().history.items.len()
    }

    /// Commits a job record, refusing any status regression.
    /// The matching history row, if loaded, is updated in the same write.
    pub fn record_job(&self, job: Job) -> bool {
        let mut inner = self.write();
        let status = job.status();

        if let Some(existing) = inner.jobs.get(&job.id) {
            if !existing.status().can_advance_to(&status) {
                warn!(
                    job_id = %job.id,
                    from = %existing.status(),
                    to = %status,
                    "Refusing job status regression"
                );
                return false;
            }
        }

        if let Some(row) = inner.history.items.iter_mut().find(|s| s.id == job.id) {
            if row.status.can_advance_to(&status) {
                row.status = status.clone();
                row.match_score = job.report().map(|r| r.match_score);
            }
        }

        debug!(job_id = %job.id, %status, "Job recorded");
        inner.jobs.insert(job.id.clone(), job);
        true
    }

    /// Merges a fetched page: `offset == 0` replaces the list, later pages append
    /// rows whose id is not already held.
    pub fn merge_page(&self, offset: u64, page: &HistoryPage) {
        let mut inner = self.write();

        let mut items = if offset == 0 {
            Vec::with_capacity(page.items.len())
        } else {
            inner.history.items.clone()
        };
        let mut seen: HashSet<JobId> = items.iter().map(|s| s.id.clone()).collect();
        for summary in &page.items {
            if seen.insert(summary.id.clone()) {
                items.push(summary.clone());
            }
        }

        debug!(
            offset,
            received = page.items.len(),
            held = items.len(),
            total = page.total,
            "History page merged"
        );
        inner.history = HistoryView {
            items,
            total: page.total,
            has_more: page.has_more,
            loaded: true,
        };
    }

    /// Drops a deleted job everywhere and decrements the total by one.
    /// Returns whether the list view held a row for it.
    pub fn remove(&self, id: &JobId) -> bool {
        let mut inner = self.write();
        inner.jobs.remove(id);

        let before = inner.history.items.len();
        let items: Vec<JobSummary> = inner
            .history
            .items
            .iter()
            .filter(|s| &s.id != id)
            .cloned()
            .collect();
        let held = items.len() != before;

        inner.history = HistoryView {
            items,
            total: inner.history.total.saturating_sub(1),
            has_more: inner.history.has_more,
            loaded: inner.history.loaded,
        };
        held
    }
}
