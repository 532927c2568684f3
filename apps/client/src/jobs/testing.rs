//! In-memory `AnalysisApi` and recording `Clock` shared by the controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use crate::api_client::{AnalysisApi, ApiError};
use crate::jobs::clock::Clock;
use crate::models::document::ResumeDocument;
use crate::models::job::{HistoryPage, Job, JobId, JobState, JobStatus, JobSummary, MatchReport};

pub(crate) fn report(score: f64) -> MatchReport {
    MatchReport {
        match_score: score,
        matched_skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
        missing_skills: vec!["Kubernetes".to_string()],
        suggestions: vec!["Quantify the latency work".to_string()],
    }
}

pub(crate) fn job(id: &str, state: JobState) -> Job {
    Job {
        id: JobId::from(id),
        job_description: "Backend engineer, Rust and Postgres".to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
        completed_at: None,
        state,
    }
}

pub(crate) fn summary(i: usize) -> JobSummary {
    JobSummary {
        id: JobId::from(format!("job-{i}")),
        status: JobStatus::Completed,
        match_score: Some(50.0),
        summary_preview: format!("Role {i}"),
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
    }
}

/// One scripted response to `get_job`.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Status(JobState),
    TransportError,
    /// Never resolves; used to exercise cancellation of an in-flight fetch.
    Hang,
}

#[derive(Default)]
struct FakeState {
    scripts: HashMap<JobId, VecDeque<Step>>,
    fetch_calls: HashMap<JobId, usize>,
    history: Vec<JobSummary>,
    list_calls: usize,
    fail_list: bool,
    created: Vec<(String, String)>,
    reject_create: Option<String>,
    delete_calls: usize,
    fail_delete: bool,
}

/// Backend double. A script's last step repeats once the others are consumed.
#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn script(&self, id: &str, steps: Vec<Step>) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(JobId::from(id), steps.into());
    }

    pub(crate) fn seed_history(&self, count: usize) {
        self.state.lock().unwrap().history = (0..count).map(summary).collect();
    }

    pub(crate) fn fail_list(&self, fail: bool) {
        self.state.lock().unwrap().fail_list = fail;
    }

    pub(crate) fn reject_create(&self, detail: &str) {
        self.state.lock().unwrap().reject_create = Some(detail.to_string());
    }

    pub(crate) fn fail_delete(&self, fail: bool) {
        self.state.lock().unwrap().fail_delete = fail;
    }

    pub(crate) fn fetch_calls(&self, id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.fetch_calls.get(&JobId::from(id)).copied().unwrap_or(0)
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub(crate) fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }

    pub(crate) fn created(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().created.clone()
    }

    fn next_step(&self, id: &JobId) -> Option<Step> {
        let mut state = self.state.lock().unwrap();
        *state.fetch_calls.entry(id.clone()).or_default() += 1;
        let script = state.scripts.get_mut(id)?;
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl AnalysisApi for FakeApi {
    async fn create_job(
        &self,
        document: &ResumeDocument,
        job_description: &str,
    ) -> Result<JobId, ApiError> {
        let mut state = self.state.lock().unwrap();
        if let Some(detail) = &state.reject_create {
            return Err(ApiError::Api {
                status: 400,
                message: detail.clone(),
            });
        }
        state
            .created
            .push((document.file_name.clone(), job_description.to_string()));
        Ok(JobId::from(format!("new-{}", state.created.len())))
    }

    async fn get_job(&self, id: &JobId) -> Result<Job, ApiError> {
        match self.next_step(id) {
            Some(Step::Status(state)) => Ok(job(id.as_str(), state)),
            Some(Step::TransportError) => Err(ApiError::Api {
                status: 503,
                message: "upstream unavailable".to_string(),
            }),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(ApiError::NotFound),
        }
    }

    async fn list_jobs(&self, skip: u64, limit: u32) -> Result<HistoryPage, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if state.fail_list {
            return Err(ApiError::Api {
                status: 500,
                message: String::new(),
            });
        }
        let items: Vec<JobSummary> = state
            .history
            .iter()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        let has_more = (skip as usize) + items.len() < state.history.len();
        Ok(HistoryPage {
            items,
            total: state.history.len() as u64,
            has_more,
        })
    }

    async fn delete_job(&self, id: &JobId) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;
        if state.fail_delete {
            return Err(ApiError::Api {
                status: 500,
                message: String::new(),
            });
        }
        let before = state.history.len();
        state.history.retain(|s| &s.id != id);
        if state.history.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

/// Records every requested wait and returns immediately.
#[derive(Default)]
pub(crate) struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl RecordingClock {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fires `token` while the `n`th wait is in progress.
    pub(crate) fn cancel_during_sleep(&self, n: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((n, token));
    }

    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut sleeps = self.sleeps.lock().unwrap();
            sleeps.push(duration);
            sleeps.len()
        };
        let cancel = self
            .cancel_after
            .lock()
            .unwrap()
            .as_ref()
            .filter(|(n, _)| *n == count)
            .map(|(_, token)| token.clone());
        if let Some(token) = cancel {
            token.cancel();
            // park until the poller drops this wait in favour of the cancellation branch
            std::future::pending::<()>().await;
        }
        tokio::task::yield_now().await;
    }
}
