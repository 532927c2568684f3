//! ResultPoller — observes one job until the backend reports a terminal status,
//! the attempt ceiling is hit, or the caller cancels.
//!
//! State machine:
//!
//! ```text
//! Created ──start──▶ Polling{attempts} ──completed──▶ Completed
//!                        │  ▲           ──failed─────▶ Failed
//!                        │  │ wait      ──ceiling────▶ TimedOut
//!                        └──┘           ──token──────▶ Cancelled
//! ```
//!
//! Attempt k+1 is only issued after attempt k resolved. Transport errors count as an
//! attempt and are swallowed; only terminal outcomes reach the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api_client::AnalysisApi;
use crate::errors::{AnalyzerError, FAILED_FALLBACK, TIMED_OUT_MESSAGE};
use crate::jobs::clock::Clock;
use crate::jobs::store::JobStore;
use crate::models::job::{Job, JobId, JobState, JobStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
/// 60 attempts at the default interval is roughly two minutes.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

pub const QUEUED_LABEL: &str = "Queued...";
pub const PROCESSING_LABEL: &str = "AI is analyzing your resume...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Intermediate observation, for progress display only.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub status_label: &'static str,
    pub attempt: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Progress(JobSnapshot),
    Completed(Job),
    Failed {
        job: Job,
        message: String,
    },
    TimedOut {
        job_id: JobId,
        attempts: u32,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Created,
    Polling { attempts: u32 },
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl PollState {
    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Created | PollState::Polling { .. })
    }
}

/// How a poll session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(Job),
    Failed { job: Job, message: String },
    TimedOut { job_id: JobId, attempts: u32 },
    Cancelled,
}

impl PollOutcome {
    pub fn into_result(self) -> Result<Job, AnalyzerError> {
        match self {
            PollOutcome::Completed(job) => Ok(job),
            PollOutcome::Failed { message, .. } => Err(AnalyzerError::BackendFailure(message)),
            PollOutcome::TimedOut { job_id, attempts } => {
                Err(AnalyzerError::TimedOut { job_id, attempts })
            }
            PollOutcome::Cancelled => Err(AnalyzerError::Cancelled),
        }
    }
}

#[derive(Clone)]
pub struct ResultPoller {
    api: Arc<dyn AnalysisApi>,
    clock: Arc<dyn Clock>,
    store: JobStore,
    config: PollConfig,
}

impl ResultPoller {
    pub fn new(
        api: Arc<dyn AnalysisApi>,
        clock: Arc<dyn Clock>,
        store: JobStore,
        config: PollConfig,
    ) -> Self {
        Self {
            api,
            clock,
            store,
            config,
        }
    }

    /// Begins observing `job_id`. Each session is single-use.
    pub fn start(&self, job_id: JobId, cancel: CancellationToken) -> PollSession {
        PollSession {
            api: Arc::clone(&self.api),
            clock: Arc::clone(&self.clock),
            store: self.store.clone(),
            config: self.config,
            job_id,
            cancel,
            state: PollState::Created,
        }
    }
}

pub struct PollSession {
    api: Arc<dyn AnalysisApi>,
    clock: Arc<dyn Clock>,
    store: JobStore,
    config: PollConfig,
    job_id: JobId,
    cancel: CancellationToken,
    state: PollState,
}

impl PollSession {
    #[cfg(test)]
    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Advances the machine to its next observation.
    /// Returns `None` once the session has ended (after its terminal event, or on cancel).
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        if self.state == PollState::Created {
            debug!(job_id = %self.job_id, "Polling started");
            self.state = PollState::Polling { attempts: 0 };
        }

        loop {
            let attempts = match self.state {
                PollState::Polling { attempts } => attempts,
                _ => return None,
            };
            let cancel = self.cancel.clone();

            if attempts > 0 {
                if cancel.is_cancelled() {
                    return self.cancelled();
                }
                let interrupted = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => true,
                    _ = self.clock.sleep(self.config.interval) => false,
                };
                if interrupted {
                    return self.cancelled();
                }
            }

            if cancel.is_cancelled() {
                return self.cancelled();
            }
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.api.get_job(&self.job_id) => Some(result),
            };
            let fetched = match fetched {
                Some(result) if !cancel.is_cancelled() => result,
                _ => return self.cancelled(),
            };

            let attempt = attempts + 1;
            self.state = PollState::Polling { attempts: attempt };

            match fetched {
                Ok(job) => match &job.state {
                    JobState::Completed(report) => {
                        info!(
                            job_id = %self.job_id,
                            attempt,
                            score = report.match_score,
                            "Analysis completed"
                        );
                        self.store.record_job(job.clone());
                        self.state = PollState::Completed;
                        return Some(PollEvent::Completed(job));
                    }
                    JobState::Failed { message } => {
                        let message = message
                            .clone()
                            .unwrap_or_else(|| FAILED_FALLBACK.to_string());
                        warn!(job_id = %self.job_id, attempt, "Analysis failed: {message}");
                        self.store.record_job(job.clone());
                        self.state = PollState::Failed;
                        return Some(PollEvent::Failed { job, message });
                    }
                    _ if attempt >= self.config.max_attempts => return self.timed_out(attempt),
                    _ => {
                        let status = job.status();
                        debug!(job_id = %self.job_id, attempt, %status, "Job not finished yet");
                        return Some(PollEvent::Progress(JobSnapshot {
                            job_id: self.job_id.clone(),
                            status_label: status_label(&status),
                            status,
                            attempt,
                        }));
                    }
                },
                Err(e) => {
                    debug!(job_id = %self.job_id, attempt, "Poll attempt failed, retrying: {e}");
                    if attempt >= self.config.max_attempts {
                        return self.timed_out(attempt);
                    }
                }
            }
        }
    }

    /// Drives the session to its end, reporting each intermediate snapshot.
    pub async fn run<F>(mut self, mut on_progress: F) -> PollOutcome
    where
        F: FnMut(&JobSnapshot),
    {
        while let Some(event) = self.next_event().await {
            match event {
                PollEvent::Progress(snapshot) => on_progress(&snapshot),
                PollEvent::Completed(job) => return PollOutcome::Completed(job),
                PollEvent::Failed { job, message } => return PollOutcome::Failed { job, message },
                PollEvent::TimedOut {
                    job_id, attempts, ..
                } => return PollOutcome::TimedOut { job_id, attempts },
            }
        }
        PollOutcome::Cancelled
    }

    fn cancelled(&mut self) -> Option<PollEvent> {
        info!(job_id = %self.job_id, "Polling cancelled");
        self.state = PollState::Cancelled;
        None
    }

    fn timed_out(&mut self, attempts: u32) -> Option<PollEvent> {
        warn!(job_id = %self.job_id, attempts, "Gave up waiting for analysis");
        self.state = PollState::TimedOut;
        Some(PollEvent::TimedOut {
            job_id: self.job_id.clone(),
            attempts,
            message: TIMED_OUT_MESSAGE.to_string(),
        })
    }
}

pub fn status_label(status: &JobStatus) -> &'static str {
    match status {
        JobStatus::Processing => PROCESSING_LABEL,
        _ => QUEUED_LABEL,
    }
}
