use thiserror::Error;

use crate::api_client::ApiError;
use crate::models::job::JobId;

const SUBMIT_FALLBACK: &str = "Failed to submit. Please try again.";
const HISTORY_FALLBACK: &str = "Failed to load history";
const DELETE_FALLBACK: &str = "Failed to delete analysis. Please try again.";
pub const FAILED_FALLBACK: &str = "Analysis failed. Please try again.";
pub const TIMED_OUT_MESSAGE: &str = "Analysis timed out. Please try again.";

/// Controller-level error type.
/// Every variant is a terminal, user-facing outcome; transient poll failures never get here.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("History fetch failed: {0}")]
    Fetch(String),

    #[error("Deletion failed: {0}")]
    Deletion(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Job {job_id} did not finish after {attempts} poll attempts")]
    TimedOut { job_id: JobId, attempts: u32 },

    #[error("Analysis failed: {0}")]
    BackendFailure(String),

    #[error("Cancelled")]
    Cancelled,
}

impl AnalyzerError {
    /// Message suitable for showing to the user as-is.
    pub fn user_message(&self) -> String {
        match self {
            AnalyzerError::Validation(msg) => msg.clone(),
            AnalyzerError::Submission(msg) => msg.clone(),
            AnalyzerError::Fetch(msg) => msg.clone(),
            AnalyzerError::Deletion(msg) => msg.clone(),
            AnalyzerError::NotFound(msg) => msg.clone(),
            AnalyzerError::TimedOut { .. } => TIMED_OUT_MESSAGE.to_string(),
            AnalyzerError::BackendFailure(msg) => msg.clone(),
            AnalyzerError::Cancelled => "Cancelled".to_string(),
        }
    }

    pub(crate) fn submission(err: ApiError) -> Self {
        AnalyzerError::Submission(err.detail().unwrap_or_else(|| SUBMIT_FALLBACK.to_string()))
    }

    pub(crate) fn fetch(err: ApiError) -> Self {
        tracing::warn!("History fetch error: {err}");
        AnalyzerError::Fetch(err.detail().unwrap_or_else(|| HISTORY_FALLBACK.to_string()))
    }

    pub(crate) fn deletion(job_id: &JobId, err: ApiError) -> Self {
        match err {
            ApiError::NotFound => AnalyzerError::NotFound(format!("Analysis {job_id} not found")),
            other => {
                tracing::warn!("Delete error for {job_id}: {other}");
                AnalyzerError::Deletion(
                    other.detail().unwrap_or_else(|| DELETE_FALLBACK.to_string()),
                )
            }
        }
    }
}
