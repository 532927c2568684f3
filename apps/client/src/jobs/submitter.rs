use std::sync::Arc;

use tracing::{info, warn};

use crate::api_client::AnalysisApi;
use crate::errors::AnalyzerError;
use crate::models::document::ResumeDocument;
use crate::models::job::JobId;

/// Largest resume the backend accepts.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Validates and sends new analysis requests.
/// Does not touch the JobStore; the caller hands the returned id to a `ResultPoller`.
#[derive(Clone)]
pub struct JobSubmitter {
    api: Arc<dyn AnalysisApi>,
}

impl JobSubmitter {
    pub fn new(api: Arc<dyn AnalysisApi>) -> Self {
        Self { api }
    }

    pub async fn submit(
        &self,
        document: &ResumeDocument,
        job_description: &str,
    ) -> Result<JobId, AnalyzerError> {
        validate_submission(document, job_description)?;

        info!(
            file = %document.file_name,
            bytes = document.len(),
            "Submitting resume for analysis"
        );
        let job_id = self
            .api
            .create_job(document, job_description.trim())
            .await
            .map_err(|e| {
                warn!("Submission failed: {e}");
                AnalyzerError::submission(e)
            })?;

        info!(%job_id, "Analysis queued");
        Ok(job_id)
    }
}

/// Local checks run before any request is sent.
pub fn validate_submission(
    document: &ResumeDocument,
    job_description: &str,
) -> Result<(), AnalyzerError> {
    if document.is_empty() {
        return Err(AnalyzerError::Validation(
            "Please upload your resume PDF".to_string(),
        ));
    }
    if !document.looks_like_pdf() {
        return Err(AnalyzerError::Validation(
            "Please upload a PDF file".to_string(),
        ));
    }
    if document.len() > MAX_DOCUMENT_BYTES {
        return Err(AnalyzerError::Validation(
            "File too large. Maximum size is 10MB.".to_string(),
        ));
    }
    if job_description.trim().is_empty() {
        return Err(AnalyzerError::Validation(
            "Please paste the job description".to_string(),
        ));
    }
    Ok(())
}
