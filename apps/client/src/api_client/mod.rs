//! Analysis API client — the single point of entry for all backend calls.
//!
//! ARCHITECTURAL RULE: controllers in `jobs` never build HTTP requests themselves.
//! They depend on the `AnalysisApi` trait so tests can swap in an in-memory backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::document::ResumeDocument;
use crate::models::job::{CreateJobResponse, HistoryPage, Job, JobId, JobRecord};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Resource not found")]
    NotFound,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Backend-provided human-readable message, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::Api { message, .. } if !message.trim().is_empty() => Some(message.clone()),
            _ => None,
        }
    }
}

/// The REST contract of the analysis backend.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// POST /analysis/
    async fn create_job(
        &self,
        document: &ResumeDocument,
        job_description: &str,
    ) -> Result<JobId, ApiError>;

    /// GET /analysis/{id}
    async fn get_job(&self, id: &JobId) -> Result<Job, ApiError>;

    /// GET /analysis/?skip={skip}&limit={limit}
    async fn list_jobs(&self, skip: u64, limit: u32) -> Result<HistoryPage, ApiError>;

    /// DELETE /analysis/{id}
    async fn delete_job(&self, id: &JobId) -> Result<(), ApiError>;
}

/// FastAPI-style error body: `{"detail": "..."}`. Validation errors carry a list instead.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Clone)]
pub struct HttpAnalysisApi {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl HttpAnalysisApi {
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url,
            api_token,
        })
    }

    /// `{base}/analysis/` when `id` is None, `{base}/analysis/{id}` otherwise.
    fn endpoint(&self, id: Option<&JobId>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push("analysis");
            segments.push(id.map(JobId::as_str).unwrap_or(""));
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Maps non-success statuses onto `ApiError`, extracting `detail` when present.
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Api {
            status: status.as_u16(),
            message: error_message(body),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = Self::check(response).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(ApiError::Parse)
    }
}

/// Human-readable text of an error body. Validation errors (422) carry a list of
/// `{loc, msg, type}` entries; the first `msg` is used.
fn error_message(body: String) -> String {
    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { detail }) => detail,
        Err(_) => return body,
    };
    match detail {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(entries) => entries
            .iter()
            .find_map(|entry| entry.get("msg").and_then(serde_json::Value::as_str))
            .map(String::from)
            .unwrap_or(body),
        _ => body,
    }
}

#[async_trait]
impl AnalysisApi for HttpAnalysisApi {
    async fn create_job(
        &self,
        document: &ResumeDocument,
        job_description: &str,
    ) -> Result<JobId, ApiError> {
        let url = self.endpoint(None)?;
        debug!(%url, bytes = document.len(), "Uploading resume");

        let resume = multipart::Part::bytes(document.bytes.to_vec())
            .file_name(document.file_name.clone())
            .mime_str("application/pdf")?;
        let form = multipart::Form::new()
            .part("resume", resume)
            .text("job_description", job_description.to_string());

        let response = self
            .authorize(self.client.post(url))
            .multipart(form)
            .send()
            .await?;
        let created: CreateJobResponse = Self::read_json(response).await?;
        Ok(created.id)
    }

    async fn get_job(&self, id: &JobId) -> Result<Job, ApiError> {
        let url = self.endpoint(Some(id))?;
        debug!(%url, "Fetching job");

        let response = self.authorize(self.client.get(url)).send().await?;
        let record: JobRecord = Self::read_json(response).await?;
        Ok(Job::from(record))
    }

    async fn list_jobs(&self, skip: u64, limit: u32) -> Result<HistoryPage, ApiError> {
        let url = self.endpoint(None)?;
        debug!(%url, skip, limit, "Listing jobs");

        let response = self
            .authorize(self.client.get(url))
            .query(&[("skip", skip.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn delete_job(&self, id: &JobId) -> Result<(), ApiError> {
        let url = self.endpoint(Some(id))?;
        debug!(%url, "Deleting job");

        let response = self.authorize(self.client.delete(url)).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Multipart, Path, Query, State},
        http::{header::AUTHORIZATION, HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
        Json, Router,
    };
    use chrono::Utc;
    use serde_json::{json, Value};

    use super::*;
    use crate::models::job::{preview, JobStatus, JobSummary};

    #[derive(Debug, Clone)]
    struct Upload {
        file_name: Option<String>,
        size: usize,
        job_description: String,
        authorization: Option<String>,
    }

    #[derive(Clone, Default)]
    struct FakeBackend {
        jobs: Arc<Mutex<Vec<JobRecord>>>,
        uploads: Arc<Mutex<Vec<Upload>>>,
    }

    type Reply = (AxumStatus, Json<Value>);

    fn not_found() -> Reply {
        (
            AxumStatus::NOT_FOUND,
            Json(json!({ "detail": "Analysis not found" })),
        )
    }

    async fn create(
        State(backend): State<FakeBackend>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> Reply {
        let mut upload = Upload {
            file_name: None,
            size: 0,
            job_description: String::new(),
            authorization: headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        };

        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "resume" => {
                    upload.file_name = field.file_name().map(String::from);
                    upload.size = field.bytes().await.unwrap().len();
                }
                "job_description" => upload.job_description = field.text().await.unwrap(),
                _ => {}
            }
        }

        if upload.job_description.trim().is_empty() {
            return (
                AxumStatus::BAD_REQUEST,
                Json(json!({ "detail": "Job description cannot be empty" })),
            );
        }

        let id = uuid::Uuid::new_v4().to_string();
        backend.jobs.lock().unwrap().insert(
            0,
            JobRecord {
                id: JobId::from(id.as_str()),
                status: JobStatus::Unknown("pending".to_string()),
                job_description: upload.job_description.trim().to_string(),
                created_at: Utc::now(),
                completed_at: None,
                match_score: None,
                matched_skills: None,
                missing_skills: None,
                suggestions: None,
                error_message: None,
            },
        );
        backend.uploads.lock().unwrap().push(upload);

        (
            AxumStatus::ACCEPTED,
            Json(json!({ "id": id, "status": "pending" })),
        )
    }

    #[derive(Deserialize)]
    struct ListParams {
        skip: usize,
        limit: usize,
    }

    async fn list(State(backend): State<FakeBackend>, Query(params): Query<ListParams>) -> Reply {
        if params.limit == 0 {
            return (
                AxumStatus::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "detail": [{
                        "type": "greater_than_equal",
                        "loc": ["query", "limit"],
                        "msg": "Input should be greater than or equal to 1",
                        "input": "0"
                    }]
                })),
            );
        }
        let jobs = backend.jobs.lock().unwrap();
        let items: Vec<JobSummary> = jobs
            .iter()
            .skip(params.skip)
            .take(params.limit)
            .cloned()
            .map(|record| JobSummary::from_job(&Job::from(record)))
            .collect();
        let has_more = params.skip + items.len() < jobs.len();
        let page = HistoryPage {
            items,
            total: jobs.len() as u64,
            has_more,
        };
        (AxumStatus::OK, Json(serde_json::to_value(page).unwrap()))
    }

    async fn fetch(State(backend): State<FakeBackend>, Path(id): Path<String>) -> Reply {
        let jobs = backend.jobs.lock().unwrap();
        match jobs.iter().find(|j| j.id.as_str() == id) {
            Some(record) => (AxumStatus::OK, Json(serde_json::to_value(record).unwrap())),
            None => not_found(),
        }
    }

    async fn remove(State(backend): State<FakeBackend>, Path(id): Path<String>) -> Reply {
        let mut jobs = backend.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| j.id.as_str() != id);
        if jobs.len() == before {
            return not_found();
        }
        (AxumStatus::OK, Json(Value::Null))
    }

    async fn spawn_backend(backend: FakeBackend) -> String {
        let app = Router::new()
            .route("/api/analysis/", post(create).get(list))
            .route("/api/analysis/:id", get(fetch).delete(remove))
            .with_state(backend);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn client(base_url: &str, token: Option<&str>) -> HttpAnalysisApi {
        HttpAnalysisApi::new(
            base_url,
            token.map(String::from),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn pdf() -> ResumeDocument {
        ResumeDocument::new("jane-doe.pdf", b"%PDF-1.4\nresume body".to_vec())
    }

    #[tokio::test]
    async fn test_create_job_uploads_multipart_with_token() {
        let backend = FakeBackend::default();
        let api = client(&spawn_backend(backend.clone()).await, Some("secret"));

        let id = api.create_job(&pdf(), "  Senior Rust engineer  ").await.unwrap();

        let uploads = backend.uploads.lock().unwrap().clone();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].file_name.as_deref(), Some("jane-doe.pdf"));
        assert_eq!(uploads[0].size, pdf().len());
        assert_eq!(uploads[0].authorization.as_deref(), Some("Bearer secret"));

        let job = api.get_job(&id).await.unwrap();
        assert_eq!(job.status(), JobStatus::Queued);
        assert_eq!(job.job_description, "Senior Rust engineer");
    }

    #[tokio::test]
    async fn test_create_job_surfaces_backend_detail() {
        let api = client(&spawn_backend(FakeBackend::default()).await, None);

        let err = api.create_job(&pdf(), "   ").await.unwrap_err();
        match &err {
            ApiError::Api { status, message } => {
                assert_eq!(*status, 400);
                assert_eq!(message, "Job description cannot be empty");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.detail().as_deref(), Some("Job description cannot be empty"));
    }

    #[tokio::test]
    async fn test_validation_error_list_reports_first_msg() {
        let api = client(&spawn_backend(FakeBackend::default()).await, None);

        let err = api.list_jobs(0, 0).await.unwrap_err();
        match &err {
            ApiError::Api { status, message } => {
                assert_eq!(*status, 422);
                assert_eq!(message, "Input should be greater than or equal to 1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("upstream timeout".to_string()), "upstream timeout");
        assert_eq!(error_message(r#"{"detail": []}"#.to_string()), r#"{"detail": []}"#);
        assert_eq!(
            error_message(r#"{"detail": {"code": 7}}"#.to_string()),
            r#"{"detail": {"code": 7}}"#
        );
    }

    #[tokio::test]
    async fn test_get_missing_job_is_not_found() {
        let api = client(&spawn_backend(FakeBackend::default()).await, None);
        let err = api.get_job(&JobId::from("missing")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn test_list_jobs_pages_with_skip_and_limit() {
        let backend = FakeBackend::default();
        let api = client(&spawn_backend(backend.clone()).await, None);
        for i in 0..5 {
            api.create_job(&pdf(), &format!("Role number {i}")).await.unwrap();
        }

        let first = api.list_jobs(0, 3).await.unwrap();
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.total, 5);
        assert!(first.has_more);
        assert_eq!(first.items[0].summary_preview, preview("Role number 4"));

        let second = api.list_jobs(3, 3).await.unwrap();
        assert_eq!(second.items.len(), 2);
        assert!(!second.has_more);

        let beyond = api.list_jobs(10, 3).await.unwrap();
        assert!(beyond.items.is_empty());
        assert!(!beyond.has_more);
    }

    #[tokio::test]
    async fn test_delete_twice_reports_not_found() {
        let backend = FakeBackend::default();
        let api = client(&spawn_backend(backend.clone()).await, None);
        let id = api.create_job(&pdf(), "Platform engineer").await.unwrap();

        api.delete_job(&id).await.unwrap();
        let err = api.delete_job(&id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
        assert!(backend.jobs.lock().unwrap().is_empty());
    }

    #[test]
    fn test_endpoint_appends_analysis_segment() {
        let api = client("http://localhost:8000/api/", None);
        assert_eq!(
            api.endpoint(None).unwrap().as_str(),
            "http://localhost:8000/api/analysis/"
        );
        assert_eq!(
            api.endpoint(Some(&JobId::from("a b"))).unwrap().as_str(),
            "http://localhost:8000/api/analysis/a%20b"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = HttpAnalysisApi::new("not a url", None, Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }
}
