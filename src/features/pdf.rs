use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::http::{ApiClient, RequestOptions};
use crate::jobs::endpoint::job_id_from;
use crate::jobs::{HttpJobs, JobApi, JobEndpoint, JobSubmitter, PollPolicy};
use crate::types::{ApiError, ApiResult, Job, JobCreated};

pub const PDF_ANALYSIS_PATH: &str = "/api/analyze-pdf";

/// A PDF to upload for analysis.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> ApiResult<Self> {
        let file_name = file_name.into();
        if !file_name.to_lowercase().ends_with(".pdf") {
            return Err(ApiError::InvalidRequest(format!("{} is not a .pdf file", file_name)));
        }
        if bytes.is_empty() {
            return Err(ApiError::InvalidRequest(format!("{} is empty", file_name)));
        }
        Ok(Self { file_name, bytes })
    }

    pub async fn from_path(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = tokio::fs::read(path).await?;
        Self::new(file_name, bytes)
    }
}

/// Analysis report returned by a completed PDF job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfAnalysisResult {
    /// The generated report PDF, base64 encoded.
    pub pdf_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PdfAnalysisResult {
    pub fn decode_pdf(&self) -> ApiResult<Vec<u8>> {
        Ok(BASE64.decode(self.pdf_content.trim())?)
    }
}

/// Uploads the file as the `file` field of a multipart form.
#[derive(Clone)]
pub struct PdfSubmitter {
    client: ApiClient,
}

#[async_trait]
impl JobSubmitter<PdfUpload> for PdfSubmitter {
    async fn submit(&self, upload: &PdfUpload) -> ApiResult<String> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(mime::APPLICATION_PDF.as_ref())
            .map_err(ApiError::Network)?;
        let form = Form::new().part("file", part);

        let created: JobCreated = self
            .client
            .post_multipart(PDF_ANALYSIS_PATH, form, &RequestOptions::default())
            .await?;
        let job_id = job_id_from(created)?;
        info!(job_id = %job_id, file = %upload.file_name, size = upload.bytes.len(), "PDF analysis job created");
        Ok(job_id)
    }
}

/// Long documents take a while: poll every second for up to two minutes.
pub fn pdf_policy(base: &PollPolicy) -> PollPolicy {
    base.clone()
        .with_max_attempts(120)
        .with_interval(Duration::from_millis(1000))
}

pub struct PdfAnalysisApi {
    jobs: JobApi<PdfUpload, PdfAnalysisResult>,
}

impl PdfAnalysisApi {
    pub fn new(client: ApiClient, base_policy: &PollPolicy) -> Self {
        let fetcher: HttpJobs<PdfAnalysisResult> =
            HttpJobs::new(client.clone(), JobEndpoint::new(PDF_ANALYSIS_PATH));
        Self {
            jobs: JobApi::from_parts(
                Box::new(PdfSubmitter { client }),
                Box::new(fetcher),
                pdf_policy(base_policy),
            ),
        }
    }

    pub fn jobs(&self) -> &JobApi<PdfUpload, PdfAnalysisResult> {
        &self.jobs
    }

    pub async fn analyze<F>(
        &self,
        upload: &PdfUpload,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> ApiResult<PdfAnalysisResult>
    where
        F: FnMut(&Job<PdfAnalysisResult>),
    {
        self.jobs.create_and_wait(upload, cancel, on_progress).await
    }

    pub async fn analyze_file<F>(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> ApiResult<PdfAnalysisResult>
    where
        F: FnMut(&Job<PdfAnalysisResult>),
    {
        let upload = PdfUpload::from_path(path).await?;
        self.analyze(&upload, cancel, on_progress).await
    }
}
