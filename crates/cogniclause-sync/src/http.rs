//! HTTP client for the contract evaluation and upload endpoints.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use cogniclause_session::{Evaluator, FileRequest, FileUpload, TextRequest, TransportError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Response of the service health check.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: Option<String>,
}

/// Client for the evaluation service's `/contracts` and `/health` routes.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client for the given base URL.
    ///
    /// `base_url` should be like `http://127.0.0.1:8000` (a trailing slash is
    /// trimmed). `timeout` bounds each whole request.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Evaluate pasted contract text.
    ///
    /// Returns the raw JSON body; the caller normalises it.
    pub async fn evaluate(&self, request: &TextRequest) -> Result<Value, ApiError> {
        let url = format!("{}/contracts/evaluate", self.base_url);

        info!(url = %url, chars = request.text.len(), "submitting text for evaluation");
        let resp = self.client.post(&url).json(request).send().await?;
        let body = read_success(resp).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Upload a document for text extraction and evaluation.
    pub async fn upload(&self, request: FileRequest) -> Result<Value, ApiError> {
        let url = format!("{}/contracts/upload", self.base_url);
        let size = request.file.bytes.len();
        let form = upload_form(request)?;

        info!(url = %url, bytes = size, "uploading document for evaluation");
        let resp = self.client.post(&url).multipart(form).send().await?;
        let body = read_success(resp).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Query the service health check.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = format!("{}/health/check", self.base_url);

        info!(url = %url, "checking evaluation service health");
        let resp = self.client.get(&url).send().await?;
        let body = read_success(resp).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn to_transport(&self, err: ApiError) -> TransportError {
        match err {
            ApiError::Http(e) if e.is_timeout() => TransportError::Timeout(self.timeout),
            ApiError::Http(e) => TransportError::Network(e.to_string()),
            ApiError::Server { status, body } => TransportError::Server { status, body },
            ApiError::Json(e) => TransportError::Decode(e.to_string()),
            e @ ApiError::Io { .. } => TransportError::Network(e.to_string()),
        }
    }
}

#[async_trait]
impl Evaluator for ApiClient {
    async fn evaluate_text(&self, request: TextRequest) -> Result<Value, TransportError> {
        self.evaluate(&request)
            .await
            .map_err(|e| self.to_transport(e))
    }

    async fn upload_file(&self, request: FileRequest) -> Result<Value, TransportError> {
        self.upload(request).await.map_err(|e| self.to_transport(e))
    }
}

/// Read a document from disk into an upload.
///
/// The content type is inferred from the extension for the formats the
/// upload service extracts text from.
pub async fn read_upload(path: &Path) -> Result<FileUpload, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let upload = FileUpload::new(file_name, bytes);
    Ok(match content_type_for(path) {
        Some(ct) => upload.with_content_type(ct),
        None => upload,
    })
}

fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        "txt" => Some("text/plain"),
        _ => None,
    }
}

fn upload_form(request: FileRequest) -> Result<Form, ApiError> {
    let FileRequest {
        file,
        user_id,
        name,
    } = request;

    let mut part = Part::bytes(file.bytes).file_name(file.file_name);
    if let Some(ct) = file.content_type.as_deref() {
        part = part.mime_str(ct)?;
    }

    let mut form = Form::new().part("file", part);
    if let Some(id) = user_id {
        form = form.text("user_id", id);
    }
    Ok(form.text("name", name))
}

/// Body of a successful response, or the status and body of a failed one.
pub(crate) async fn read_success(resp: reqwest::Response) -> Result<String, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.text().await?)
}
