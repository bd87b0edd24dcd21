use super::types::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Files picked for upload. At least one is present when built by
/// `PanelState::begin_upload`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadRequest {
    pub training: Option<PathBuf>,
    pub dolar: Option<PathBuf>,
}

/// Read side and upload side of the backend HTTP API.
#[async_trait]
pub trait PanelApi: Send + Sync {
    async fn last_execution(&self) -> Result<LastExecutionResponse>;
    async fn sources(&self) -> Result<SourcesResponse>;
    async fn upload_sources(&self, request: &UploadRequest) -> Result<UploadResponse>;
}

pub struct PanelRest {
    client: Client,
    base_url: String,
}

impl PanelRest {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("GET {} failed ({}): {}", path, status, body);
        }
        resp.json()
            .await
            .with_context(|| format!("failed to parse {} response", path))
    }
}

#[async_trait]
impl PanelApi for PanelRest {
    async fn last_execution(&self) -> Result<LastExecutionResponse> {
        self.get_json("/api/last-execution").await
    }

    async fn sources(&self) -> Result<SourcesResponse> {
        self.get_json("/api/sources").await
    }

    /// The backend answers rejected uploads with 400 and `{"error": ...}`,
    /// so the body is parsed regardless of status.
    async fn upload_sources(&self, request: &UploadRequest) -> Result<UploadResponse> {
        let mut form = Form::new();
        if let Some(ref path) = request.training {
            form = form.part("training", csv_part(path).await?);
        }
        if let Some(ref path) = request.dolar {
            form = form.part("dolar", csv_part(path).await?);
        }

        let url = format!("{}/api/upload-source", self.base_url);
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("upload request failed")?;
        let status = resp.status();
        let body = resp.text().await.context("failed to read upload response")?;
        serde_json::from_str(&body)
            .with_context(|| format!("unexpected upload response ({}): {}", status, body))
    }
}

async fn csv_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "source.csv".to_string());
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("text/csv")
        .context("invalid mime type")
}
