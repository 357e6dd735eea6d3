//! Elasticsearch over its REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

use crate::export::{ExportError, IndexClient};
use crate::pipeline::ConfigError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ElasticClient {
    http: Client,
    base_url: String,
}

impl ElasticClient {
    /// Validates `url` and prepares a client for it. No request is sent.
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        let parsed: Url =
            Url::parse(url).map_err(|e| ConfigError::Client(format!("invalid url {url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Client(format!(
                "unsupported scheme {} in {url}",
                parsed.scheme()
            )));
        }

        let http: Client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        let mut url: String = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(segment);
        }
        url
    }
}

/// Turns a non-success answer into an error carrying what the server said.
async fn ensure_success(response: Response) -> Result<Response, ExportError> {
    let status: StatusCode = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: String = response.text().await.unwrap_or_default();
    Err(ExportError::Index {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl IndexClient for ElasticClient {
    async fn index_exists(&self, name: &str) -> Result<bool, ExportError> {
        let response: Response = self.http.head(self.endpoint(&[name])).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(response).await?;
        Ok(true)
    }

    async fn create_index(&self, name: &str) -> Result<(), ExportError> {
        let response: Response = self.http.put(self.endpoint(&[name])).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn index_document(
        &self,
        name: &str,
        category: &str,
        body: &serde_json::Value,
    ) -> Result<(), ExportError> {
        let response: Response = self
            .http
            .post(self.endpoint(&[name, category]))
            .json(body)
            .send()
            .await?;
        let response: Response = ensure_success(response).await?;
        debug!("Indexed document into {name}: {}", response.status());
        Ok(())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
