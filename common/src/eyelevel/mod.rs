pub mod types;

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

pub use types::{IngestionReport, JobStatus};

use types::{BucketEnvelope, IngestEnvelope, SearchEnvelope, StatusEnvelope};

#[derive(Error, Debug)]
pub enum EyeLevelError {
    #[error("EyeLevel transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("EyeLevel API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Client for the EyeLevel document ingestion and search API.
///
/// Documents live in buckets; ingestion is asynchronous and observed through
/// process status checks. Search returns the relevant document text for a
/// query, already assembled by the service.
pub struct EyeLevelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl EyeLevelClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, EyeLevelError> {
        // Use a client with timeouts and reuse
        let http = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        })
    }

    /// Creates a storage bucket and returns its id.
    pub async fn create_bucket(&self, name: &str) -> Result<String, EyeLevelError> {
        let url = format!("{}/buckets", self.base_url);
        let body: BucketEnvelope = self.post(&url, &json!({ "name": name })).await?;

        debug!("Created EyeLevel bucket {}", body.bucket.bucket_id);
        Ok(body.bucket.bucket_id)
    }

    /// Submits a PDF for ingestion into the given bucket and returns the
    /// process id used to track it.
    pub async fn ingest_document(
        &self,
        bucket_id: &str,
        file_name: &str,
        content: Bytes,
    ) -> Result<String, EyeLevelError> {
        let url = format!("{}/ingest/documents", self.base_url);
        let payload = json!({
            "bucketId": bucket_id,
            "fileName": file_name,
            "fileType": "pdf",
            "content": BASE64.encode(&content),
        });
        let body: IngestEnvelope = self.post(&url, &payload).await?;

        debug!(
            "Submitted '{}' to bucket {} as process {}",
            file_name, bucket_id, body.ingest.process_id
        );
        Ok(body.ingest.process_id)
    }

    /// One status check for an ingestion process.
    pub async fn ingestion_status(&self, process_id: &str) -> Result<IngestionReport, EyeLevelError> {
        let url = format!("{}/ingest/{}", self.base_url, process_id);
        let body: StatusEnvelope = self.get(&url).await?;

        Ok(IngestionReport {
            status: JobStatus::from(body.ingest.status),
            document_id: body.ingest.on_complete.and_then(|details| details.document_id),
        })
    }

    /// Retrieves the document text relevant to a query. An empty string means
    /// the service found nothing.
    pub async fn search_content(&self, bucket_id: &str, query: &str) -> Result<String, EyeLevelError> {
        let url = format!("{}/search/{}", self.base_url, bucket_id);
        let body: SearchEnvelope = self.post(&url, &json!({ "query": query })).await?;

        Ok(body.search.text.unwrap_or_default())
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, EyeLevelError> {
        let response = self
            .http
            .post(url)
            .header("X-API-Key", &self.api_key)
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, EyeLevelError> {
        let response = self
            .http
            .get(url)
            .header("X-API-Key", &self.api_key)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, EyeLevelError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EyeLevelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}
