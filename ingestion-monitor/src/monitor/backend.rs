use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use common::{
    error::AppError,
    eyelevel::{EyeLevelClient, IngestionReport},
};

/// Container id and job id produced by one accepted submission.
#[derive(Debug, Clone)]
pub struct SubmittedIngestion {
    pub container_id: String,
    pub job_id: String,
}

#[async_trait]
pub trait IngestionBackend: Send + Sync {
    /// Creates the document's container and submits the payload for
    /// ingestion. Failure here means no document record should exist.
    async fn submit_document(
        &self,
        file_name: &str,
        content: Bytes,
    ) -> Result<SubmittedIngestion, AppError>;

    /// One status check. Never retried.
    async fn poll_status(&self, job_id: &str) -> Result<IngestionReport, AppError>;
}

pub struct DefaultIngestionBackend {
    client: Arc<EyeLevelClient>,
}

impl DefaultIngestionBackend {
    pub fn new(client: Arc<EyeLevelClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IngestionBackend for DefaultIngestionBackend {
    async fn submit_document(
        &self,
        file_name: &str,
        content: Bytes,
    ) -> Result<SubmittedIngestion, AppError> {
        // Every document gets its own container; the display name doubles as
        // the container name.
        let container_id = self.client.create_bucket(file_name).await?;
        let job_id = self
            .client
            .ingest_document(&container_id, file_name, content)
            .await?;

        Ok(SubmittedIngestion {
            container_id,
            job_id,
        })
    }

    async fn poll_status(&self, job_id: &str) -> Result<IngestionReport, AppError> {
        Ok(self.client.ingestion_status(job_id).await?)
    }
}
