use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use common::{session::DocumentRecord, utils::upload::validate_upload};
use ingestion_monitor::{
    monitor_ingestion, DefaultIngestionBackend, DocumentUpload, IngestPhase, IngestionMonitor,
    PollPolicy,
};
use serde_json::json;
use tracing::{error, info};

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    // The cap is enforced by the route's `DefaultBodyLimit` and
    // `validate_upload`, both reading `upload_max_bytes` from config.
    #[form_data(limit = "unlimited")]
    pub file: FieldData<Bytes>,
}

/// Accepts a PDF, submits it for ingestion and answers 202 while a
/// background monitor tracks parsing progress in the caller's session.
pub async fn upload_document(
    State(state): State<ApiState>,
    headers: HeaderMap,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let file_name = input
        .file
        .metadata
        .file_name
        .clone()
        .ok_or_else(|| ApiError::ValidationError("Upload is missing a file name".to_string()))?;
    let content_type = input.file.metadata.content_type.as_deref();

    validate_upload(
        &state.config,
        &file_name,
        content_type,
        input.file.contents.len(),
    )?;

    info!(
        document = %file_name,
        size_bytes = input.file.contents.len(),
        "Received document upload"
    );

    let backend = Arc::new(DefaultIngestionBackend::new(state.eyelevel.clone()));
    let mut monitor = IngestionMonitor::new(
        backend,
        PollPolicy::from_config(&state.config),
        DocumentUpload {
            file_name: file_name.clone(),
            content: input.file.contents,
        },
    );

    // Submit inline so a rejected document surfaces in this response.
    monitor.advance().await;

    if let IngestPhase::Failed(failure) = monitor.phase() {
        error!(document = %file_name, error = %failure, "Document submission failed");
        return Err(ApiError::Upstream("Document submission failed".to_string()));
    }

    let container_id = monitor.container_id().unwrap_or_default().to_owned();
    let job_id = monitor.job_id().unwrap_or_default().to_owned();

    let record = DocumentRecord::processing(&file_name, &container_id, &job_id);
    let status = record.status.as_str();

    let session = state.sessions.session(&headers).await;
    session.write().await.upsert_document(record);

    tokio::spawn(monitor_ingestion(monitor, session));

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "document": file_name,
            "container_id": container_id,
            "job_id": job_id,
            "status": status,
        })),
    ))
}

pub async fn list_documents(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session = state.sessions.session(&headers).await;
    let session = session.read().await;

    Json(json!({
        "documents": session.documents(),
        "processing": session.is_processing(),
    }))
}

pub async fn get_document(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.session(&headers).await;
    let record = session
        .read()
        .await
        .document(&name)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("No document named '{name}'")))?;

    Ok(Json(record))
}
