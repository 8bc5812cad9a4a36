use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use common::session::DocumentStatus;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub document: String,
    pub query: String,
}

/// Answers a natural-language question against a fully ingested document.
pub async fn query_document(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(input): Json<QueryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.session(&headers).await;
    let record = session
        .read()
        .await
        .document(&input.document)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("No document named '{}'", input.document)))?;

    if record.status == DocumentStatus::Processing {
        return Err(ApiError::Conflict(format!(
            "'{}' is still being processed",
            input.document
        )));
    }

    info!(document = %input.document, "Answering document query");

    let answer = state
        .query_pipeline
        .answer(&record.container_id, &input.query)
        .await?;

    Ok(Json(json!({
        "answer": answer.text,
        "origin": answer.origin.as_str(),
    })))
}
