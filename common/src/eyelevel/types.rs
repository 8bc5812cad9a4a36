use serde::{Deserialize, Serialize};

/// Lifecycle of a document ingestion job as reported by the service.
/// Anything that is neither starting nor terminal is an opaque in-flight
/// sub-state and is kept verbatim for display.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    #[default]
    Starting,
    Running(String),
    Complete,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::Running(raw) => raw.as_str(),
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "starting" => JobStatus::Starting,
            "complete" => JobStatus::Complete,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Running(raw),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_owned()
    }
}

/// One status check, decoded from the service's ingest envelope.
#[derive(Debug, Clone)]
pub struct IngestionReport {
    pub status: JobStatus,
    /// Identifier of the stored document, present once ingestion completed.
    pub document_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BucketEnvelope {
    pub(crate) bucket: BucketRef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BucketRef {
    pub(crate) bucket_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IngestEnvelope {
    pub(crate) ingest: IngestReceipt,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IngestReceipt {
    pub(crate) process_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    pub(crate) ingest: StatusBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusBody {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) on_complete: Option<CompletionDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletionDetails {
    #[serde(default)]
    pub(crate) document_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchEnvelope {
    pub(crate) search: SearchBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchBody {
    #[serde(default)]
    pub(crate) text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_maps_known_states() {
        assert_eq!(JobStatus::from("starting".to_string()), JobStatus::Starting);
        assert_eq!(JobStatus::from("complete".to_string()), JobStatus::Complete);
        assert_eq!(JobStatus::from("failed".to_string()), JobStatus::Failed);
    }

    #[test]
    fn job_status_keeps_unknown_states_verbatim() {
        let status = JobStatus::from("chunking".to_string());

        assert_eq!(status, JobStatus::Running("chunking".to_string()));
        assert_eq!(status.as_str(), "chunking");
        assert!(!status.is_terminal());
    }

    #[test]
    fn job_status_terminal_states() {
        assert!(JobStatus::Complete.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Starting.is_terminal());
    }

    #[test]
    fn job_status_serde_round_trips_through_raw_string() {
        let status: JobStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(status, JobStatus::Running("queued".to_string()));

        let encoded = serde_json::to_string(&JobStatus::Complete).unwrap();
        assert_eq!(encoded, "\"complete\"");
    }

    #[test]
    fn status_envelope_decodes_completion_details() {
        let body = r#"{"ingest": {"processId": "proc_1", "status": "complete", "onComplete": {"documentId": "doc_9"}}}"#;
        let envelope: StatusEnvelope = serde_json::from_str(body).unwrap();

        assert_eq!(envelope.ingest.status, "complete");
        assert_eq!(
            envelope.ingest.on_complete.and_then(|d| d.document_id),
            Some("doc_9".to_string())
        );
    }
}
