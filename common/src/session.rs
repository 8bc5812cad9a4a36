use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Complete,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Processing => "processing",
            DocumentStatus::Complete => "complete",
            DocumentStatus::Failed => "failed",
        }
    }
}

/// One uploaded document within a session, keyed by its display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub display_name: String,
    pub container_id: String,
    pub status: DocumentStatus,
    /// Ingestion job id, kept while the document is processing so a stale
    /// monitor can be told apart from the current one.
    pub job_id: Option<String>,
    pub document_id: Option<String>,
    /// Latest raw status string reported by the ingestion service.
    pub parsing_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn processing(display_name: &str, container_id: &str, job_id: &str) -> Self {
        Self {
            display_name: display_name.to_owned(),
            container_id: container_id.to_owned(),
            status: DocumentStatus::Processing,
            job_id: Some(job_id.to_owned()),
            document_id: None,
            parsing_status: None,
            created_at: Utc::now(),
        }
    }
}

/// Per-session document registry. Sessions share nothing with each other;
/// only the answer cache is global.
#[derive(Debug, Default)]
pub struct SessionState {
    documents: HashMap<String, DocumentRecord>,
}

pub type SharedSession = Arc<RwLock<SessionState>>;

impl SessionState {
    /// A newer upload under the same display name replaces the previous
    /// record; at most one record is active per name.
    pub fn upsert_document(&mut self, record: DocumentRecord) {
        self.documents.insert(record.display_name.clone(), record);
    }

    pub fn document(&self, display_name: &str) -> Option<&DocumentRecord> {
        self.documents.get(display_name)
    }

    pub fn documents(&self) -> Vec<&DocumentRecord> {
        let mut records: Vec<&DocumentRecord> = self.documents.values().collect();
        records.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        records
    }

    pub fn is_processing(&self) -> bool {
        self.documents
            .values()
            .any(|record| record.status == DocumentStatus::Processing)
    }

    fn active_record(&mut self, display_name: &str, job_id: &str) -> Option<&mut DocumentRecord> {
        self.documents
            .get_mut(display_name)
            .filter(|record| record.job_id.as_deref() == Some(job_id))
    }

    pub fn record_parsing_status(&mut self, display_name: &str, job_id: &str, raw_status: &str) {
        if let Some(record) = self.active_record(display_name, job_id) {
            record.parsing_status = Some(raw_status.to_owned());
        }
    }

    pub fn mark_complete(&mut self, display_name: &str, job_id: &str, document_id: Option<String>) {
        if let Some(record) = self.active_record(display_name, job_id) {
            record.status = DocumentStatus::Complete;
            record.document_id = document_id;
            record.job_id = None;
        }
    }

    /// Removes the record; a failed ingestion leaves no queryable document
    /// behind. Returns the removed record for logging.
    pub fn mark_failed(&mut self, display_name: &str, job_id: &str) -> Option<DocumentRecord> {
        if self.active_record(display_name, job_id).is_none() {
            return None;
        }

        self.documents.remove(display_name).map(|mut record| {
            record.status = DocumentStatus::Failed;
            record
        })
    }
}
