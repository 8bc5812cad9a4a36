mod backend;

#[allow(clippy::module_name_repetitions)]
pub use backend::{DefaultIngestionBackend, IngestionBackend, SubmittedIngestion};

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use common::{error::AppError, eyelevel::JobStatus, utils::config::AppConfig};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a monitored ingestion ended without a usable document.
#[derive(Error, Debug)]
pub enum MonitorFailure {
    #[error("Ingestion submission failed: {0}")]
    Submission(#[source] AppError),
    #[error("Ingestion service reported failure")]
    JobFailed,
    #[error("Ingestion status check failed: {0}")]
    StatusCheck(#[source] AppError),
    #[error("Ingestion still unfinished after {checks} status checks")]
    TimedOut { checks: u32 },
}

/// Fixed-delay status check schedule. The bound turns a stuck job into a
/// visible failure instead of an eternal spinner.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_checks: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_checks: 120,
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_secs),
            max_checks: config.poll_max_checks,
        }
    }
}

/// An upload waiting to be submitted.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content: Bytes,
}

/// Where a monitored ingestion currently stands. `Complete` and `Failed`
/// are terminal; `advance` never leaves them.
#[derive(Debug)]
pub enum IngestPhase {
    Idle(DocumentUpload),
    Submitting,
    Polling { job_id: String, checks: u32 },
    Complete { document_id: Option<String> },
    Failed(MonitorFailure),
}

impl IngestPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestPhase::Complete { .. } | IngestPhase::Failed(_))
    }
}

/// Tracks one document ingestion from submission to a terminal phase.
///
/// `advance` performs exactly one external call per step, so callers decide
/// the cadence; `monitor_ingestion` in the crate root is the stock loop.
pub struct IngestionMonitor {
    backend: Arc<dyn IngestionBackend>,
    policy: PollPolicy,
    display_name: String,
    container_id: Option<String>,
    job_id: Option<String>,
    last_status: Option<JobStatus>,
    phase: IngestPhase,
}

impl IngestionMonitor {
    pub fn new(
        backend: Arc<dyn IngestionBackend>,
        policy: PollPolicy,
        upload: DocumentUpload,
    ) -> Self {
        Self {
            backend,
            policy,
            display_name: upload.file_name.clone(),
            container_id: None,
            job_id: None,
            last_status: None,
            phase: IngestPhase::Idle(upload),
        }
    }

    pub fn phase(&self) -> &IngestPhase {
        &self.phase
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    /// Latest status reported by the service, kept for progress display.
    pub fn last_status(&self) -> Option<&JobStatus> {
        self.last_status.as_ref()
    }

    /// Performs exactly one step: the submission from `Idle`, or a single
    /// status check from `Polling`. A no-op in terminal phases.
    pub async fn advance(&mut self) {
        match std::mem::replace(&mut self.phase, IngestPhase::Submitting) {
            IngestPhase::Idle(upload) => self.submit(upload).await,
            IngestPhase::Polling { job_id, checks } => self.check(job_id, checks).await,
            settled => self.phase = settled,
        }
    }

    async fn submit(&mut self, upload: DocumentUpload) {
        match self
            .backend
            .submit_document(&upload.file_name, upload.content)
            .await
        {
            Ok(submitted) => {
                debug!(
                    document = %self.display_name,
                    container_id = %submitted.container_id,
                    job_id = %submitted.job_id,
                    "ingestion submitted"
                );
                self.container_id = Some(submitted.container_id);
                self.job_id = Some(submitted.job_id.clone());
                self.phase = IngestPhase::Polling {
                    job_id: submitted.job_id,
                    checks: 0,
                };
            }
            Err(error) => {
                warn!(
                    document = %self.display_name,
                    error = %error,
                    "ingestion submission failed"
                );
                self.phase = IngestPhase::Failed(MonitorFailure::Submission(error));
            }
        }
    }

    async fn check(&mut self, job_id: String, checks: u32) {
        let report = match self.backend.poll_status(&job_id).await {
            Ok(report) => report,
            Err(error) => {
                warn!(
                    document = %self.display_name,
                    job_id = %job_id,
                    error = %error,
                    "ingestion status check failed"
                );
                self.phase = IngestPhase::Failed(MonitorFailure::StatusCheck(error));
                return;
            }
        };

        self.last_status = Some(report.status.clone());

        match report.status {
            JobStatus::Complete => {
                self.phase = IngestPhase::Complete {
                    document_id: report.document_id,
                };
            }
            JobStatus::Failed => {
                self.phase = IngestPhase::Failed(MonitorFailure::JobFailed);
            }
            status => {
                let checks = checks.saturating_add(1);
                if checks >= self.policy.max_checks {
                    warn!(
                        document = %self.display_name,
                        job_id = %job_id,
                        checks,
                        "ingestion timed out"
                    );
                    self.phase = IngestPhase::Failed(MonitorFailure::TimedOut { checks });
                } else {
                    debug!(
                        document = %self.display_name,
                        job_id = %job_id,
                        status = status.as_str(),
                        checks,
                        "ingestion still in progress"
                    );
                    self.phase = IngestPhase::Polling { job_id, checks };
                }
            }
        }
    }
}
