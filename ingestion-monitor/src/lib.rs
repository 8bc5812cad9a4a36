#![allow(clippy::missing_docs_in_private_items)]

pub mod monitor;

pub use monitor::{
    DefaultIngestionBackend, DocumentUpload, IngestPhase, IngestionBackend, IngestionMonitor,
    MonitorFailure, PollPolicy, SubmittedIngestion,
};

use common::session::SharedSession;
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

/// Drives a monitor to a terminal phase, mirroring each step into the
/// session's document record. Intended to be spawned after the submission
/// step has already produced a job (the record exists by then); stops
/// without touching the session if no job was ever created.
pub async fn monitor_ingestion(mut monitor: IngestionMonitor, session: SharedSession) {
    let monitor_id = format!("ingestion-monitor-{}", Uuid::new_v4());
    let interval = monitor.policy().interval;

    loop {
        sleep(interval).await;
        monitor.advance().await;

        match monitor.phase() {
            IngestPhase::Complete { document_id } => {
                let document_id = document_id.clone();
                if let Some(job_id) = monitor.job_id() {
                    session
                        .write()
                        .await
                        .mark_complete(monitor.display_name(), job_id, document_id);
                }
                info!(
                    %monitor_id,
                    document = monitor.display_name(),
                    "ingestion complete"
                );
                break;
            }
            IngestPhase::Failed(failure) => {
                error!(
                    %monitor_id,
                    document = monitor.display_name(),
                    error = %failure,
                    "ingestion failed"
                );
                if let Some(job_id) = monitor.job_id() {
                    session
                        .write()
                        .await
                        .mark_failed(monitor.display_name(), job_id);
                }
                break;
            }
            IngestPhase::Polling { .. } => {
                if let (Some(job_id), Some(status)) = (monitor.job_id(), monitor.last_status()) {
                    session.write().await.record_parsing_status(
                        monitor.display_name(),
                        job_id,
                        status.as_str(),
                    );
                }
            }
            IngestPhase::Idle(_) | IngestPhase::Submitting => {}
        }
    }
}
