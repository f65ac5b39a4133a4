//! Download of one document, de-duplicated by content hash.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::domain::{DocumentRecord, DownloadStatus, OperationKind};
use crate::ports::{DocumentCatalog, DocumentRepository};
use crate::runner::{OperationError, OperationTask, StepContext, StepDef};

const STEPS: [StepDef; 2] = [
    StepDef::fixed("check", "Checking for an existing copy", 0.0, 0.0),
    StepDef::fixed("download", "Downloading document", 0.0, 100.0),
];

const TICKS: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub document: Option<DocumentRecord>,
}

pub struct DownloadTask {
    request: DownloadRequest,
    catalog: Arc<dyn DocumentCatalog>,
    repository: Arc<dyn DocumentRepository>,
    document: Option<DocumentRecord>,
    duplicate: bool,
}

impl DownloadTask {
    /// Input problems are reported on the download stream itself, so
    /// construction never fails.
    pub fn new(
        request: DownloadRequest,
        catalog: Arc<dyn DocumentCatalog>,
        repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            request,
            catalog,
            repository,
            document: None,
            duplicate: false,
        }
    }

    fn document_mut(&mut self) -> Result<&mut DocumentRecord, OperationError> {
        self.document
            .as_mut()
            .ok_or_else(|| OperationError::Internal("Document not prepared".to_string()))
    }

    fn publish(&self, ctx: &mut StepContext) -> Result<(), OperationError> {
        if let Some(ref doc) = self.document {
            ctx.set_field("download_status", doc.download_status)?;
            ctx.set_field("result", doc)?;
        }
        ctx.set_field("duplicate", self.duplicate)
    }

    async fn download(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        for tick in 1..=TICKS {
            ctx.pace(0.3).await?;
            ctx.advance(
                f64::from(tick) / f64::from(TICKS),
                format!("Downloading... {}%", tick * 100 / TICKS),
            )?;
        }

        let catalog = Arc::clone(&self.catalog);
        let doc = self.document_mut()?;
        let fetched = catalog.fetch(doc).await?;
        doc.local_path = Some(fetched.local_path);
        doc.size = format!("{:.1} MB", fetched.size_bytes as f64 / (1024.0 * 1024.0));
        doc.download_status = DownloadStatus::Completed;
        doc.downloaded_at = Some(Utc::now());

        let doc = doc.clone();
        if !self.repository.mark_downloaded(&doc).await? {
            self.duplicate = true;
        }
        ctx.set_detail(format!("Saved to {}", doc.local_path.as_deref().unwrap_or_default()));
        Ok(())
    }
}

#[async_trait]
impl OperationTask for DownloadTask {
    fn kind(&self) -> OperationKind {
        OperationKind::DocumentDownload
    }

    fn steps(&self) -> Vec<StepDef> {
        STEPS.to_vec()
    }

    fn prepare(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        let document_id = self
            .request
            .document_id
            .clone()
            .filter(|id| !id.trim().is_empty());
        if let Some(ref id) = document_id {
            ctx.set_field("document_id", id)?;
        }
        ctx.set_field("download_status", DownloadStatus::Downloading)?;

        let (Some(id), Some(mut doc)) = (document_id, self.request.document.clone()) else {
            return Err(OperationError::Input(
                "Document ID and document data are required".to_string(),
            ));
        };
        if doc.id.is_empty() {
            doc.id = id;
        }
        doc.download_status = DownloadStatus::Downloading;
        self.document = Some(doc);
        Ok(())
    }

    async fn run_step(
        &mut self,
        step: &StepDef,
        ctx: &mut StepContext,
    ) -> Result<(), OperationError> {
        match step.id.as_ref() {
            "check" => {
                let hash = self.document_mut()?.content_hash();
                if self.repository.is_downloaded(&hash).await? {
                    self.duplicate = true;
                    self.document_mut()?.download_status = DownloadStatus::Completed;
                    ctx.skip_remaining("Document already downloaded");
                    ctx.set_detail("Identical document already downloaded");
                } else {
                    ctx.set_detail("No existing copy");
                }
                Ok(())
            }
            "download" => self.download(ctx).await,
            other => Err(OperationError::Internal(format!("Unknown step {other}"))),
        }
    }

    fn complete(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        self.publish(ctx)?;
        ctx.set_message(if self.duplicate {
            "Document already downloaded"
        } else {
            "Download completed"
        });
        Ok(())
    }

    fn failed(&mut self, _error: &OperationError, ctx: &mut StepContext) {
        if let Some(ref mut doc) = self.document {
            doc.download_status = DownloadStatus::Failed;
        }
        let published = self
            .publish(ctx)
            .and_then(|()| ctx.set_field("download_status", DownloadStatus::Failed));
        if let Err(e) = published {
            tracing::debug!(target: "iosrag.download", error = %e, "Failed to encode download result");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OperationStatus, StepStatus};
    use crate::events::ServerEvent;
    use crate::runner::{OperationOutcome, OperationRunner, Pacing};
    use crate::testing::{BROKEN_SITE, FixtureCatalog, MemoryRepository, RecordingSink};
    use tokio_util::sync::CancellationToken;

    fn document(source: &str) -> DocumentRecord {
        DocumentRecord::new("BGP Guide", source, format!("https://{source}/bgp.pdf"))
    }

    fn request(doc: &DocumentRecord) -> DownloadRequest {
        DownloadRequest {
            document_id: Some(doc.id.clone()),
            document: Some(doc.clone()),
        }
    }

    async fn run(
        request: DownloadRequest,
        repo: Arc<MemoryRepository>,
    ) -> (OperationOutcome, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let runner = OperationRunner::new(sink.clone(), Pacing::none(), CancellationToken::new());
        let task = DownloadTask::new(request, Arc::new(FixtureCatalog), repo);
        (runner.run(task).await, sink)
    }

    #[tokio::test]
    async fn test_download_progresses_in_ticks() {
        let repo = Arc::new(MemoryRepository::new());
        let doc = document("cisco.com");
        let (outcome, sink) = run(request(&doc), repo.clone()).await;
        assert_eq!(outcome, OperationOutcome::Completed);

        let updates = sink.updates();
        // check start, download start, ten ticks, terminal
        assert_eq!(updates.len(), 13);
        assert_eq!(updates[0].fields["download_status"], "downloading");
        assert_eq!(updates[0].fields["document_id"], doc.id.as_str());
        assert!((updates[11].progress - 100.0).abs() < 1e-9);

        let last = updates.last().unwrap();
        assert_eq!(last.status, OperationStatus::Completed);
        assert_eq!(last.fields["download_status"], "completed");
        assert_eq!(last.fields["duplicate"], false);
        assert!(last.fields["result"]["local_path"].is_string());
        assert!(repo.is_downloaded(&doc.content_hash()).await.unwrap());
        assert!(
            sink.events()
                .iter()
                .all(|e| matches!(e, ServerEvent::DocumentDownloadUpdate(_)))
        );
    }

    #[tokio::test]
    async fn test_duplicate_short_circuits() {
        let repo = Arc::new(MemoryRepository::new());
        let doc = document("cisco.com");
        run(request(&doc), repo.clone()).await;
        let (outcome, sink) = run(request(&doc), repo).await;
        assert_eq!(outcome, OperationOutcome::Completed);

        let updates = sink.updates();
        assert_eq!(updates.len(), 2);
        let last = &updates[1];
        assert_eq!(last.status, OperationStatus::Completed);
        assert_eq!(last.fields["duplicate"], true);
        assert_eq!(last.fields["download_status"], "completed");
        assert!((last.progress - 100.0).abs() < f64::EPSILON);
        assert_eq!(last.steps[1].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn test_missing_input_reported_on_stream() {
        let (outcome, sink) = run(DownloadRequest::default(), Arc::new(MemoryRepository::new())).await;
        assert!(matches!(outcome, OperationOutcome::Failed(_)));

        let updates = sink.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].status, OperationStatus::Failed);
        assert_eq!(updates[0].fields["download_status"], "failed");
        assert_eq!(
            updates[0].error.as_deref(),
            Some("Document ID and document data are required")
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_marks_failed() {
        let doc = document(BROKEN_SITE);
        let (outcome, sink) = run(request(&doc), Arc::new(MemoryRepository::new())).await;
        assert!(matches!(outcome, OperationOutcome::Failed(_)));
        let last = sink.last_update();
        assert_eq!(last.fields["download_status"], "failed");
        assert_eq!(last.fields["result"]["download_status"], "failed");
        assert_eq!(last.steps[1].status, StepStatus::Failed);
    }
}
