//! Ingestion of files from the local filesystem.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{LocalFileRecord, OperationKind, SkippedFile, preview};
use crate::fingerprint::{content_hash, short_id};
use crate::ports::{DocumentRepository, TextExtractor};
use crate::runner::{OperationError, OperationTask, StepContext, StepDef};

const STEPS: [StepDef; 3] = [
    StepDef::fixed("initialize", "Initializing file processing", 0.0, 0.0),
    StepDef::fixed("process_files", "Processing files", 0.0, 80.0),
    StepDef::fixed("finalize", "Finalizing processed files", 90.0, 100.0),
];

/// A file to ingest: a bare path or an object with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LocalFileInput {
    Path(String),
    Entry {
        #[serde(default)]
        name: Option<String>,
        path: String,
    },
}

impl LocalFileInput {
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Entry { path, .. } => path,
        }
    }

    /// Display name, falling back to the file name of the path.
    pub fn name(&self) -> String {
        match self {
            Self::Entry {
                name: Some(name), ..
            } if !name.is_empty() => name.clone(),
            _ => file_name(Path::new(self.path())),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalFilesRequest {
    #[serde(default)]
    pub files: Vec<LocalFileInput>,
    #[serde(default)]
    pub directory_path: Option<String>,
}

pub struct LocalFilesTask {
    request: LocalFilesRequest,
    extractor: Arc<dyn TextExtractor>,
    repository: Arc<dyn DocumentRepository>,
    processed: Vec<LocalFileRecord>,
    skipped: Vec<SkippedFile>,
}

impl LocalFilesTask {
    pub fn new(
        request: LocalFilesRequest,
        extractor: Arc<dyn TextExtractor>,
        repository: Arc<dyn DocumentRepository>,
    ) -> Result<Self, OperationError> {
        let has_directory = request
            .directory_path
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty());
        if request.files.is_empty() && !has_directory {
            return Err(OperationError::Input(
                "No files or directory provided".to_string(),
            ));
        }
        Ok(Self {
            request,
            extractor,
            repository,
            processed: Vec::new(),
            skipped: Vec::new(),
        })
    }

    async fn process_files(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        let mut targets: Vec<(String, PathBuf)> = self
            .request
            .files
            .iter()
            .map(|f| (f.name(), PathBuf::from(f.path())))
            .collect();
        let directory = self
            .request
            .directory_path
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(PathBuf::from);

        let mut done = 0usize;
        if let Some(dir) = directory {
            match self.extractor.scan(&dir).await {
                Ok(found) => {
                    debug!(
                        target: "iosrag.local_files",
                        directory = %dir.display(),
                        files = found.len(),
                        "Directory scanned"
                    );
                    targets.extend(found.into_iter().map(|p| (file_name(&p), p)));
                }
                Err(e) => {
                    warn!(
                        target: "iosrag.local_files",
                        directory = %dir.display(),
                        error = %e,
                        "Directory scan failed"
                    );
                    self.skipped.push(SkippedFile {
                        name: dir.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
            done += 1;
            let total = targets.len() + 1;
            ctx.advance(done as f64 / total as f64, format!("Scanned {}", dir.display()))?;
        }

        let total = targets.len() + done;
        for (name, path) in targets {
            match self.extractor.extract(&path).await {
                Ok(extracted) => {
                    let hash = content_hash(&[&extracted.text]);
                    let record = LocalFileRecord {
                        id: short_id(&[&path.display().to_string(), &hash]),
                        name: name.clone(),
                        path: path.display().to_string(),
                        extension: extracted.format,
                        size_bytes: extracted.size_bytes,
                        text_length: extracted.text.chars().count(),
                        preview: preview(&extracted.text),
                        content_hash: hash,
                        processed_at: Utc::now(),
                    };
                    self.repository.store_local_file(record.clone()).await?;
                    self.processed.push(record);
                }
                Err(e) => {
                    warn!(
                        target: "iosrag.local_files",
                        file = %path.display(),
                        error = %e,
                        "Skipping file"
                    );
                    self.skipped.push(SkippedFile {
                        name: name.clone(),
                        error: e.to_string(),
                    });
                }
            }
            done += 1;
            ctx.advance(
                done as f64 / total as f64,
                format!("Processed {name} ({done}/{total})"),
            )?;
            ctx.pace(0.2).await?;
        }

        ctx.set_detail(format!(
            "{} processed, {} skipped",
            self.processed.len(),
            self.skipped.len()
        ));
        Ok(())
    }
}

#[async_trait]
impl OperationTask for LocalFilesTask {
    fn kind(&self) -> OperationKind {
        OperationKind::LocalFileIngest
    }

    fn steps(&self) -> Vec<StepDef> {
        STEPS.to_vec()
    }

    async fn run_step(
        &mut self,
        step: &StepDef,
        ctx: &mut StepContext,
    ) -> Result<(), OperationError> {
        match step.id.as_ref() {
            "initialize" => {
                let count = self.request.files.len();
                ctx.set_detail(format!("{count} files queued"));
            }
            "process_files" => self.process_files(ctx).await?,
            "finalize" => {
                ctx.set_field("files", &self.processed)?;
                ctx.set_field("skipped", &self.skipped)?;
                ctx.set_field("count", self.processed.len())?;
                ctx.set_detail(format!("{} files ready", self.processed.len()));
            }
            other => return Err(OperationError::Internal(format!("Unknown step {other}"))),
        }
        ctx.pace(0.5).await
    }

    fn complete(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        ctx.set_message(format!("Processed {} files", self.processed.len()));
        Ok(())
    }
}
