//! Mutable state of one running operation, handed to each step.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{OperationError, Pacing, StepDef};
use crate::domain::{OperationKind, OperationStatus, Step, StepStatus};
use crate::events::{OperationUpdate, ServerEvent};
use crate::ports::ProgressSink;

/// Step-facing view of an operation.
///
/// Steps report sub-progress, attach details and task fields, and pace
/// themselves through this context. Only the runner moves steps between
/// states and emits terminal messages.
pub struct StepContext {
    operation_id: String,
    kind: OperationKind,
    defs: Vec<StepDef>,
    steps: Vec<Step>,
    current: usize,
    progress: f64,
    status: OperationStatus,
    message: String,
    results: Option<Value>,
    fields: Map<String, Value>,
    skipped: Option<String>,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
    pacing: Pacing,
}

impl StepContext {
    pub(crate) fn new(
        kind: OperationKind,
        defs: Vec<StepDef>,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
        pacing: Pacing,
    ) -> Self {
        let steps = defs
            .iter()
            .map(|d| Step::pending(d.id.as_ref(), d.label.as_ref()))
            .collect();
        Self {
            operation_id: Uuid::new_v4().to_string(),
            kind,
            defs,
            steps,
            current: 0,
            progress: 0.0,
            status: OperationStatus::Pending,
            message: String::new(),
            results: None,
            fields: Map::new(),
            skipped: None,
            sink,
            cancel,
            pacing,
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    pub const fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Overall progress emitted so far.
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    pub const fn status(&self) -> OperationStatus {
        self.status
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Replace the human-readable current-step text.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Attach a detail string to the current step.
    pub fn set_detail(&mut self, detail: impl Into<String>) {
        if let Some(step) = self.steps.get_mut(self.current) {
            step.details = Some(detail.into());
        }
    }

    /// Set a task-specific top-level field carried by every later message.
    pub fn set_field(&mut self, key: &str, value: impl Serialize) -> Result<(), OperationError> {
        let value = serde_json::to_value(value)
            .map_err(|e| OperationError::Internal(format!("Failed to encode {key}: {e}")))?;
        self.fields.insert(key.to_string(), value);
        Ok(())
    }

    /// Replace the accumulated results.
    pub fn set_results(&mut self, results: impl Serialize) -> Result<(), OperationError> {
        let value = serde_json::to_value(results)
            .map_err(|e| OperationError::Internal(format!("Failed to encode results: {e}")))?;
        self.results = Some(value);
        Ok(())
    }

    /// Report that `fraction` of the current step is done and emit an update.
    ///
    /// Overall progress is interpolated inside the step's milestone slice and
    /// never moves backwards.
    pub fn advance(&mut self, fraction: f64, detail: impl Into<String>) -> Result<(), OperationError> {
        self.ensure_active()?;
        let detail = detail.into();
        let overall = self
            .defs
            .get(self.current)
            .map_or(self.progress, |def| def.progress_at(fraction));
        self.progress = self.progress.max(overall);
        if let Some(step) = self.steps.get_mut(self.current) {
            step.progress = (fraction.clamp(0.0, 1.0) * 100.0).max(step.progress);
            step.details = Some(detail.clone());
        }
        self.message = detail;
        self.emit(None);
        Ok(())
    }

    /// Sleep for a weighted pacing delay; wakes early if the client goes away.
    pub async fn pace(&self, weight: f64) -> Result<(), OperationError> {
        self.ensure_active()?;
        let delay = self.pacing.delay(weight);
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            () = tokio::time::sleep(delay) => Ok(()),
            () = self.cancel.cancelled() => Err(OperationError::Cancelled),
        }
    }

    /// End the operation successfully after the current step.
    ///
    /// Remaining steps are reported as completed with `reason` as detail.
    pub fn skip_remaining(&mut self, reason: impl Into<String>) {
        self.skipped = Some(reason.into());
    }

    pub(crate) const fn skip_requested(&self) -> bool {
        self.skipped.is_some()
    }

    fn ensure_active(&self) -> Result<(), OperationError> {
        if self.is_cancelled() {
            return Err(OperationError::Cancelled);
        }
        Ok(())
    }

    pub(crate) fn begin_step(&mut self, index: usize) -> Result<(), OperationError> {
        self.ensure_active()?;
        self.current = index;
        self.status = OperationStatus::Running;
        if let Some(def) = self.defs.get(index) {
            self.progress = self.progress.max(def.start);
            self.message = def.label.to_string();
        }
        if let Some(step) = self.steps.get_mut(index) {
            step.start();
        }
        self.emit(None);
        Ok(())
    }

    pub(crate) fn complete_step(&mut self) {
        if let Some(step) = self.steps.get_mut(self.current) {
            step.complete();
        }
    }

    pub(crate) fn fail_step(&mut self, error: &OperationError) {
        if let Some(step) = self.steps.get_mut(self.current) {
            step.fail(error.to_string());
        }
    }

    pub(crate) fn finish_completed(&mut self) {
        let reason = self.skipped.take();
        for step in &mut self.steps {
            if step.status != StepStatus::Completed {
                step.complete();
                if let Some(ref reason) = reason {
                    step.details = Some(reason.clone());
                }
            }
        }
        self.status = OperationStatus::Completed;
        self.progress = 100.0;
        self.emit(None);
    }

    pub(crate) fn finish_failed(&mut self, error: &OperationError) {
        self.status = OperationStatus::Failed;
        self.message = format!("Error: {error}");
        self.emit(Some(error.to_string()));
    }

    pub(crate) fn snapshot(&self, error: Option<String>) -> OperationUpdate {
        let step = match self.status {
            OperationStatus::Completed => "completed".to_string(),
            _ => self
                .defs
                .get(self.current)
                .map(|d| d.id.to_string())
                .unwrap_or_default(),
        };
        OperationUpdate {
            operation_id: self.operation_id.clone(),
            operation: self.kind,
            status: self.status,
            progress: self.progress,
            step,
            current_step: self.message.clone(),
            steps: self.steps.clone(),
            results: self.results.clone(),
            error,
            fields: self.fields.clone(),
        }
    }

    fn emit(&self, error: Option<String>) {
        self.sink
            .emit(ServerEvent::operation(self.snapshot(error)));
    }
}
