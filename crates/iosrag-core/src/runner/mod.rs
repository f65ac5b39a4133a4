//! Operation runner: drives a task's steps and streams progress.
//!
//! For step `i` of `n` the runner marks the step running and emits a
//! snapshot, awaits the task's work, then marks it completed. The first
//! failure marks the step failed, emits one `error` message and stops. After
//! the last step exactly one `completed` message with progress 100 follows.
//!
//! Cancellation is cooperative: the token is checked before each step, on
//! every sub-progress report and while pacing. A cancelled operation emits
//! nothing further.

mod context;
mod pacing;
mod step;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::OperationKind;
use crate::ports::{CatalogError, ExtractError, LlmError, ProgressSink, RepositoryError};

pub use context::StepContext;
pub use pacing::Pacing;
pub use step::{StepDef, evenly_spaced};

/// Errors that abort an operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OperationError {
    /// The request was unusable; reported on the operation's stream.
    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The client went away.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Internal(String),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// A long-running operation expressed as an ordered step table.
#[async_trait]
pub trait OperationTask: Send {
    fn kind(&self) -> OperationKind;

    /// The step table, in execution order.
    fn steps(&self) -> Vec<StepDef>;

    /// Seed task fields before the first update is emitted.
    fn prepare(&mut self, _ctx: &mut StepContext) -> Result<(), OperationError> {
        Ok(())
    }

    /// Perform the work of `step`.
    async fn run_step(
        &mut self,
        step: &StepDef,
        ctx: &mut StepContext,
    ) -> Result<(), OperationError>;

    /// Fill the final payload after every step succeeded.
    fn complete(&mut self, ctx: &mut StepContext) -> Result<(), OperationError>;

    /// Observe a failure before the terminal error is emitted.
    fn failed(&mut self, _error: &OperationError, _ctx: &mut StepContext) {}
}

/// Drives [`OperationTask`]s for one client.
#[derive(Clone)]
pub struct OperationRunner {
    sink: Arc<dyn ProgressSink>,
    pacing: Pacing,
    cancel: CancellationToken,
}

impl OperationRunner {
    pub fn new(sink: Arc<dyn ProgressSink>, pacing: Pacing, cancel: CancellationToken) -> Self {
        Self {
            sink,
            pacing,
            cancel,
        }
    }

    pub async fn run<T: OperationTask>(&self, mut task: T) -> OperationOutcome {
        let kind = task.kind();
        let defs = task.steps();
        let total = defs.len();
        let mut ctx = StepContext::new(
            kind,
            defs.clone(),
            Arc::clone(&self.sink),
            self.cancel.clone(),
            self.pacing,
        );

        info!(
            target: "iosrag.runner",
            operation_id = %ctx.operation_id(),
            operation = %kind,
            steps = total,
            "Operation started"
        );

        if let Err(err) = task.prepare(&mut ctx) {
            return Self::abort(&mut task, &mut ctx, err);
        }

        for (index, def) in defs.iter().enumerate() {
            if let Err(err) = ctx.begin_step(index) {
                return Self::abort(&mut task, &mut ctx, err);
            }
            debug!(
                target: "iosrag.runner",
                operation_id = %ctx.operation_id(),
                step = %def.id,
                index,
                total,
                progress = ctx.progress(),
                "Step started"
            );

            if let Err(err) = task.run_step(def, &mut ctx).await {
                return Self::abort(&mut task, &mut ctx, err);
            }
            ctx.complete_step();

            if ctx.skip_requested() {
                debug!(
                    target: "iosrag.runner",
                    operation_id = %ctx.operation_id(),
                    step = %def.id,
                    "Remaining steps skipped"
                );
                break;
            }
        }

        if let Err(err) = task.complete(&mut ctx) {
            return Self::abort(&mut task, &mut ctx, err);
        }
        if ctx.is_cancelled() {
            return Self::abort(&mut task, &mut ctx, OperationError::Cancelled);
        }
        ctx.finish_completed();

        info!(
            target: "iosrag.runner",
            operation_id = %ctx.operation_id(),
            operation = %kind,
            "Operation completed"
        );
        OperationOutcome::Completed
    }

    fn abort<T: OperationTask>(
        task: &mut T,
        ctx: &mut StepContext,
        err: OperationError,
    ) -> OperationOutcome {
        if err == OperationError::Cancelled {
            info!(
                target: "iosrag.runner",
                operation_id = %ctx.operation_id(),
                operation = %ctx.kind(),
                "Operation cancelled, client disconnected"
            );
            return OperationOutcome::Cancelled;
        }

        warn!(
            target: "iosrag.runner",
            operation_id = %ctx.operation_id(),
            operation = %ctx.kind(),
            error = %err,
            "Operation failed"
        );
        ctx.fail_step(&err);
        task.failed(&err, ctx);
        ctx.finish_failed(&err);
        OperationOutcome::Failed(err.to_string())
    }
}
