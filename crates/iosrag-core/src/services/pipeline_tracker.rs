//! Last known state of the two pipeline stages.
//!
//! Stage tasks report into the tracker as they run; `get_pipeline_status`
//! reads it and `reset_pipeline` restores the idle state.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage1Snapshot {
    pub status: StageStatus,
    pub progress: f64,
    pub documents_found: usize,
    pub current_step: String,
}

impl Default for Stage1Snapshot {
    fn default() -> Self {
        Self {
            status: StageStatus::Idle,
            progress: 0.0,
            documents_found: 0,
            current_step: "Ready to start document discovery".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage2Snapshot {
    pub status: StageStatus,
    pub progress: f64,
    pub synthetic_examples: u64,
    pub current_step: String,
    pub output_phase: u8,
}

impl Default for Stage2Snapshot {
    fn default() -> Self {
        Self {
            status: StageStatus::Idle,
            progress: 0.0,
            synthetic_examples: 0,
            current_step: "Waiting for Stage 1 completion".to_string(),
            output_phase: 1,
        }
    }
}

/// Both stages plus the time the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub stage1: Stage1Snapshot,
    pub stage2: Stage2Snapshot,
    pub timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct Stages {
    stage1: Stage1Snapshot,
    stage2: Stage2Snapshot,
}

#[derive(Default)]
pub struct PipelineTracker {
    stages: Mutex<Stages>,
}

impl PipelineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Stages> {
        self.stages
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        let stages = self.lock();
        PipelineSnapshot {
            stage1: stages.stage1.clone(),
            stage2: stages.stage2.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn reset(&self) -> PipelineSnapshot {
        *self.lock() = Stages::default();
        tracing::info!(target: "iosrag.pipeline", "Pipeline reset to initial state");
        self.snapshot()
    }

    pub fn update_stage1(&self, update: impl FnOnce(&mut Stage1Snapshot)) {
        update(&mut self.lock().stage1);
    }

    pub fn update_stage2(&self, update: impl FnOnce(&mut Stage2Snapshot)) {
        update(&mut self.lock().stage2);
    }
}
