//! Two-stage processing pipeline: discovery simulation and synthetic data factory.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::OperationKind;
use crate::fingerprint::stable_number;
use crate::runner::{OperationError, OperationTask, StepContext, StepDef, evenly_spaced};
use crate::services::{PipelineTracker, StageStatus};

const STAGE1_STEPS: [(&str, &str); 6] = [
    ("initialize", "Initializing document discovery..."),
    ("search", "Searching for Cisco documentation..."),
    ("validate", "Validating PDF links..."),
    ("download", "Downloading documents..."),
    ("organize", "Organizing files..."),
    ("finalize", "Discovery completed"),
];

/// Files reported by a finished stage 1 run.
pub const STAGE1_DISCOVERED_PDFS: [&str; 4] = [
    "BGP_Configuration_Guide.pdf",
    "OSPF_Implementation_Best_Practices.pdf",
    "ASR_1000_Troubleshooting_Guide.pdf",
    "CCNP_Enterprise_Core_Study_Guide.pdf",
];

const PHASE1: &[&str] = &[
    "Checking GPU availability (Ollama/Groq)...",
    "Extracting text from seed PDF...",
    "Generating synthetic error patterns (GPU)...",
    "Creating best practices library (GPU)...",
    "Generating troubleshooting scenarios (GPU)...",
    "Building configuration examples (GPU)...",
    "Combining real + synthetic data...",
    "Creating high-density embeddings (GPU)...",
    "Optimizing for basic RAG accuracy...",
    "Finalizing basic Chroma vector store...",
];

const PHASE2: &[&str] = &[
    "Initializing Hierarchical Index structure...",
    "Parsing configurations into structured chunks...",
    "Building device memory filters...",
    "Creating feature-area taxonomies...",
    "Implementing version-aware filtering...",
    "Optimizing retrieval precision...",
    "Building foundational index (80-88% accuracy)...",
    "Finalizing hierarchical vector store...",
];

const PHASE3: &[&str] = &[
    "Building Graph RAG knowledge graph...",
    "Creating device-feature relationships...",
    "Mapping error-solution dependencies...",
    "Building version compatibility graph...",
    "Implementing graph-aware retrieval...",
    "Optimizing for dependency nuance...",
    "Achieving low 90s accuracy target...",
    "Finalizing Graph RAG layer...",
];

const PHASE4: &[&str] = &[
    "Initializing Agentic Loop framework...",
    "Building tool execution pipeline...",
    "Creating hypothesis validation system...",
    "Implementing iterative evidence gathering...",
    "Building command execution interface...",
    "Creating validated case repository...",
    "Optimizing for upper 90s accuracy...",
    "Finalizing Agentic Loop system...",
];

const PHASE5: &[&str] = &[
    "Setting up continuous evaluation harness...",
    "Building gold standard test sets...",
    "Implementing regression monitoring...",
    "Creating feedback capture system...",
    "Building automated hardening pipeline...",
    "Implementing accuracy maintenance...",
    "Achieving ≥95% in-scope accuracy...",
    "Finalizing continuous eval system...",
];

/// Step labels for an output phase, and the phase actually used.
///
/// Phases outside 1-5 fall back to phase 1.
pub fn phase_steps(phase: i64) -> (u8, &'static [&'static str]) {
    match phase {
        1 => (1, PHASE1),
        2 => (2, PHASE2),
        3 => (3, PHASE3),
        4 => (4, PHASE4),
        5 => (5, PHASE5),
        other => {
            warn!(
                target: "iosrag.pipeline",
                output_phase = other,
                "Unknown output phase, using phase 1"
            );
            (1, PHASE1)
        }
    }
}

/// Synthetic examples produced by one step of one file.
///
/// Zero for the first two steps of a file, then doubling with every step and
/// scaling with the file's position in the batch.
pub fn synthetic_increment(step_index: usize, file_index: usize, file: &str) -> u64 {
    if step_index < 2 {
        return 0;
    }
    let exponent = u32::try_from(step_index - 2).unwrap_or(u32::MAX).min(20);
    250 * 2u64.pow(exponent) * (file_index as u64 + 1) + stable_number(file) % 500
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Stage1Request {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub config: Option<Value>,
}

pub struct Stage1Task {
    request: Stage1Request,
    tracker: Arc<PipelineTracker>,
}

impl Stage1Task {
    pub fn new(request: Stage1Request, tracker: Arc<PipelineTracker>) -> Self {
        Self { request, tracker }
    }
}

#[async_trait]
impl OperationTask for Stage1Task {
    fn kind(&self) -> OperationKind {
        OperationKind::PipelineStage1
    }

    fn steps(&self) -> Vec<StepDef> {
        STAGE1_STEPS
            .iter()
            .enumerate()
            .map(|(i, (id, label))| {
                let (start, end) = evenly_spaced(i, STAGE1_STEPS.len());
                StepDef::dynamic(*id, *label, start, end)
            })
            .collect()
    }

    fn prepare(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        self.tracker.update_stage1(|s| {
            s.status = StageStatus::Running;
            s.progress = 0.0;
            s.documents_found = 0;
        });
        ctx.set_field("stage", 1)?;
        ctx.set_field("topic", &self.request.topic)?;
        ctx.set_field("documents_found", 0)?;
        ctx.set_field("discovered_pdfs", Vec::<String>::new())
    }

    async fn run_step(
        &mut self,
        step: &StepDef,
        ctx: &mut StepContext,
    ) -> Result<(), OperationError> {
        let progress = ctx.progress();
        self.tracker.update_stage1(|s| {
            s.progress = progress;
            s.current_step = step.label.to_string();
        });
        ctx.pace(4.0).await?;

        if step.id == "finalize" {
            ctx.set_field("documents_found", STAGE1_DISCOVERED_PDFS.len())?;
            ctx.set_field("discovered_pdfs", STAGE1_DISCOVERED_PDFS)?;
            ctx.set_detail(format!("{} PDFs discovered", STAGE1_DISCOVERED_PDFS.len()));
        }
        Ok(())
    }

    fn complete(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        self.tracker.update_stage1(|s| {
            s.status = StageStatus::Completed;
            s.progress = 100.0;
            s.documents_found = STAGE1_DISCOVERED_PDFS.len();
            s.current_step = "Discovery completed".to_string();
        });
        ctx.set_message("Discovery completed");
        Ok(())
    }

    fn failed(&mut self, error: &OperationError, _ctx: &mut StepContext) {
        self.tracker.update_stage1(|s| {
            s.status = StageStatus::Error;
            s.current_step = error.to_string();
        });
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stage2Request {
    #[serde(default)]
    pub pdf_files: Vec<String>,
    #[serde(default = "default_phase")]
    pub output_phase: i64,
    #[serde(default)]
    pub config: Option<Value>,
}

const fn default_phase() -> i64 {
    1
}

pub struct Stage2Task {
    files: Vec<String>,
    phase: u8,
    labels: &'static [&'static str],
    tracker: Arc<PipelineTracker>,
    cursor: usize,
    synthetic_examples: u64,
    processed_files: usize,
}

impl Stage2Task {
    pub fn new(request: Stage2Request, tracker: Arc<PipelineTracker>) -> Result<Self, OperationError> {
        if request.pdf_files.is_empty() {
            return Err(OperationError::Input(
                "No PDF files provided for Stage 2".to_string(),
            ));
        }
        let (phase, labels) = phase_steps(request.output_phase);
        Ok(Self {
            files: request.pdf_files,
            phase,
            labels,
            tracker,
            cursor: 0,
            synthetic_examples: 0,
            processed_files: 0,
        })
    }
}

#[async_trait]
impl OperationTask for Stage2Task {
    fn kind(&self) -> OperationKind {
        OperationKind::PipelineStage2
    }

    fn steps(&self) -> Vec<StepDef> {
        let per_file = self.labels.len();
        let total = per_file * self.files.len();
        let many = self.files.len() > 1;
        let mut steps = Vec::with_capacity(total);
        for (file_index, file) in self.files.iter().enumerate() {
            for (step_index, label) in self.labels.iter().enumerate() {
                let label = if many {
                    format!("[File {}/{}: {file}] {label}", file_index + 1, self.files.len())
                } else {
                    (*label).to_string()
                };
                let (start, end) = evenly_spaced(file_index * per_file + step_index, total);
                steps.push(StepDef::dynamic(
                    format!("file{}_step{}", file_index + 1, step_index + 1),
                    label,
                    start,
                    end,
                ));
            }
        }
        steps
    }

    fn prepare(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        let (phase, count) = (self.phase, self.files.len());
        self.tracker.update_stage2(|s| {
            s.status = StageStatus::Running;
            s.progress = 0.0;
            s.synthetic_examples = 0;
            s.output_phase = phase;
            s.current_step = format!(
                "Initializing PHASE {phase} processing for {count} file{}...",
                if count > 1 { "s" } else { "" }
            );
        });
        ctx.set_field("stage", 2)?;
        ctx.set_field("output_phase", self.phase)?;
        ctx.set_field("synthetic_examples", 0)?;
        ctx.set_field("processed_files", 0)?;
        ctx.set_field("total_files", self.files.len())
    }

    async fn run_step(
        &mut self,
        step: &StepDef,
        ctx: &mut StepContext,
    ) -> Result<(), OperationError> {
        let per_file = self.labels.len();
        let file_index = self.cursor / per_file;
        let step_index = self.cursor % per_file;
        self.cursor += 1;

        let progress = ctx.progress();
        self.tracker.update_stage2(|s| {
            s.progress = progress;
            s.current_step = step.label.to_string();
        });
        ctx.pace(5.0).await?;

        let file = self.files.get(file_index).map_or("", String::as_str);
        let added = synthetic_increment(step_index, file_index, file);
        self.synthetic_examples += added;
        if step_index + 1 == per_file {
            self.processed_files += 1;
        }

        let examples = self.synthetic_examples;
        self.tracker
            .update_stage2(|s| s.synthetic_examples = examples);
        ctx.set_field("synthetic_examples", examples)?;
        ctx.set_field("processed_files", self.processed_files)?;
        if added > 0 {
            ctx.set_detail(format!("+{added} synthetic examples"));
        }
        Ok(())
    }

    fn complete(&mut self, ctx: &mut StepContext) -> Result<(), OperationError> {
        let examples = self.synthetic_examples;
        self.tracker.update_stage2(|s| {
            s.status = StageStatus::Completed;
            s.progress = 100.0;
            s.current_step = format!("Generated {examples} synthetic examples");
        });
        ctx.set_message(format!(
            "Processed {} files, {examples} synthetic examples",
            self.processed_files
        ));
        Ok(())
    }

    fn failed(&mut self, error: &OperationError, _ctx: &mut StepContext) {
        self.tracker.update_stage2(|s| {
            s.status = StageStatus::Error;
            s.current_step = error.to_string();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OperationStatus;
    use crate::runner::{OperationOutcome, OperationRunner, Pacing};
    use crate::testing::RecordingSink;
    use tokio_util::sync::CancellationToken;

    fn runner(sink: &Arc<RecordingSink>) -> OperationRunner {
        OperationRunner::new(sink.clone(), Pacing::none(), CancellationToken::new())
    }

    fn stage2(files: &[&str], phase: i64) -> Stage2Request {
        Stage2Request {
            pdf_files: files.iter().map(ToString::to_string).collect(),
            output_phase: phase,
            config: None,
        }
    }

    #[tokio::test]
    async fn test_stage1_even_spacing_and_final_payload() {
        let sink = Arc::new(RecordingSink::new());
        let tracker = Arc::new(PipelineTracker::new());
        let task = Stage1Task::new(Stage1Request::default(), tracker.clone());
        assert_eq!(runner(&sink).run(task).await, OperationOutcome::Completed);

        let updates = sink.updates();
        assert_eq!(updates.len(), 7);
        for (i, update) in updates.iter().take(6).enumerate() {
            assert!((update.progress - i as f64 * 100.0 / 6.0).abs() < 1e-9);
            assert_eq!(update.fields["discovered_pdfs"].as_array().unwrap().len(), 0);
        }
        let last = updates.last().unwrap();
        assert_eq!(last.fields["stage"], 1);
        assert_eq!(last.fields["documents_found"], 4);
        assert_eq!(last.fields["discovered_pdfs"][0], "BGP_Configuration_Guide.pdf");
        assert_eq!(tracker.snapshot().stage1.status, StageStatus::Completed);
    }

    #[test]
    fn test_phase_fallback() {
        assert_eq!(phase_steps(0).0, 1);
        assert_eq!(phase_steps(6).1.len(), 10);
        assert_eq!(phase_steps(3).1.len(), 8);
    }

    #[test]
    fn test_empty_files_rejected() {
        let err = Stage2Task::new(stage2(&[], 1), Arc::new(PipelineTracker::new()))
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "No PDF files provided for Stage 2");
    }

    #[tokio::test]
    async fn test_stage2_file_by_file() {
        let sink = Arc::new(RecordingSink::new());
        let tracker = Arc::new(PipelineTracker::new());
        let task = Stage2Task::new(stage2(&["a.pdf", "b.pdf"], 2), tracker.clone()).unwrap();
        assert_eq!(runner(&sink).run(task).await, OperationOutcome::Completed);

        let updates = sink.updates();
        // 2 files x 8 steps + terminal
        assert_eq!(updates.len(), 17);
        assert!(updates[0].current_step.starts_with("[File 1/2: a.pdf] "));
        assert!(updates[8].current_step.starts_with("[File 2/2: b.pdf] "));
        assert!((updates[8].progress - 50.0).abs() < 1e-9);
        assert_eq!(updates[8].fields["processed_files"], 1);
        assert_eq!(updates[7].fields["processed_files"], 0);

        let examples: Vec<u64> = updates
            .iter()
            .map(|u| u.fields["synthetic_examples"].as_u64().unwrap())
            .collect();
        assert!(examples.windows(2).all(|w| w[0] <= w[1]));
        assert!(examples[16] > examples[8]);

        let last = updates.last().unwrap();
        assert_eq!(last.status, OperationStatus::Completed);
        assert_eq!(last.fields["processed_files"], 2);
        assert_eq!(last.fields["total_files"], 2);
        assert_eq!(last.fields["output_phase"], 2);
        assert_eq!(tracker.snapshot().stage2.synthetic_examples, examples[16]);
    }

    #[tokio::test]
    async fn test_stage2_out_of_range_phase_uses_phase1() {
        let sink = Arc::new(RecordingSink::new());
        let task =
            Stage2Task::new(stage2(&["only.pdf"], 9), Arc::new(PipelineTracker::new())).unwrap();
        assert_eq!(runner(&sink).run(task).await, OperationOutcome::Completed);

        let updates = sink.updates();
        assert_eq!(updates.len(), 11);
        assert_eq!(updates[0].current_step, PHASE1[0]);
        assert_eq!(updates[0].fields["output_phase"], 1);
    }

    #[test]
    fn test_synthetic_increment_grows() {
        assert_eq!(synthetic_increment(0, 0, "x.pdf"), 0);
        assert_eq!(synthetic_increment(1, 3, "x.pdf"), 0);
        let base = stable_number("x.pdf") % 500;
        assert_eq!(synthetic_increment(2, 0, "x.pdf"), 250 + base);
        assert_eq!(synthetic_increment(4, 1, "x.pdf"), 2000 + base);
    }
}
